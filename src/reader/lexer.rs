use super::token::{SourceLoc, Token, TokenWithLoc};
use super::ReadError;

/// Characters that terminate an atom.
#[inline]
fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '"' | ';')
}

pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Byte offset of the next unread character.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn loc(&self) -> SourceLoc {
        SourceLoc::new(self.line, self.col)
    }

    fn incomplete(&self) -> ReadError {
        ReadError::Incomplete {
            line: self.line,
            col: self.col,
        }
    }

    fn current(&self) -> Option<char> {
        let byte = *self.bytes.get(self.pos)?;
        if byte < 128 {
            Some(byte as char)
        } else {
            self.input[self.pos..].chars().next()
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.current();
        if let Some(ch) = c {
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            self.pos += ch.len_utf8();
        }
        c
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos..)?.chars().nth(offset)
    }

    /// Skip whitespace, line comments and nested `#| ... |#` block comments.
    fn skip_atmosphere(&mut self) -> Result<(), ReadError> {
        while let Some(c) = self.current() {
            if c.is_whitespace() {
                self.advance();
            } else if c == ';' {
                while let Some(c) = self.advance() {
                    if c == '\n' {
                        break;
                    }
                }
            } else if c == '#' && self.peek(1) == Some('|') {
                self.advance();
                self.advance();
                let mut depth = 1;
                while depth > 0 {
                    match self.advance() {
                        None => return Err(self.incomplete()),
                        Some('|') if self.current() == Some('#') => {
                            self.advance();
                            depth -= 1;
                        }
                        Some('#') if self.current() == Some('|') => {
                            self.advance();
                            depth += 1;
                        }
                        Some(_) => {}
                    }
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    fn read_atom(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.current() {
            if is_delimiter(c) {
                break;
            }
            self.advance();
        }
        &self.input[start..self.pos]
    }

    fn read_hex_escape(&mut self, loc: SourceLoc) -> Result<char, ReadError> {
        let mut code = 0u32;
        let mut digits = 0;
        loop {
            match self.advance() {
                None => return Err(self.incomplete()),
                Some(';') if digits > 0 => break,
                Some(c) => match c.to_digit(16) {
                    Some(d) => {
                        code = code.wrapping_mul(16).wrapping_add(d);
                        digits += 1;
                    }
                    None => return Err(ReadError::syntax("bad \\x escape", loc)),
                },
            }
        }
        char::from_u32(code).ok_or_else(|| ReadError::syntax("invalid code point", loc))
    }

    /// Read the body of a `"..."` or `|...|` literal up to `close`.
    fn read_delimited(&mut self, close: char) -> Result<String, ReadError> {
        let loc = self.loc();
        self.advance();
        let mut s = String::new();
        loop {
            match self.advance() {
                None => return Err(self.incomplete()),
                Some(c) if c == close => return Ok(s),
                Some('\\') => match self.advance() {
                    None => return Err(self.incomplete()),
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some('a') => s.push('\x07'),
                    Some('b') => s.push('\x08'),
                    Some('0') => s.push('\0'),
                    Some('x') | Some('X') => s.push(self.read_hex_escape(loc)?),
                    Some('\n') => {
                        // line continuation: drop leading whitespace on the next line
                        while matches!(self.current(), Some(' ') | Some('\t')) {
                            self.advance();
                        }
                    }
                    Some(c) => s.push(c),
                },
                Some(c) => s.push(c),
            }
        }
    }

    fn read_char(&mut self, loc: SourceLoc) -> Result<char, ReadError> {
        // Already past `#\`; the first character is taken even if it is a delimiter.
        let first = self.advance().ok_or_else(|| self.incomplete())?;
        let start = self.pos - first.len_utf8();
        while let Some(c) = self.current() {
            if is_delimiter(c) {
                break;
            }
            self.advance();
        }
        let name = &self.input[start..self.pos];
        if name.chars().count() == 1 {
            return Ok(first);
        }
        let named = match name.to_ascii_lowercase().as_str() {
            "space" => Some(' '),
            "newline" | "linefeed" => Some('\n'),
            "tab" => Some('\t'),
            "return" => Some('\r'),
            "null" | "nul" => Some('\0'),
            "alarm" => Some('\x07'),
            "backspace" => Some('\x08'),
            "delete" => Some('\x7f'),
            "escape" | "altmode" => Some('\x1b'),
            _ => None,
        };
        if let Some(c) = named {
            return Ok(c);
        }
        if let Some(hex) = name.strip_prefix('x').or_else(|| name.strip_prefix('X')) {
            if let Some(c) = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                return Ok(c);
            }
        }
        Err(ReadError::syntax(format!("unknown character name: {}", name), loc))
    }

    fn read_hash(&mut self, loc: SourceLoc) -> Result<Token<'a>, ReadError> {
        match self.peek(1) {
            None => {
                self.advance();
                Err(self.incomplete())
            }
            Some('(') => {
                self.advance();
                self.advance();
                Ok(Token::VectorStart)
            }
            Some(';') => {
                self.advance();
                self.advance();
                Ok(Token::DatumComment)
            }
            Some('\\') => {
                self.advance();
                self.advance();
                self.read_char(loc).map(Token::Char)
            }
            Some('u') if self.peek(2) == Some('8') && self.peek(3) == Some('(') => {
                for _ in 0..4 {
                    self.advance();
                }
                Ok(Token::BytesStart)
            }
            Some(_) => {
                let text = self.read_atom();
                match text {
                    "#t" | "#true" => Ok(Token::Bool(true)),
                    "#f" | "#false" => Ok(Token::Bool(false)),
                    "#nil" => Ok(Token::Nil),
                    _ if text.len() > 1
                        && matches!(
                            text.as_bytes()[1].to_ascii_lowercase(),
                            b'x' | b'b' | b'o' | b'd' | b'e' | b'i'
                        ) =>
                    {
                        Ok(Token::Atom(text))
                    }
                    _ => Err(ReadError::syntax(format!("invalid # syntax: {}", text), loc)),
                }
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Option<TokenWithLoc<'a>>, ReadError> {
        self.skip_atmosphere()?;
        let loc = self.loc();

        let token = match self.current() {
            None => return Ok(None),
            Some('(') | Some('[') => {
                self.advance();
                Token::LeftParen
            }
            Some(')') | Some(']') => {
                self.advance();
                Token::RightParen
            }
            Some('\'') => {
                self.advance();
                Token::Quote
            }
            Some('`') => {
                self.advance();
                Token::Quasiquote
            }
            Some(',') => {
                self.advance();
                if self.current() == Some('@') {
                    self.advance();
                    Token::UnquoteSplicing
                } else {
                    Token::Unquote
                }
            }
            Some('"') => Token::String(self.read_delimited('"')?),
            Some('|') => Token::Symbol(self.read_delimited('|')?),
            Some('#') => self.read_hash(loc)?,
            Some('.') if self.peek(1).map_or(true, is_delimiter) => {
                self.advance();
                Token::Dot
            }
            Some(_) => Token::Atom(self.read_atom()),
        };
        Ok(Some(TokenWithLoc { token, loc }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        while let Some(t) = lexer.next_token().unwrap() {
            out.push(t.token);
        }
        out
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            tokens("( ) [ ] ' ` , ,@ ."),
            vec![
                Token::LeftParen,
                Token::RightParen,
                Token::LeftParen,
                Token::RightParen,
                Token::Quote,
                Token::Quasiquote,
                Token::Unquote,
                Token::UnquoteSplicing,
                Token::Dot,
            ]
        );
    }

    #[test]
    fn test_atoms_and_comments() {
        assert_eq!(
            tokens("foo ; comment\n 42 #| block #| nested |# |# ...bar"),
            vec![Token::Atom("foo"), Token::Atom("42"), Token::Atom("...bar")]
        );
    }

    #[test]
    fn test_hash_syntax() {
        assert_eq!(
            tokens("#t #false #nil #( #u8( #; #x1F"),
            vec![
                Token::Bool(true),
                Token::Bool(false),
                Token::Nil,
                Token::VectorStart,
                Token::BytesStart,
                Token::DatumComment,
                Token::Atom("#x1F"),
            ]
        );
    }

    #[test]
    fn test_characters() {
        assert_eq!(
            tokens(r"#\a #\space #\x41 #\( #\λ"),
            vec![
                Token::Char('a'),
                Token::Char(' '),
                Token::Char('A'),
                Token::Char('('),
                Token::Char('λ'),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(r#""a\nb\x41;\"c""#),
            vec![Token::String("a\nbA\"c".to_string())]
        );
    }

    #[test]
    fn test_pipe_symbol() {
        assert_eq!(tokens("|hello world|"), vec![Token::Symbol("hello world".to_string())]);
    }

    #[test]
    fn test_unterminated_string_is_incomplete() {
        let mut lexer = Lexer::new("\"abc");
        assert!(matches!(lexer.next_token(), Err(ReadError::Incomplete { .. })));
    }

    #[test]
    fn test_bad_hash_is_syntax_error() {
        let mut lexer = Lexer::new("#q");
        assert!(matches!(lexer.next_token(), Err(ReadError::Syntax { .. })));
    }

    #[test]
    fn test_locations() {
        let mut lexer = Lexer::new("a\n  b");
        assert_eq!(lexer.next_token().unwrap().unwrap().loc, SourceLoc::new(1, 1));
        assert_eq!(lexer.next_token().unwrap().unwrap().loc, SourceLoc::new(2, 3));
    }
}
