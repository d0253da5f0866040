use num_traits::ToPrimitive;

use super::lexer::Lexer;
use super::token::{SourceLoc, Token, TokenWithLoc};
use super::{Datum, ReadError};
use crate::number::{parse_number, Number};

/// Pull-based datum reader. Tokens are taken from the lexer one at a time so
/// that reading stops right after the first complete datum.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<TokenWithLoc<'a>>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(input),
            peeked: None,
        }
    }

    /// Bytes consumed so far. Only meaningful between datums.
    pub fn consumed(&self) -> usize {
        self.lexer.position()
    }

    fn next(&mut self) -> Result<Option<TokenWithLoc<'a>>, ReadError> {
        match self.peeked.take() {
            Some(t) => Ok(Some(t)),
            None => self.lexer.next_token(),
        }
    }

    fn peek(&mut self) -> Result<Option<&Token<'a>>, ReadError> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next_token()?;
        }
        Ok(self.peeked.as_ref().map(|t| &t.token))
    }

    /// Read one datum; `Ok(None)` at a clean end of input.
    pub fn read(&mut self) -> Result<Option<Datum>, ReadError> {
        let Some(TokenWithLoc { token, loc }) = self.next()? else {
            return Ok(None);
        };
        let datum = match token {
            Token::LeftParen => self.read_list()?,
            Token::VectorStart => Datum::Vector(self.read_sequence()?),
            Token::BytesStart => Datum::Bytes(self.read_bytes(loc)?),
            Token::RightParen => return Err(ReadError::syntax("unexpected )", loc)),
            Token::Dot => return Err(ReadError::syntax("unexpected .", loc)),
            Token::Quote => self.read_quoted("quote")?,
            Token::Quasiquote => self.read_quoted("quasiquote")?,
            Token::Unquote => self.read_quoted("unquote")?,
            Token::UnquoteSplicing => self.read_quoted("unquote-splicing")?,
            Token::DatumComment => {
                self.read_required()?;
                return self.read();
            }
            Token::Atom(text) => atom(text, loc)?,
            Token::Symbol(name) => Datum::Symbol(name),
            Token::String(s) => Datum::String(s),
            Token::Char(c) => Datum::Char(c),
            Token::Bool(b) => Datum::Bool(b),
            Token::Nil => Datum::Nil,
        };
        Ok(Some(datum))
    }

    fn read_required(&mut self) -> Result<Datum, ReadError> {
        let loc = self.lexer.loc();
        self.read()?.ok_or(ReadError::Incomplete {
            line: loc.line,
            col: loc.col,
        })
    }

    fn read_quoted(&mut self, name: &str) -> Result<Datum, ReadError> {
        let datum = self.read_required()?;
        Ok(Datum::List(vec![Datum::Symbol(name.to_string()), datum], None))
    }

    /// Skip a `#;` comment sitting in front of a closing token.
    fn skip_datum_comments(&mut self) -> Result<(), ReadError> {
        while let Some(Token::DatumComment) = self.peek()? {
            self.next()?;
            self.read_required()?;
        }
        Ok(())
    }

    fn end_of_input(&self) -> ReadError {
        let loc = self.lexer.loc();
        ReadError::Incomplete {
            line: loc.line,
            col: loc.col,
        }
    }

    fn read_list(&mut self) -> Result<Datum, ReadError> {
        let mut items = Vec::new();
        loop {
            self.skip_datum_comments()?;
            match self.peek()? {
                None => return Err(self.end_of_input()),
                Some(Token::RightParen) => {
                    self.next()?;
                    return Ok(if items.is_empty() {
                        Datum::Null
                    } else {
                        Datum::List(items, None)
                    });
                }
                Some(Token::Dot) => {
                    let dot_loc = self.next()?.map_or(SourceLoc::start(), |t| t.loc);
                    if items.is_empty() {
                        return Err(ReadError::syntax("unexpected .", dot_loc));
                    }
                    let tail = self.read_required()?;
                    self.skip_datum_comments()?;
                    return match self.next()? {
                        Some(TokenWithLoc {
                            token: Token::RightParen,
                            ..
                        }) => Ok(Datum::dotted(items, tail)),
                        Some(t) => Err(ReadError::syntax("expected ) after dotted tail", t.loc)),
                        None => Err(self.end_of_input()),
                    };
                }
                Some(_) => items.push(self.read_required()?),
            }
        }
    }

    fn read_sequence(&mut self) -> Result<Vec<Datum>, ReadError> {
        let mut items = Vec::new();
        loop {
            self.skip_datum_comments()?;
            match self.peek()? {
                None => return Err(self.end_of_input()),
                Some(Token::RightParen) => {
                    self.next()?;
                    return Ok(items);
                }
                Some(_) => items.push(self.read_required()?),
            }
        }
    }

    fn read_bytes(&mut self, loc: SourceLoc) -> Result<Vec<u8>, ReadError> {
        self.read_sequence()?
            .into_iter()
            .map(|d| match d {
                Datum::Number(Number::Integer(ref n)) => n
                    .to_u8()
                    .ok_or_else(|| ReadError::syntax("bytevector element out of range", loc)),
                _ => Err(ReadError::syntax("bytevector element must be a byte", loc)),
            })
            .collect()
    }
}

fn atom(text: &str, loc: SourceLoc) -> Result<Datum, ReadError> {
    if let Some(n) = parse_number(text, 10) {
        return Ok(Datum::Number(n));
    }
    if text.starts_with('#') {
        return Err(ReadError::syntax(format!("invalid number: {}", text), loc));
    }
    Ok(Datum::Symbol(text.to_string()))
}
