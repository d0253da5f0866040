use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLoc {
    pub line: usize,
    pub col: usize,
}

impl SourceLoc {
    pub fn new(line: usize, col: usize) -> Self {
        SourceLoc { line, col }
    }

    pub fn start() -> Self {
        SourceLoc { line: 1, col: 1 }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenWithLoc<'a> {
    pub token: Token<'a>,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    LeftParen,
    RightParen,
    VectorStart, // #(
    BytesStart,  // #u8(
    Quote,
    Quasiquote,
    Unquote,
    UnquoteSplicing,
    Dot,
    DatumComment, // #;
    /// Bare text: a number or a symbol, decided by the parser.
    Atom(&'a str),
    /// `|...|` symbol with escapes already processed.
    Symbol(String),
    String(String),
    Char(char),
    Bool(bool),
    Nil,
}
