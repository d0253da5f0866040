//! Datum reader shared by both backends.
//!
//! The reader produces a backend-neutral [`Datum`] tree; each backend then
//! allocates the tree into its own heap. Reading is incremental: a port
//! reads exactly one datum and advances by the bytes the parser consumed.

mod lexer;
mod parser;
mod token;

pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{SourceLoc, Token, TokenWithLoc};

use thiserror::Error;

use crate::number::Number;

#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Bool(bool),
    /// Guile's `#nil`; the context-threaded backend reads it as `()`.
    Nil,
    Number(Number),
    Char(char),
    String(String),
    Symbol(String),
    /// Proper list when the tail is `None`. Never empty.
    List(Vec<Datum>, Option<Box<Datum>>),
    Vector(Vec<Datum>),
    Bytes(Vec<u8>),
}

impl Datum {
    /// Build an improper list, flattening a list tail into the items.
    pub fn dotted(mut items: Vec<Datum>, tail: Datum) -> Datum {
        match tail {
            Datum::Null => Datum::List(items, None),
            Datum::List(rest, rest_tail) => {
                items.extend(rest);
                Datum::List(items, rest_tail)
            }
            tail => Datum::List(items, Some(Box::new(tail))),
        }
    }

    pub fn integer(n: i64) -> Datum {
        Datum::Number(Number::Integer(n.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// Input ended in the middle of a datum.
    #[error("unexpected end of input at {line}:{col}")]
    Incomplete { line: usize, col: usize },

    #[error("{loc}: {message}")]
    Syntax { message: String, loc: SourceLoc },
}

impl ReadError {
    pub fn syntax(message: impl Into<String>, loc: SourceLoc) -> Self {
        ReadError::Syntax {
            message: message.into(),
            loc,
        }
    }
}

/// Read the first datum of `input`, returning it with the number of bytes
/// consumed. `Ok(None)` when only whitespace and comments remain.
pub fn read_one(input: &str) -> Result<Option<(Datum, usize)>, ReadError> {
    let mut parser = Parser::new(input);
    Ok(parser.read()?.map(|d| (d, parser.consumed())))
}

/// Read every datum in `input`.
pub fn read_all(input: &str) -> Result<Vec<Datum>, ReadError> {
    let mut parser = Parser::new(input);
    let mut out = Vec::new();
    while let Some(datum) = parser.read()? {
        out.push(datum);
    }
    Ok(out)
}
