//! Ports and the reader entry point.
//!
//! String ports buffer their contents in memory. The standard streams are
//! line buffered on input and unbuffered on output.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};

use tracing::trace;

use super::context::Context;
use super::exception::Condition;
use super::heap::HeapObject;
use super::sexp::Sexp;
use crate::reader::{read_one, Datum, ReadError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    InputString,
    OutputString,
    Stdin,
    Stdout,
    Stderr,
}

#[derive(Debug)]
pub struct Port {
    kind: PortKind,
    /// Unread input. `offset` bytes of it have been consumed.
    input: String,
    offset: usize,
    output: String,
    open: bool,
}

impl Port {
    fn new(kind: PortKind, input: String) -> Self {
        Port {
            kind,
            input,
            offset: 0,
            output: String::new(),
            open: true,
        }
    }

    pub fn input_string(text: &str) -> Self {
        Port::new(PortKind::InputString, text.to_string())
    }

    pub fn output_string() -> Self {
        Port::new(PortKind::OutputString, String::new())
    }

    pub fn stdin() -> Self {
        Port::new(PortKind::Stdin, String::new())
    }

    pub fn stdout() -> Self {
        Port::new(PortKind::Stdout, String::new())
    }

    pub fn stderr() -> Self {
        Port::new(PortKind::Stderr, String::new())
    }

    pub fn kind(&self) -> PortKind {
        self.kind
    }

    pub fn is_input(&self) -> bool {
        matches!(self.kind, PortKind::InputString | PortKind::Stdin)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn pending(&self) -> &str {
        &self.input[self.offset..]
    }

    pub fn consume(&mut self, n: usize) {
        self.offset = (self.offset + n).min(self.input.len());
    }

    /// Pull another line from the underlying stream. Returns the number of
    /// bytes added; zero at end of stream or for string ports.
    pub fn refill(&mut self) -> io::Result<usize> {
        if self.kind != PortKind::Stdin {
            return Ok(0);
        }
        if self.offset > 0 {
            self.input.drain(..self.offset);
            self.offset = 0;
        }
        io::stdin().lock().read_line(&mut self.input)
    }

    pub fn write_str(&mut self, text: &str) -> io::Result<()> {
        match self.kind {
            PortKind::OutputString => {
                self.output.push_str(text);
                Ok(())
            }
            PortKind::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(text.as_bytes())?;
                out.flush()
            }
            PortKind::Stderr => io::stderr().lock().write_all(text.as_bytes()),
            PortKind::InputString | PortKind::Stdin => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "not an output port",
            )),
        }
    }

    /// Text accumulated by an output string port.
    pub fn output(&self) -> &str {
        &self.output
    }
}

pub(crate) fn port_cell(port: Sexp) -> Option<&'static RefCell<Port>> {
    match port.object() {
        Some(HeapObject::Port(p)) => Some(p),
        _ => None,
    }
}

impl Context {
    pub fn open_input_string(&self, text: Sexp) -> Sexp {
        match text.string_value() {
            Some(s) => self.alloc(HeapObject::Port(RefCell::new(Port::input_string(&s)))),
            None => self.type_exception(Sexp::FALSE, "string", text),
        }
    }

    pub fn open_output_string(&self) -> Sexp {
        self.alloc(HeapObject::Port(RefCell::new(Port::output_string())))
    }

    pub fn get_output_string(&self, port: Sexp) -> Sexp {
        match port_cell(port) {
            Some(p) if p.borrow().kind() == PortKind::OutputString => {
                let text = p.borrow().output().to_string();
                self.c_string(&text)
            }
            _ => self.type_exception(Sexp::FALSE, "output string port", port),
        }
    }

    /// Read the next datum from an input port: the datum, the eof object, or
    /// a read exception. On a syntax error the rest of the buffered input is
    /// discarded.
    pub fn read(&self, port: Sexp) -> Sexp {
        let Some(cell) = port_cell(port).filter(|p| p.borrow().is_input()) else {
            return self.type_exception(Sexp::FALSE, "input port", port);
        };
        loop {
            let parsed = read_one(cell.borrow().pending());
            match parsed {
                Ok(Some((datum, used))) => {
                    cell.borrow_mut().consume(used);
                    return self.datum_to_sexp(&datum);
                }
                Ok(None) => match cell.borrow_mut().refill() {
                    Ok(0) => return Sexp::EOF,
                    Ok(_) => continue,
                    Err(e) => return self.raise(Condition::read_error(e.to_string())),
                },
                Err(ReadError::Incomplete { line, col }) => match cell.borrow_mut().refill() {
                    Ok(n) if n > 0 => continue,
                    _ => {
                        let msg = format!("incomplete datum starting before {}:{}", line, col);
                        let mut p = cell.borrow_mut();
                        let rest = p.pending().len();
                        p.consume(rest);
                        return self.raise(Condition::read_error(msg));
                    }
                },
                Err(err @ ReadError::Syntax { .. }) => {
                    trace!(error = %err, "read error");
                    let mut p = cell.borrow_mut();
                    let rest = p.pending().len();
                    p.consume(rest);
                    return self.raise(Condition::read_error(err.to_string()));
                }
            }
        }
    }

    /// Allocate a reader datum. `#nil` reads as `()` here.
    pub fn datum_to_sexp(&self, datum: &Datum) -> Sexp {
        match datum {
            Datum::Null | Datum::Nil => Sexp::NULL,
            Datum::Bool(b) => Sexp::make_boolean(*b),
            Datum::Number(n) => self.number_to_sexp(n),
            Datum::Char(c) => Sexp::make_character(*c as u32),
            Datum::String(s) => self.c_string(s),
            Datum::Symbol(s) => self.intern(s),
            Datum::List(items, tail) => {
                let tail = match tail {
                    Some(t) => self.datum_to_sexp(t),
                    None => Sexp::NULL,
                };
                let items: Vec<Sexp> = items.iter().map(|d| self.datum_to_sexp(d)).collect();
                self.list_with_tail(&items, tail)
            }
            Datum::Vector(items) => {
                let items = items.iter().map(|d| self.datum_to_sexp(d)).collect();
                self.vector_from(items)
            }
            Datum::Bytes(bytes) => self.bytes_from(bytes),
        }
    }
}
