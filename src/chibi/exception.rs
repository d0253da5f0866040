//! Exception values.
//!
//! Runtime failures are never Rust errors: they are heap objects of kind
//! exception, returned in place of the result. A [`Condition`] describes one
//! before it is allocated.

use super::context::Context;
use super::heap::{ExceptionData, HeapObject};
use super::sexp::Sexp;

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub kind: &'static str,
    pub message: String,
    pub irritants: Vec<Sexp>,
    pub procedure: Sexp,
}

impl Condition {
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Condition {
            kind,
            message: message.into(),
            irritants: Vec::new(),
            procedure: Sexp::FALSE,
        }
    }

    pub fn type_error(expected: &str, obj: Sexp) -> Self {
        Condition::new("type", format!("invalid type, expected {}", expected)).irritant(obj)
    }

    pub fn range_error(obj: Sexp, start: Sexp, end: Sexp) -> Self {
        Condition::new("range", "bad index range")
            .irritant(obj)
            .irritant(start)
            .irritant(end)
    }

    pub fn out_of_memory(requested: Sexp) -> Self {
        Condition::new("out-of-memory", "out of memory").irritant(requested)
    }

    pub fn read_error(message: impl Into<String>) -> Self {
        Condition::new("read", message)
    }

    pub fn user(message: impl Into<String>) -> Self {
        Condition::new("user", message)
    }

    pub fn irritant(mut self, obj: Sexp) -> Self {
        self.irritants.push(obj);
        self
    }

    pub fn in_procedure(mut self, procedure: Sexp) -> Self {
        self.procedure = procedure;
        self
    }
}

impl Context {
    pub fn make_exception(
        &self,
        kind: Sexp,
        message: Sexp,
        irritants: Sexp,
        procedure: Sexp,
        source: Sexp,
    ) -> Sexp {
        self.alloc(HeapObject::Exception(ExceptionData {
            kind,
            message,
            irritants,
            procedure,
            source,
        }))
    }

    /// Allocate the exception a condition describes.
    pub fn raise(&self, condition: Condition) -> Sexp {
        let kind = self.intern(condition.kind);
        let message = self.c_string(&condition.message);
        let irritants = self.list(&condition.irritants);
        self.make_exception(kind, message, irritants, condition.procedure, Sexp::FALSE)
    }

    pub fn user_exception(&self, procedure: Sexp, message: &str, irritants: Sexp) -> Sexp {
        let kind = self.intern("user");
        let message = self.c_string(message);
        let irritants = if irritants.is_pair() || irritants.is_null() {
            irritants
        } else {
            self.list1(irritants)
        };
        self.make_exception(kind, message, irritants, procedure, Sexp::FALSE)
    }

    pub fn type_exception(&self, procedure: Sexp, expected: &str, obj: Sexp) -> Sexp {
        self.raise(Condition::type_error(expected, obj).in_procedure(procedure))
    }

    pub fn range_exception(&self, obj: Sexp, start: Sexp, end: Sexp) -> Sexp {
        self.raise(Condition::range_error(obj, start, end))
    }
}

fn exception_data(exn: Sexp) -> Option<&'static ExceptionData> {
    match exn.object() {
        Some(HeapObject::Exception(data)) => Some(data),
        _ => None,
    }
}

/// Kind symbol name of an exception value.
pub fn exception_kind(exn: Sexp) -> Option<&'static str> {
    exception_data(exn)?.kind.symbol_name()
}

pub fn exception_message(exn: Sexp) -> Option<String> {
    exception_data(exn)?.message.string_value()
}

pub fn exception_irritants(exn: Sexp) -> Option<Sexp> {
    Some(exception_data(exn)?.irritants)
}

pub fn exception_procedure(exn: Sexp) -> Option<Sexp> {
    Some(exception_data(exn)?.procedure)
}
