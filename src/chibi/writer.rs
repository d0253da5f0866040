//! Printer.
//!
//! `write` renders data so the reader can read it back; `display` prints
//! strings and characters raw. Objects without a readable syntax print as
//! `#<kind ...>`.

use std::ffi::c_int;
use std::fmt::Write as _;

use super::context::Context;
use super::exception::Condition;
use super::heap::HeapObject;
use super::numeric::sexp_to_number;
use super::port::port_cell;
use super::sexp::Sexp;
use crate::number::format_flonum;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Write,
    Display,
}

const CHAR_NAMES: [(char, &str); 9] = [
    (' ', "space"),
    ('\n', "newline"),
    ('\t', "tab"),
    ('\r', "return"),
    ('\0', "null"),
    ('\u{7}', "alarm"),
    ('\u{8}', "backspace"),
    ('\u{7f}', "delete"),
    ('\u{1b}', "escape"),
];

/// Render `obj` to a string.
pub fn render(obj: Sexp, mode: WriteMode) -> String {
    let mut out = String::new();
    render_into(obj, mode, &mut out);
    out
}

pub fn render_into(obj: Sexp, mode: WriteMode, out: &mut String) {
    if obj.is_fixnum() {
        let _ = write!(out, "{}", obj.unbox_fixnum());
        return;
    }
    if obj.is_char() {
        render_char(obj, mode, out);
        return;
    }
    if obj.is_string_cursor() {
        let _ = write!(out, "#<cursor {}>", obj.unbox_string_cursor());
        return;
    }
    let Some(heap) = obj.object() else {
        out.push_str(immediate_text(obj));
        return;
    };
    match heap {
        HeapObject::Pair { .. } => render_list(obj, mode, out),
        HeapObject::String(_) => {
            let text = obj.string_value().unwrap_or_default();
            match mode {
                WriteMode::Display => out.push_str(&text),
                WriteMode::Write => write_string_literal(&text, out),
            }
        }
        HeapObject::Symbol(name) => match mode {
            WriteMode::Write if needs_bars(name) => {
                let _ = write!(out, "|{}|", name);
            }
            _ => out.push_str(name),
        },
        HeapObject::Flonum(f) => out.push_str(&format_flonum(*f)),
        HeapObject::Bignum(_) | HeapObject::Ratio { .. } | HeapObject::Complex { .. } => {
            match sexp_to_number(obj) {
                Some(n) => {
                    let _ = write!(out, "{}", n);
                }
                None => out.push_str("#<number>"),
            }
        }
        HeapObject::Vector(items) => {
            out.push_str("#(");
            for (i, &item) in items.borrow().iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                render_into(item, mode, out);
            }
            out.push(')');
        }
        HeapObject::Bytes(bytes) => {
            out.push_str("#u8(");
            for (i, b) in bytes.borrow().iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                let _ = write!(out, "{}", b);
            }
            out.push(')');
        }
        HeapObject::Opcode(op) => {
            let name = op.name.string_value().unwrap_or_default();
            let _ = write!(out, "#<opcode \"{}\">", name);
        }
        HeapObject::Procedure { .. } => match procedure_name(obj) {
            Some(name) => {
                let _ = write!(out, "#<procedure {}>", name);
            }
            None => out.push_str("#<procedure>"),
        },
        HeapObject::Type(info) => {
            let name = info.name.string_value().unwrap_or_default();
            let _ = write!(out, "#<type {}>", name);
        }
        HeapObject::Record { type_, .. } => {
            let name = match type_.object() {
                Some(HeapObject::Type(info)) => info.name.string_value(),
                _ => None,
            };
            let _ = write!(out, "#<{}>", name.unwrap_or_else(|| "record".to_string()));
        }
        HeapObject::CPointer(p) => {
            let _ = write!(out, "#<cpointer {:p}>", p.value.get());
        }
        HeapObject::Exception(e) => {
            let kind = e.kind.symbol_name().unwrap_or("?");
            let _ = write!(out, "#<exception {}>", kind);
        }
        HeapObject::Core { name, .. } => {
            let _ = write!(out, "#<core-form {}>", name.symbol_name().unwrap_or("?"));
        }
        HeapObject::SynClo { expr, .. } => {
            out.push_str("#<syntactic-closure ");
            render_into(*expr, WriteMode::Write, out);
            out.push('>');
        }
        other => {
            let _ = write!(out, "#<{}>", other.type_name());
        }
    }
}

fn immediate_text(obj: Sexp) -> &'static str {
    match obj {
        Sexp::FALSE => "#f",
        Sexp::TRUE => "#t",
        Sexp::NULL => "()",
        Sexp::EOF => "#<eof>",
        Sexp::VOID => "#<void>",
        Sexp::UNDEF => "#<undef>",
        _ => "#<invalid immediate>",
    }
}

fn render_char(obj: Sexp, mode: WriteMode, out: &mut String) {
    let Some(c) = obj.as_char() else {
        let _ = write!(out, "#\\x{:x}", obj.unbox_character());
        return;
    };
    if mode == WriteMode::Display {
        out.push(c);
        return;
    }
    out.push_str("#\\");
    match CHAR_NAMES.iter().find(|(ch, _)| *ch == c) {
        Some((_, name)) => out.push_str(name),
        None if c.is_control() => {
            let _ = write!(out, "x{:x}", c as u32);
        }
        None => out.push(c),
    }
}

fn write_string_literal(text: &str, out: &mut String) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:x};", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn needs_bars(name: &str) -> bool {
    name.is_empty()
        || name.chars().any(|c| {
            c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '"' | ';' | '\'' | '|')
        })
}

fn quote_prefix(sym: &str) -> Option<&'static str> {
    match sym {
        "quote" => Some("'"),
        "quasiquote" => Some("`"),
        "unquote" => Some(","),
        "unquote-splicing" => Some(",@"),
        _ => None,
    }
}

fn render_list(obj: Sexp, mode: WriteMode, out: &mut String) {
    let (head, rest) = (obj.car(), obj.cdr());
    if let (Some(prefix), Some((arg, Sexp::NULL))) =
        (head.symbol_name().and_then(quote_prefix), rest.as_pair())
    {
        out.push_str(prefix);
        render_into(arg, mode, out);
        return;
    }
    out.push('(');
    render_into(head, mode, out);
    // `slow` trails `cursor` at half speed; they meet only on a cycle.
    let mut cursor = rest;
    let mut slow = obj;
    let mut advance = false;
    while let Some((car, cdr)) = cursor.as_pair() {
        out.push(' ');
        render_into(car, mode, out);
        cursor = cdr;
        if advance {
            slow = slow.cdr();
        }
        advance = !advance;
        if cursor == slow {
            out.push_str(" ...");
            cursor = Sexp::NULL;
            break;
        }
    }
    if !cursor.is_null() {
        out.push_str(" . ");
        render_into(cursor, mode, out);
    }
    out.push(')');
}

/// Name of an opcode or compiled procedure.
pub fn procedure_name(proc: Sexp) -> Option<String> {
    match proc.object()? {
        HeapObject::Opcode(op) => op.name.string_value(),
        HeapObject::Procedure { bytecode, .. } => match bytecode.object()? {
            HeapObject::Bytecode { name, .. } => name
                .symbol_name()
                .map(str::to_string)
                .or_else(|| name.string_value()),
            _ => None,
        },
        _ => None,
    }
}

impl Context {
    fn emit(&self, out: Sexp, text: &str) -> Result<(), Sexp> {
        let Some(port) = port_cell(out).filter(|_| out.is_oport()) else {
            return Err(self.type_exception(Sexp::FALSE, "output port", out));
        };
        port.borrow_mut()
            .write_str(text)
            .map_err(|e| self.raise(Condition::new("io", e.to_string()).irritant(out)))
    }

    /// Write `obj` to `out` in reader syntax.
    pub fn write(&self, obj: Sexp, out: Sexp) -> Sexp {
        match self.emit(out, &render(obj, WriteMode::Write)) {
            Ok(()) => Sexp::VOID,
            Err(exn) => exn,
        }
    }

    pub fn display(&self, obj: Sexp, out: Sexp) -> Sexp {
        match self.emit(out, &render(obj, WriteMode::Display)) {
            Ok(()) => Sexp::VOID,
            Err(exn) => exn,
        }
    }

    /// Returns 0, or -1 when `out` cannot be written.
    pub fn write_string(&self, text: &str, out: Sexp) -> c_int {
        match self.emit(out, text) {
            Ok(()) => 0,
            Err(_) => -1,
        }
    }

    /// Returns the newline character code, or -1 on failure.
    pub fn newline(&self, out: Sexp) -> c_int {
        match self.emit(out, "\n") {
            Ok(()) => '\n' as c_int,
            Err(_) => -1,
        }
    }

    pub fn write_to_string(&self, obj: Sexp) -> Sexp {
        self.c_string(&render(obj, WriteMode::Write))
    }

    /// One-line description of an exception value (or any other object).
    pub fn exception_report(&self, exn: Sexp) -> String {
        let Some(HeapObject::Exception(e)) = exn.object() else {
            return format!("exception: {}", render(exn, WriteMode::Write));
        };
        let mut report = String::from("ERROR");
        if let Some(name) = procedure_name(e.procedure) {
            let _ = write!(report, " in {}", name);
        }
        if let Some(message) = e.message.string_value() {
            let _ = write!(report, ": {}", message);
        } else if !e.message.is_boolean() {
            report.push_str(": ");
            render_into(e.message, WriteMode::Write, &mut report);
        }
        let mut irritants = e.irritants;
        let mut first = true;
        while let Some((x, rest)) = irritants.as_pair() {
            report.push_str(if first { ": " } else { " " });
            render_into(x, WriteMode::Write, &mut report);
            first = false;
            irritants = rest;
        }
        report
    }

    pub fn print_exception(&self, exn: Sexp, out: Sexp) -> Sexp {
        let mut report = self.exception_report(exn);
        report.push('\n');
        match self.emit(out, &report) {
            Ok(()) => Sexp::VOID,
            Err(err) => err,
        }
    }

    /// Write `msg` and `obj` on one line to the current error port.
    pub fn debug(&self, msg: &str, obj: Sexp) -> c_int {
        let line = format!("{}{}\n", msg, render(obj, WriteMode::Write));
        match self.emit(self.current_error_port(), &line) {
            Ok(()) => 0,
            Err(_) => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::context::{destroy_context, ContextConfig};
    use super::*;

    fn with_context(f: impl FnOnce(&Context)) {
        let ctx = Context::make_eval_context(ContextConfig::default());
        f(unsafe { Context::from_sexp(ctx) });
        unsafe { destroy_context(ctx) };
    }

    fn read_write(c: &Context, text: &str) -> String {
        let port = c.open_input_string(c.c_string(text));
        render(c.read(port), WriteMode::Write)
    }

    #[test]
    fn test_canonical_text() {
        with_context(|c| {
            assert_eq!(read_write(c, "(1 2 . 3)"), "(1 2 . 3)");
            assert_eq!(read_write(c, "#(a \"b\\n\" #\\c)"), "#(a \"b\\n\" #\\c)");
            assert_eq!(read_write(c, "'x"), "'x");
            assert_eq!(read_write(c, "#\\space"), "#\\space");
            assert_eq!(read_write(c, "1/2"), "1/2");
            assert_eq!(read_write(c, "1.5"), "1.5");
            assert_eq!(read_write(c, "#u8(1 255)"), "#u8(1 255)");
            assert_eq!(read_write(c, "(#t #f ())"), "(#t #f ())");
        });
    }

    #[test]
    fn test_display_is_raw() {
        with_context(|c| {
            let s = c.c_string("a\"b");
            assert_eq!(render(s, WriteMode::Display), "a\"b");
            assert_eq!(render(Sexp::make_character('x' as u32), WriteMode::Display), "x");
        });
    }

    #[test]
    fn test_symbols_with_spaces_are_barred() {
        with_context(|c| {
            assert_eq!(render(c.intern("a b"), WriteMode::Write), "|a b|");
            assert_eq!(render(c.intern("a b"), WriteMode::Display), "a b");
        });
    }

    #[test]
    fn test_write_to_port() {
        with_context(|c| {
            let out = c.open_output_string();
            let v = c.vector_from(vec![Sexp::make_fixnum(1), Sexp::make_fixnum(2)]);
            assert_eq!(c.write(v, out), Sexp::VOID);
            assert_eq!(c.write_string(" ok", out), 0);
            assert_eq!(c.newline(out), 10);
            let text = c.get_output_string(out).string_value();
            assert_eq!(text.as_deref(), Some("#(1 2) ok\n"));
        });
    }

    #[test]
    fn test_write_to_input_port_fails() {
        with_context(|c| {
            let input = c.open_input_string(c.c_string(""));
            assert!(c.write(Sexp::TRUE, input).is_exception());
            assert_eq!(c.write_string("x", input), -1);
            assert_eq!(c.newline(input), -1);
        });
    }

    #[test]
    fn test_exception_report() {
        with_context(|c| {
            let exn = c.user_exception(Sexp::FALSE, "bad thing", c.list(&[Sexp::make_fixnum(1), c.c_string("x")]));
            assert_eq!(c.exception_report(exn), "ERROR: bad thing: 1 \"x\"");
            let out = c.open_output_string();
            c.print_exception(exn, out);
            let text = c.get_output_string(out).string_value().unwrap();
            assert!(text.ends_with('\n'));
            assert_eq!(c.exception_report(Sexp::make_fixnum(3)), "exception: 3");
        });
    }

    #[test]
    fn test_circular_list_terminates() {
        with_context(|c| {
            let ls = c.list(&[Sexp::make_fixnum(1), Sexp::make_fixnum(2)]);
            ls.cdr().set_cdr(ls);
            assert_eq!(render(ls, WriteMode::Write), "(1 2 ...)");
        });
    }

    #[test]
    fn test_cycle_behind_head_terminates() {
        with_context(|c| {
            let ls = c.list(&[Sexp::make_fixnum(0), Sexp::make_fixnum(1), Sexp::make_fixnum(2)]);
            ls.cdr().cdr().set_cdr(ls.cdr());
            let out = c.open_output_string();
            assert_eq!(c.write(ls, out), Sexp::VOID);
            let text = c.get_output_string(out).string_value();
            assert_eq!(text.as_deref(), Some("(0 1 2 ...)"));

            let long = c.list(&[0, 1, 2, 3, 4].map(Sexp::make_fixnum));
            long.cdr().cdr().cdr().cdr().set_cdr(long.cdr().cdr());
            assert_eq!(render(long, WriteMode::Display), "(0 1 2 3 4 ...)");
        });
    }
}
