//! Guile instance and value operations.
//!
//! A [`Guile`] owns every object allocated through it; handles stay valid
//! until the instance is dropped. [`with_guile`] is the scoped way to get
//! one. Operations that allocate take the instance as an argument, the
//! rest work on handles alone.

use std::cell::{Cell, RefCell};
use std::ffi::c_char;
use std::fmt::Write as _;
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::scm::{GuileCell, GuileObject, Scm, SCM_MOST_NEGATIVE_FIXNUM, SCM_MOST_POSITIVE_FIXNUM};
use crate::error::{Result, ShimError};
use crate::number::{format_flonum, Number};
use crate::reader::{read_one, Datum};

pub struct Guile {
    heap: RefCell<Vec<Box<GuileCell>>>,
    symbols: RefCell<FxHashMap<Box<str>, Scm>>,
    _not_send: PhantomData<*const ()>,
}

impl Default for Guile {
    fn default() -> Self {
        Guile::new()
    }
}

impl Guile {
    pub fn new() -> Guile {
        Guile {
            heap: RefCell::new(Vec::new()),
            symbols: RefCell::new(FxHashMap::default()),
            _not_send: PhantomData,
        }
    }

    fn alloc(&self, obj: GuileObject) -> Scm {
        let cell = Box::new(GuileCell { obj });
        let scm = Scm::from_cell(&*cell);
        self.heap.borrow_mut().push(cell);
        scm
    }

    /// Number of heap objects owned by this instance.
    pub fn heap_len(&self) -> usize {
        self.heap.borrow().len()
    }

    pub fn cons(&self, car: Scm, cdr: Scm) -> Scm {
        self.alloc(GuileObject::Pair {
            car: Cell::new(car),
            cdr: Cell::new(cdr),
        })
    }

    pub fn list(&self, items: &[Scm]) -> Scm {
        items
            .iter()
            .rev()
            .fold(Scm::EOL, |acc, &item| self.cons(item, acc))
    }

    pub fn from_utf8_symbol(&self, name: &str) -> Scm {
        if let Some(&sym) = self.symbols.borrow().get(name) {
            return sym;
        }
        let sym = self.alloc(GuileObject::Symbol(name.into()));
        self.symbols.borrow_mut().insert(name.into(), sym);
        sym
    }

    pub fn from_utf8_string(&self, text: &str) -> Scm {
        self.alloc(GuileObject::String(text.to_string()))
    }

    pub fn from_int64(&self, n: i64) -> Scm {
        match isize::try_from(n) {
            Ok(n) if (SCM_MOST_NEGATIVE_FIXNUM..=SCM_MOST_POSITIVE_FIXNUM).contains(&n) => {
                Scm::from_fixnum(n)
            }
            _ => self.alloc(GuileObject::Integer(BigInt::from(n))),
        }
    }

    pub fn from_double(&self, f: f64) -> Scm {
        self.alloc(GuileObject::Real(f))
    }

    pub fn from_number(&self, n: &Number) -> Scm {
        match n {
            Number::Integer(i) => match i.to_i64() {
                Some(small) => self.from_int64(small),
                None => self.alloc(GuileObject::Integer(i.clone())),
            },
            Number::Real(f) => self.from_double(*f),
            other => self.alloc(GuileObject::Number(other.clone())),
        }
    }

    /// `symbol->string`. Panics on non-symbols.
    pub fn symbol_to_string(&self, sym: Scm) -> Scm {
        match sym.symbol_name() {
            Some(name) => self.from_utf8_string(name),
            None => panic!("scm_symbol_to_string: wrong type argument: {:?}", sym),
        }
    }

    /// Read the first datum of `text`; the eof object when there is none.
    pub fn read_string(&self, text: &str) -> Result<Scm> {
        match read_one(text)? {
            Some((datum, _)) => Ok(self.datum_to_scm(&datum)),
            None => Ok(Scm::EOF_VAL),
        }
    }

    pub fn datum_to_scm(&self, datum: &Datum) -> Scm {
        match datum {
            Datum::Null => Scm::EOL,
            Datum::Nil => Scm::ELISP_NIL,
            Datum::Bool(b) => Scm::from_bool(*b),
            Datum::Number(n) => self.from_number(n),
            Datum::Char(c) => Scm::from_char(*c),
            Datum::String(s) => self.from_utf8_string(s),
            Datum::Symbol(s) => self.from_utf8_symbol(s),
            Datum::List(items, tail) => {
                let tail = tail.as_ref().map_or(Scm::EOL, |t| self.datum_to_scm(t));
                items
                    .iter()
                    .rev()
                    .fold(tail, |acc, item| self.cons(self.datum_to_scm(item), acc))
            }
            Datum::Vector(items) => {
                let items = items.iter().map(|d| self.datum_to_scm(d)).collect();
                self.alloc(GuileObject::Vector(RefCell::new(items)))
            }
            Datum::Bytes(bytes) => self.alloc(GuileObject::Bytevector(bytes.clone())),
        }
    }
}

impl Drop for Guile {
    fn drop(&mut self) {
        debug!(objects = self.heap.get_mut().len(), "guile instance released");
    }
}

/// Run `f` against a fresh instance.
///
/// The instance is torn down when `f` returns. A panic inside `f` (the
/// analogue of a non-local exit) is caught and reported as
/// [`ShimError::NonLocalExit`].
pub fn with_guile<R>(f: impl FnOnce(&Guile) -> R) -> Result<R> {
    debug!("entering guile mode");
    let guile = Guile::new();
    let res = catch_unwind(AssertUnwindSafe(|| f(&guile)));
    drop(guile);
    res.map_err(|_| {
        warn!("nonlocal exit from guile mode");
        ShimError::NonLocalExit
    })
}

// =============================================================================
// Context-free operations
// =============================================================================

pub fn scm_pair_p(x: Scm) -> Scm {
    Scm::from_bool(x.is_pair())
}

pub fn scm_string_p(x: Scm) -> Scm {
    Scm::from_bool(x.is_string())
}

/// `#t` for a proper list (`()` and `#nil` included), `#f` otherwise,
/// including circular lists.
pub fn scm_list_p(x: Scm) -> Scm {
    let mut slow = x;
    let mut fast = x;
    loop {
        for _ in 0..2 {
            match fast.as_pair() {
                Some((_, next)) => fast = next,
                None => return Scm::from_bool(fast.is_null()),
            }
        }
        slow = slow.cdr();
        if slow == fast {
            return Scm::BOOL_F;
        }
    }
}

pub fn scm_is_bool(x: Scm) -> bool {
    x.is_bool()
}

pub fn scm_is_integer(x: Scm) -> bool {
    x.is_integer()
}

pub fn scm_is_real(x: Scm) -> bool {
    x.is_real()
}

/// Panics (wrong-type-arg) on non-booleans.
pub fn scm_to_bool(x: Scm) -> bool {
    if !x.is_bool() {
        panic!("scm_to_bool: wrong type argument: {:?}", x);
    }
    x.is_true()
}

/// Panics when `x` is not an integer or does not fit.
pub fn scm_to_int64(x: Scm) -> i64 {
    if x.is_fixnum() {
        return x.fixnum_value() as i64;
    }
    match x.number() {
        Some(Number::Integer(n)) => match n.to_i64() {
            Some(v) => v,
            None => panic!("scm_to_int64: out of range: {}", n),
        },
        _ => panic!("scm_to_int64: wrong type argument: {:?}", x),
    }
}

/// Panics when `x` is not real.
pub fn scm_to_double(x: Scm) -> f64 {
    match x.number().filter(|_| x.is_real()).and_then(|n| n.to_f64()) {
        Some(f) => f,
        None => panic!("scm_to_double: wrong type argument: {:?}", x),
    }
}

/// First entry of `alist` whose car is `key`, or `#f`. Non-pair entries
/// are skipped.
pub fn scm_assq(key: Scm, alist: Scm) -> Scm {
    let mut cursor = alist;
    while let Some((entry, rest)) = cursor.as_pair() {
        if entry.as_pair().is_some_and(|(k, _)| k == key) {
            return entry;
        }
        cursor = rest;
    }
    Scm::BOOL_F
}

/// Copy a string into a `malloc` block, NUL-terminated. Stores the length
/// without the terminator in `lenp`. Release with `wrapper_free`. Panics on
/// non-strings.
pub fn scm_to_utf8_stringn(s: Scm, lenp: Option<&mut usize>) -> *mut c_char {
    let Some(text) = s.string_value() else {
        panic!("scm_to_utf8_stringn: wrong type argument: {:?}", s);
    };
    let bytes = text.as_bytes();
    // SAFETY: the block is sized for the bytes plus the terminator.
    let buf = unsafe { libc::malloc(bytes.len() + 1) as *mut u8 };
    if buf.is_null() {
        panic!("scm_to_utf8_stringn: out of memory");
    }
    unsafe {
        ptr::copy_nonoverlapping(bytes.as_ptr(), buf, bytes.len());
        *buf.add(bytes.len()) = 0;
    }
    if let Some(len) = lenp {
        *len = bytes.len();
    }
    buf as *mut c_char
}

/// Printed representation in `write` syntax.
pub fn object_to_string(x: Scm) -> String {
    let mut out = String::new();
    write_into(x, &mut out);
    out
}

fn write_into(x: Scm, out: &mut String) {
    if x.is_fixnum() {
        let _ = write!(out, "{}", x.fixnum_value());
        return;
    }
    if let Some(c) = x.char_value() {
        match c {
            ' ' => out.push_str("#\\space"),
            '\n' => out.push_str("#\\newline"),
            '\t' => out.push_str("#\\tab"),
            c => {
                let _ = write!(out, "#\\{}", c);
            }
        }
        return;
    }
    let Some(obj) = x.object() else {
        out.push_str(match x {
            Scm::BOOL_F => "#f",
            Scm::BOOL_T => "#t",
            Scm::ELISP_NIL => "#nil",
            Scm::EOL => "()",
            Scm::EOF_VAL => "#<eof>",
            Scm::UNSPECIFIED => "#<unspecified>",
            _ => "#<undefined>",
        });
        return;
    };
    match obj {
        GuileObject::Pair { .. } => {
            out.push('(');
            write_into(x.car(), out);
            let mut cursor = x.cdr();
            let mut slow = x;
            let mut advance = false;
            while let Some((car, cdr)) = cursor.as_pair() {
                out.push(' ');
                write_into(car, out);
                cursor = cdr;
                if advance {
                    slow = slow.cdr();
                }
                advance = !advance;
                if cursor == slow {
                    out.push_str(" ...");
                    cursor = Scm::EOL;
                    break;
                }
            }
            if cursor != Scm::EOL {
                out.push_str(" . ");
                write_into(cursor, out);
            }
            out.push(')');
        }
        GuileObject::String(s) => {
            out.push('"');
            for c in s.chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    c => out.push(c),
                }
            }
            out.push('"');
        }
        GuileObject::Symbol(name) => out.push_str(name),
        GuileObject::Integer(n) => {
            let _ = write!(out, "{}", n);
        }
        GuileObject::Real(f) => out.push_str(&format_flonum(*f)),
        GuileObject::Number(n) => {
            let _ = write!(out, "{}", n);
        }
        GuileObject::Vector(items) => {
            out.push_str("#(");
            for (i, &item) in items.borrow().iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_into(item, out);
            }
            out.push(')');
        }
        GuileObject::Bytevector(bytes) => {
            out.push_str("#vu8(");
            for (i, b) in bytes.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                let _ = write!(out, "{}", b);
            }
            out.push(')');
        }
    }
}
