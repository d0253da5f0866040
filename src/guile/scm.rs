//! Tagged value handle for the implicit-context backend.
//!
//! ```text
//! ...xxxxxx10   fixnum        (value << 2) | 0b10
//! ...xxxxx000   heap pointer  (non-zero, 8-byte aligned GuileCell)
//! ...00001100   character     (code point << 8) | 0x0C
//! ...00000100   immediate     #f=0x004 #nil=0x104 ()=0x304 #t=0x404
//!                             unspecified=0x804 undefined=0x904 eof=0xA04
//! ```
//!
//! `#f` and `#nil` are the only false values.

use std::cell::{Cell, RefCell};
use std::fmt;

use num_bigint::BigInt;

use crate::number::Number;

const FIXNUM_MASK: usize = 0b11;
const FIXNUM_TAG: usize = 0b10;
const FIXNUM_BITS: u32 = 2;
const POINTER_MASK: usize = 0b111;
const LOW_BYTE: usize = 0xFF;
const CHAR_TAG: usize = 0x0C;
const CHAR_BITS: u32 = 8;
const IMMEDIATE_TAG: usize = 0x04;

pub const SCM_MOST_POSITIVE_FIXNUM: isize = isize::MAX >> FIXNUM_BITS;
pub const SCM_MOST_NEGATIVE_FIXNUM: isize = isize::MIN >> FIXNUM_BITS;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Scm(usize);

impl Scm {
    pub const BOOL_F: Scm = Scm(0x004);
    pub const ELISP_NIL: Scm = Scm(0x104);
    pub const EOL: Scm = Scm(0x304);
    pub const BOOL_T: Scm = Scm(0x404);
    pub const UNSPECIFIED: Scm = Scm(0x804);
    pub const UNDEFINED: Scm = Scm(0x904);
    pub const EOF_VAL: Scm = Scm(0xA04);

    /// # Safety
    /// A pointer-tagged word must address a live cell of a `Guile` instance.
    pub const unsafe fn from_raw(raw: usize) -> Scm {
        Scm(raw)
    }

    pub const fn raw(self) -> usize {
        self.0
    }

    pub(crate) fn from_cell(cell: *const GuileCell) -> Scm {
        Scm(cell as usize)
    }

    /// Box an integer in fixnum range. Larger values need `Guile::from_int64`.
    pub const fn from_fixnum(n: isize) -> Scm {
        Scm(((n as usize) << FIXNUM_BITS) | FIXNUM_TAG)
    }

    pub const fn fixnum_value(self) -> isize {
        (self.0 as isize) >> FIXNUM_BITS
    }

    pub const fn from_bool(b: bool) -> Scm {
        if b {
            Scm::BOOL_T
        } else {
            Scm::BOOL_F
        }
    }

    pub const fn from_char(c: char) -> Scm {
        Scm(((c as usize) << CHAR_BITS) | CHAR_TAG)
    }

    pub fn char_value(self) -> Option<char> {
        if self.is_char() {
            char::from_u32((self.0 >> CHAR_BITS) as u32)
        } else {
            None
        }
    }

    pub const fn is_fixnum(self) -> bool {
        self.0 & FIXNUM_MASK == FIXNUM_TAG
    }

    pub const fn is_pointer(self) -> bool {
        self.0 != 0 && self.0 & POINTER_MASK == 0
    }

    pub const fn is_char(self) -> bool {
        self.0 & LOW_BYTE == CHAR_TAG
    }

    pub const fn is_immediate(self) -> bool {
        self.0 & LOW_BYTE == IMMEDIATE_TAG
    }

    pub fn is_true(self) -> bool {
        self != Scm::BOOL_F && self != Scm::ELISP_NIL
    }

    pub fn is_false(self) -> bool {
        !self.is_true()
    }

    pub fn is_bool(self) -> bool {
        self == Scm::BOOL_F || self == Scm::BOOL_T || self == Scm::ELISP_NIL
    }

    /// `()` or `#nil`.
    pub fn is_null(self) -> bool {
        self == Scm::EOL || self == Scm::ELISP_NIL
    }

    pub fn is_eof(self) -> bool {
        self == Scm::EOF_VAL
    }

    pub fn is_unspecified(self) -> bool {
        self == Scm::UNSPECIFIED
    }

    #[inline]
    pub(crate) fn object(self) -> Option<&'static GuileObject> {
        if self.is_pointer() {
            // SAFETY: pointer handles are only produced by `Guile::alloc`
            // (or the unsafe `from_raw`) and live as long as their instance.
            Some(unsafe { &(*(self.0 as *const GuileCell)).obj })
        } else {
            None
        }
    }

    pub fn is_pair(self) -> bool {
        matches!(self.object(), Some(GuileObject::Pair { .. }))
    }

    pub fn is_string(self) -> bool {
        matches!(self.object(), Some(GuileObject::String(_)))
    }

    pub fn is_symbol(self) -> bool {
        matches!(self.object(), Some(GuileObject::Symbol(_)))
    }

    pub fn is_vector(self) -> bool {
        matches!(self.object(), Some(GuileObject::Vector(_)))
    }

    pub fn is_bytevector(self) -> bool {
        matches!(self.object(), Some(GuileObject::Bytevector(_)))
    }

    pub fn is_integer(self) -> bool {
        self.is_fixnum() || matches!(self.object(), Some(GuileObject::Integer(_)))
    }

    pub fn is_real(self) -> bool {
        self.is_integer()
            || matches!(
                self.object(),
                Some(GuileObject::Real(_)) | Some(GuileObject::Number(Number::Rational(..)))
            )
    }

    pub fn is_number(self) -> bool {
        self.is_real() || matches!(self.object(), Some(GuileObject::Number(_)))
    }

    pub fn as_pair(self) -> Option<(Scm, Scm)> {
        match self.object() {
            Some(GuileObject::Pair { car, cdr }) => Some((car.get(), cdr.get())),
            _ => None,
        }
    }

    /// Panics (wrong-type-arg) on non-pairs.
    pub fn car(self) -> Scm {
        match self.as_pair() {
            Some((car, _)) => car,
            None => panic!("scm_car: wrong type argument: {:?}", self),
        }
    }

    pub fn cdr(self) -> Scm {
        match self.as_pair() {
            Some((_, cdr)) => cdr,
            None => panic!("scm_cdr: wrong type argument: {:?}", self),
        }
    }

    pub fn set_cdr(self, value: Scm) {
        match self.object() {
            Some(GuileObject::Pair { cdr, .. }) => cdr.set(value),
            _ => panic!("scm_set_cdr_x: wrong type argument: {:?}", self),
        }
    }

    pub fn symbol_name(self) -> Option<&'static str> {
        match self.object() {
            Some(GuileObject::Symbol(name)) => Some(name),
            _ => None,
        }
    }

    pub fn string_value(self) -> Option<&'static str> {
        match self.object() {
            Some(GuileObject::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Numeric value in the neutral tower.
    pub fn number(self) -> Option<Number> {
        if self.is_fixnum() {
            return Some(Number::Integer(BigInt::from(self.fixnum_value())));
        }
        match self.object()? {
            GuileObject::Integer(n) => Some(Number::Integer(n.clone())),
            GuileObject::Real(f) => Some(Number::Real(*f)),
            GuileObject::Number(n) => Some(n.clone()),
            _ => None,
        }
    }
}

impl fmt::Debug for Scm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_fixnum() {
            return write!(f, "Scm({})", self.fixnum_value());
        }
        if let Some(c) = self.char_value() {
            return write!(f, "Scm({:?})", c);
        }
        let name = match *self {
            Scm::BOOL_F => "#f",
            Scm::BOOL_T => "#t",
            Scm::ELISP_NIL => "#nil",
            Scm::EOL => "()",
            Scm::UNSPECIFIED => "#<unspecified>",
            Scm::UNDEFINED => "#<undefined>",
            Scm::EOF_VAL => "#<eof>",
            _ => match self.object() {
                Some(obj) => return write!(f, "Scm(<{}> {:#x})", obj.type_name(), self.0),
                None => return write!(f, "Scm({:#x})", self.0),
            },
        };
        write!(f, "Scm({})", name)
    }
}

pub enum GuileObject {
    Pair { car: Cell<Scm>, cdr: Cell<Scm> },
    String(String),
    Symbol(Box<str>),
    /// Exact integer outside fixnum range.
    Integer(BigInt),
    Real(f64),
    /// Exact rationals and complex numbers.
    Number(Number),
    Vector(RefCell<Vec<Scm>>),
    Bytevector(Vec<u8>),
}

impl GuileObject {
    pub fn type_name(&self) -> &'static str {
        match self {
            GuileObject::Pair { .. } => "pair",
            GuileObject::String(_) => "string",
            GuileObject::Symbol(_) => "symbol",
            GuileObject::Integer(_) => "integer",
            GuileObject::Real(_) => "real",
            GuileObject::Number(_) => "number",
            GuileObject::Vector(_) => "vector",
            GuileObject::Bytevector(_) => "bytevector",
        }
    }
}

#[repr(align(8))]
pub struct GuileCell {
    pub obj: GuileObject,
}
