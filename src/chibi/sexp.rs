//! Tagged value handle for the context-threaded backend.
//!
//! A `Sexp` is one machine word. The low bits select the representation:
//!
//! ```text
//! ...xxxxxxx1   fixnum            (value << 1) | 1
//! ...xxxxx000   heap pointer      (non-zero, 8-byte aligned HeapCell)
//! ...xxxxx100   string cursor     (offset << 3) | 0b100
//! ...00000110   character         (code point << 8) | 0x06
//! ...xxxx1110   immediate         (n << 4) | 0x0E
//! ```
//!
//! Immediates: `#f`=0, `#t`=1, `()`=2, eof=3, void=4, undefined=5.

use std::fmt;

use super::heap::{HeapCell, HeapObject, HeapTag};

pub type SexpSint = isize;
pub type SexpUint = usize;

const FIXNUM_MASK: usize = 0b1;
const FIXNUM_TAG: usize = 0b1;
const POINTER_MASK: usize = 0b111;
const CURSOR_MASK: usize = 0b111;
const CURSOR_TAG: usize = 0b100;
const CURSOR_BITS: u32 = 3;
const CHAR_MASK: usize = 0xFF;
const CHAR_TAG: usize = 0x06;
const CHAR_BITS: u32 = 8;
const IMMEDIATE_MASK: usize = 0xF;
const IMMEDIATE_TAG: usize = 0x0E;

const fn immediate(n: usize) -> Sexp {
    Sexp((n << 4) | IMMEDIATE_TAG)
}

pub const SEXP_MAX_FIXNUM: SexpSint = SexpSint::MAX >> 1;
pub const SEXP_MIN_FIXNUM: SexpSint = SexpSint::MIN >> 1;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Sexp(usize);

const _: () = assert!(std::mem::size_of::<Sexp>() == std::mem::size_of::<usize>());

impl Sexp {
    pub const FALSE: Sexp = immediate(0);
    pub const TRUE: Sexp = immediate(1);
    pub const NULL: Sexp = immediate(2);
    pub const EOF: Sexp = immediate(3);
    pub const VOID: Sexp = immediate(4);
    pub const UNDEF: Sexp = immediate(5);
    pub const ZERO: Sexp = Sexp::make_fixnum(0);

    /// Reinterpret a raw word as a handle.
    ///
    /// # Safety
    /// A word with pointer tagging must address a live heap cell owned by a
    /// context; every accessor dereferences it.
    pub const unsafe fn from_raw(raw: usize) -> Sexp {
        Sexp(raw)
    }

    pub const fn raw(self) -> usize {
        self.0
    }

    pub(crate) fn from_cell(cell: *const HeapCell) -> Sexp {
        Sexp(cell as usize)
    }

    // -------------------------------------------------------------------------
    // Immediate constructors and unboxing
    // -------------------------------------------------------------------------

    /// Box a fixnum. Values outside `SEXP_MIN_FIXNUM..=SEXP_MAX_FIXNUM`
    /// lose their top bit; callers that may overflow use `make_integer`.
    pub const fn make_fixnum(n: SexpSint) -> Sexp {
        Sexp(((n as usize) << 1) | FIXNUM_TAG)
    }

    pub const fn unbox_fixnum(self) -> SexpSint {
        (self.0 as SexpSint) >> 1
    }

    pub const fn make_boolean(b: bool) -> Sexp {
        if b {
            Sexp::TRUE
        } else {
            Sexp::FALSE
        }
    }

    pub fn unbox_boolean(self) -> bool {
        self != Sexp::FALSE
    }

    pub const fn make_character(c: u32) -> Sexp {
        Sexp(((c as usize) << CHAR_BITS) | CHAR_TAG)
    }

    pub const fn unbox_character(self) -> u32 {
        (self.0 >> CHAR_BITS) as u32
    }

    /// The boxed character as a Rust `char`, if it is a valid scalar value.
    pub fn as_char(self) -> Option<char> {
        if self.is_char() {
            char::from_u32(self.unbox_character())
        } else {
            None
        }
    }

    pub const fn make_string_cursor(offset: SexpSint) -> Sexp {
        Sexp(((offset as usize) << CURSOR_BITS) | CURSOR_TAG)
    }

    pub const fn unbox_string_cursor(self) -> SexpSint {
        (self.0 as SexpSint) >> CURSOR_BITS
    }

    // -------------------------------------------------------------------------
    // Representation predicates
    // -------------------------------------------------------------------------

    #[inline]
    pub const fn is_fixnum(self) -> bool {
        self.0 & FIXNUM_MASK == FIXNUM_TAG
    }

    #[inline]
    pub const fn is_pointer(self) -> bool {
        self.0 & POINTER_MASK == 0 && self.0 != 0
    }

    #[inline]
    pub const fn is_string_cursor(self) -> bool {
        self.0 & CURSOR_MASK == CURSOR_TAG
    }

    #[inline]
    pub const fn is_char(self) -> bool {
        self.0 & CHAR_MASK == CHAR_TAG
    }

    #[inline]
    pub const fn is_immediate(self) -> bool {
        self.0 & IMMEDIATE_MASK == IMMEDIATE_TAG
    }

    pub fn is_boolean(self) -> bool {
        self == Sexp::TRUE || self == Sexp::FALSE
    }

    pub fn is_null(self) -> bool {
        self == Sexp::NULL
    }

    pub fn is_eof(self) -> bool {
        self == Sexp::EOF
    }

    pub fn is_void(self) -> bool {
        self == Sexp::VOID
    }

    pub fn is_true(self) -> bool {
        self != Sexp::FALSE
    }

    // -------------------------------------------------------------------------
    // Heap access
    // -------------------------------------------------------------------------

    /// The heap cell behind a pointer handle.
    ///
    /// The returned reference is only valid until the owning context
    /// collects the object or is destroyed.
    #[inline]
    pub(crate) fn cell(self) -> Option<&'static HeapCell> {
        if self.is_pointer() {
            // SAFETY: pointer-tagged handles are only produced by context
            // allocation (or the unsafe `from_raw`).
            Some(unsafe { &*(self.0 as *const HeapCell) })
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn object(self) -> Option<&'static HeapObject> {
        self.cell().map(|c| &c.obj)
    }

    #[inline]
    pub fn heap_tag(self) -> Option<HeapTag> {
        self.object().map(HeapObject::tag)
    }

    #[inline]
    fn has_tag(self, tag: HeapTag) -> bool {
        self.heap_tag() == Some(tag)
    }

    // -------------------------------------------------------------------------
    // Kind predicates
    // -------------------------------------------------------------------------

    pub fn is_flonum(self) -> bool {
        self.has_tag(HeapTag::Flonum)
    }

    pub fn is_bignum(self) -> bool {
        self.has_tag(HeapTag::Bignum)
    }

    pub fn is_ratio(self) -> bool {
        self.has_tag(HeapTag::Ratio)
    }

    pub fn is_complex(self) -> bool {
        self.has_tag(HeapTag::Complex)
    }

    pub fn is_integer(self) -> bool {
        self.is_fixnum() || self.is_bignum()
    }

    pub fn is_number(self) -> bool {
        self.is_fixnum()
            || matches!(
                self.heap_tag(),
                Some(HeapTag::Flonum | HeapTag::Bignum | HeapTag::Ratio | HeapTag::Complex)
            )
    }

    pub fn is_string(self) -> bool {
        self.has_tag(HeapTag::String)
    }

    pub fn is_bytes(self) -> bool {
        self.has_tag(HeapTag::Bytes)
    }

    pub fn is_symbol(self) -> bool {
        self.has_tag(HeapTag::Symbol)
    }

    pub fn is_pair(self) -> bool {
        self.has_tag(HeapTag::Pair)
    }

    pub fn is_vector(self) -> bool {
        self.has_tag(HeapTag::Vector)
    }

    pub fn is_iport(self) -> bool {
        match self.object() {
            Some(HeapObject::Port(p)) => p.borrow().is_input(),
            _ => false,
        }
    }

    pub fn is_oport(self) -> bool {
        match self.object() {
            Some(HeapObject::Port(p)) => !p.borrow().is_input(),
            _ => false,
        }
    }

    pub fn is_port(self) -> bool {
        self.has_tag(HeapTag::Port)
    }

    pub fn is_procedure(self) -> bool {
        self.has_tag(HeapTag::Procedure)
    }

    pub fn is_opcode(self) -> bool {
        self.has_tag(HeapTag::Opcode)
    }

    pub fn is_applicable(self) -> bool {
        self.is_procedure() || self.is_opcode()
    }

    pub fn is_type(self) -> bool {
        self.has_tag(HeapTag::Type)
    }

    pub fn is_record(self) -> bool {
        self.has_tag(HeapTag::Record)
    }

    pub fn is_exception(self) -> bool {
        self.has_tag(HeapTag::Exception)
    }

    pub fn is_context(self) -> bool {
        self.has_tag(HeapTag::Context)
    }

    pub fn is_env(self) -> bool {
        self.has_tag(HeapTag::Env)
    }

    pub fn is_core(self) -> bool {
        self.has_tag(HeapTag::Core)
    }

    pub fn is_macro(self) -> bool {
        self.has_tag(HeapTag::Macro)
    }

    pub fn is_synclo(self) -> bool {
        self.has_tag(HeapTag::SynClo)
    }

    pub fn is_bytecode(self) -> bool {
        self.has_tag(HeapTag::Bytecode)
    }

    pub fn is_cpointer(self) -> bool {
        self.has_tag(HeapTag::CPointer)
    }

    pub fn is_parameter(self) -> bool {
        self.has_tag(HeapTag::Parameter)
    }

    // -------------------------------------------------------------------------
    // Context-free field access
    // -------------------------------------------------------------------------

    /// `car` of a pair. Panics on any other kind.
    pub fn car(self) -> Sexp {
        match self.object() {
            Some(HeapObject::Pair { car, .. }) => car.get(),
            _ => panic!("car: not a pair: {:?}", self),
        }
    }

    /// `cdr` of a pair. Panics on any other kind.
    pub fn cdr(self) -> Sexp {
        match self.object() {
            Some(HeapObject::Pair { cdr, .. }) => cdr.get(),
            _ => panic!("cdr: not a pair: {:?}", self),
        }
    }

    pub fn set_car(self, value: Sexp) {
        match self.object() {
            Some(HeapObject::Pair { car, .. }) => car.set(value),
            _ => panic!("set-car!: not a pair: {:?}", self),
        }
    }

    pub fn set_cdr(self, value: Sexp) {
        match self.object() {
            Some(HeapObject::Pair { cdr, .. }) => cdr.set(value),
            _ => panic!("set-cdr!: not a pair: {:?}", self),
        }
    }

    /// Pair fields without panicking.
    pub fn as_pair(self) -> Option<(Sexp, Sexp)> {
        match self.object() {
            Some(HeapObject::Pair { car, cdr }) => Some((car.get(), cdr.get())),
            _ => None,
        }
    }

    /// Symbol name, if this is a symbol.
    pub fn symbol_name(self) -> Option<&'static str> {
        match self.object() {
            Some(HeapObject::Symbol(name)) => Some(name),
            _ => None,
        }
    }

    /// Copy of a string's contents (without the trailing NUL).
    pub fn string_value(self) -> Option<String> {
        match self.object() {
            Some(HeapObject::String(bytes)) => {
                let bytes = bytes.borrow();
                Some(String::from_utf8_lossy(&bytes[..bytes.len() - 1]).into_owned())
            }
            _ => None,
        }
    }

    /// Value of an immediate or boxed flonum as `f64`.
    pub fn flonum_value(self) -> Option<f64> {
        match self.object() {
            Some(HeapObject::Flonum(f)) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Debug for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_fixnum() {
            write!(f, "Sexp({})", self.unbox_fixnum())
        } else if let Some(c) = self.as_char() {
            write!(f, "Sexp({:?})", c)
        } else if self.is_string_cursor() {
            write!(f, "Sexp(cursor {})", self.unbox_string_cursor())
        } else if let Some(tag) = self.heap_tag() {
            write!(f, "Sexp(<{}> {:#x})", tag.type_name(), self.0)
        } else {
            let name = match *self {
                Sexp::FALSE => "#f",
                Sexp::TRUE => "#t",
                Sexp::NULL => "()",
                Sexp::EOF => "#<eof>",
                Sexp::VOID => "#<void>",
                Sexp::UNDEF => "#<undef>",
                _ => return write!(f, "Sexp({:#x})", self.0),
            };
            write!(f, "Sexp({})", name)
        }
    }
}
