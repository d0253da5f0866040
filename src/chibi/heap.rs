//! Heap-allocated objects of the context-threaded backend.
//!
//! Every non-immediate `Sexp` points at a `HeapCell` owned by its context's
//! arena. The cell carries the collector's mark bit next to the object.

use std::cell::{Cell, RefCell};
use std::ffi::c_void;

use num_bigint::BigInt;
use rustc_hash::FxHashMap;

use super::context::Context;
use super::foreign::ForeignFn;
use super::port::Port;
use super::sexp::Sexp;

/// Discriminant for heap object kinds, used by the predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HeapTag {
    Pair = 0,
    String = 1,
    Bytes = 2,
    Vector = 3,
    Symbol = 4,
    Flonum = 5,
    Bignum = 6,
    Ratio = 7,
    Complex = 8,
    Port = 9,
    Opcode = 10,
    Procedure = 11,
    Bytecode = 12,
    Type = 13,
    Record = 14,
    CPointer = 15,
    Exception = 16,
    Env = 17,
    Core = 18,
    Macro = 19,
    SynClo = 20,
    Parameter = 21,
    Context = 22,
}

impl HeapTag {
    pub fn type_name(self) -> &'static str {
        match self {
            HeapTag::Pair => "pair",
            HeapTag::String => "string",
            HeapTag::Bytes => "bytevector",
            HeapTag::Vector => "vector",
            HeapTag::Symbol => "symbol",
            HeapTag::Flonum => "flonum",
            HeapTag::Bignum => "bignum",
            HeapTag::Ratio => "ratio",
            HeapTag::Complex => "complex",
            HeapTag::Port => "port",
            HeapTag::Opcode => "opcode",
            HeapTag::Procedure => "procedure",
            HeapTag::Bytecode => "bytecode",
            HeapTag::Type => "type",
            HeapTag::Record => "record",
            HeapTag::CPointer => "cpointer",
            HeapTag::Exception => "exception",
            HeapTag::Env => "environment",
            HeapTag::Core => "core-form",
            HeapTag::Macro => "macro",
            HeapTag::SynClo => "syntactic-closure",
            HeapTag::Parameter => "parameter",
            HeapTag::Context => "context",
        }
    }

    /// Builtin kinds in type-id order; user types are numbered after these.
    pub const BUILTIN: [HeapTag; 23] = [
        HeapTag::Pair,
        HeapTag::String,
        HeapTag::Bytes,
        HeapTag::Vector,
        HeapTag::Symbol,
        HeapTag::Flonum,
        HeapTag::Bignum,
        HeapTag::Ratio,
        HeapTag::Complex,
        HeapTag::Port,
        HeapTag::Opcode,
        HeapTag::Procedure,
        HeapTag::Bytecode,
        HeapTag::Type,
        HeapTag::Record,
        HeapTag::CPointer,
        HeapTag::Exception,
        HeapTag::Env,
        HeapTag::Core,
        HeapTag::Macro,
        HeapTag::SynClo,
        HeapTag::Parameter,
        HeapTag::Context,
    ];
}

/// Primitive implemented by a host function.
pub struct Opcode {
    /// Scheme string naming the primitive.
    pub name: Sexp,
    pub func: ForeignFn,
    /// Source of the trailing argument when the caller omits it.
    pub optional: OptionalArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalArg {
    None,
    Default(Sexp),
    /// Parameter object whose current value fills the last argument.
    Param(Sexp),
}

impl Opcode {
    pub fn num_args(&self) -> usize {
        self.func.arity()
    }
}

/// Where a type descriptor's instances come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Builtin(HeapTag),
    Record,
    CPointer,
}

pub struct TypeInfo {
    pub id: usize,
    /// Scheme string.
    pub name: Sexp,
    /// Parent type descriptor or `#f`.
    pub parent: Sexp,
    /// List of slot name symbols.
    pub slots: Sexp,
    pub num_slots: usize,
    /// Opcode of one argument, or `#f`.
    pub finalizer: Sexp,
    pub kind: TypeKind,
}

pub struct CPointer {
    pub type_id: usize,
    pub value: Cell<*mut c_void>,
    /// Object that keeps the pointee alive, or `#f`.
    pub parent: Sexp,
    /// Release `value` with `free` when the pointer is collected.
    pub freep: bool,
}

pub struct ExceptionData {
    /// Symbol: `type`, `range`, `read`, `user`, ...
    pub kind: Sexp,
    pub message: Sexp,
    pub irritants: Sexp,
    pub procedure: Sexp,
    pub source: Sexp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreForm {
    Define,
    Set,
    Lambda,
    If,
    Begin,
    Quote,
    DefineSyntax,
    LetSyntax,
    LetrecSyntax,
    ErMacroTransformer,
}

impl CoreForm {
    pub const ALL: [(CoreForm, &'static str); 10] = [
        (CoreForm::Define, "define"),
        (CoreForm::Set, "set!"),
        (CoreForm::Lambda, "lambda"),
        (CoreForm::If, "if"),
        (CoreForm::Begin, "begin"),
        (CoreForm::Quote, "quote"),
        (CoreForm::DefineSyntax, "define-syntax"),
        (CoreForm::LetSyntax, "let-syntax"),
        (CoreForm::LetrecSyntax, "letrec-syntax"),
        (CoreForm::ErMacroTransformer, "er-macro-transformer"),
    ];
}

pub enum HeapObject {
    Pair {
        car: Cell<Sexp>,
        cdr: Cell<Sexp>,
    },
    /// UTF-8 bytes followed by a NUL terminator.
    String(RefCell<Vec<u8>>),
    Bytes(RefCell<Vec<u8>>),
    Vector(RefCell<Vec<Sexp>>),
    Symbol(Box<str>),
    Flonum(f64),
    /// Never within fixnum range.
    Bignum(BigInt),
    Ratio {
        numerator: Sexp,
        denominator: Sexp,
    },
    Complex {
        real: Sexp,
        imag: Sexp,
    },
    Port(RefCell<Port>),
    Opcode(Opcode),
    Procedure {
        flags: u8,
        num_args: usize,
        bytecode: Sexp,
        vars: Sexp,
    },
    Bytecode {
        name: Sexp,
        literals: Sexp,
        code: Box<[u8]>,
    },
    Type(TypeInfo),
    Record {
        type_: Sexp,
        slots: RefCell<Vec<Sexp>>,
    },
    CPointer(CPointer),
    Exception(ExceptionData),
    Env {
        parent: Sexp,
        bindings: RefCell<FxHashMap<Sexp, Sexp>>,
    },
    Core {
        form: CoreForm,
        name: Sexp,
    },
    Macro {
        procedure: Sexp,
        env: Sexp,
        source: Sexp,
    },
    SynClo {
        env: Sexp,
        free_vars: Sexp,
        expr: Sexp,
    },
    Parameter {
        value: Cell<Sexp>,
        converter: Sexp,
    },
    Context(Box<Context>),
}

impl HeapObject {
    #[inline]
    pub fn tag(&self) -> HeapTag {
        match self {
            HeapObject::Pair { .. } => HeapTag::Pair,
            HeapObject::String(_) => HeapTag::String,
            HeapObject::Bytes(_) => HeapTag::Bytes,
            HeapObject::Vector(_) => HeapTag::Vector,
            HeapObject::Symbol(_) => HeapTag::Symbol,
            HeapObject::Flonum(_) => HeapTag::Flonum,
            HeapObject::Bignum(_) => HeapTag::Bignum,
            HeapObject::Ratio { .. } => HeapTag::Ratio,
            HeapObject::Complex { .. } => HeapTag::Complex,
            HeapObject::Port(_) => HeapTag::Port,
            HeapObject::Opcode(_) => HeapTag::Opcode,
            HeapObject::Procedure { .. } => HeapTag::Procedure,
            HeapObject::Bytecode { .. } => HeapTag::Bytecode,
            HeapObject::Type(_) => HeapTag::Type,
            HeapObject::Record { .. } => HeapTag::Record,
            HeapObject::CPointer(_) => HeapTag::CPointer,
            HeapObject::Exception(_) => HeapTag::Exception,
            HeapObject::Env { .. } => HeapTag::Env,
            HeapObject::Core { .. } => HeapTag::Core,
            HeapObject::Macro { .. } => HeapTag::Macro,
            HeapObject::SynClo { .. } => HeapTag::SynClo,
            HeapObject::Parameter { .. } => HeapTag::Parameter,
            HeapObject::Context(_) => HeapTag::Context,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.tag().type_name()
    }

    /// Push every handle this object references onto `out`.
    pub fn children(&self, out: &mut Vec<Sexp>) {
        match self {
            HeapObject::Pair { car, cdr } => {
                out.push(car.get());
                out.push(cdr.get());
            }
            HeapObject::Vector(items) => out.extend(items.borrow().iter().copied()),
            HeapObject::Ratio {
                numerator,
                denominator,
            } => out.extend([*numerator, *denominator]),
            HeapObject::Complex { real, imag } => out.extend([*real, *imag]),
            HeapObject::Opcode(op) => {
                out.push(op.name);
                match op.optional {
                    OptionalArg::Default(x) | OptionalArg::Param(x) => out.push(x),
                    OptionalArg::None => {}
                }
            }
            HeapObject::Procedure { bytecode, vars, .. } => out.extend([*bytecode, *vars]),
            HeapObject::Bytecode { name, literals, .. } => out.extend([*name, *literals]),
            HeapObject::Type(info) => {
                out.extend([info.name, info.parent, info.slots, info.finalizer])
            }
            HeapObject::Record { type_, slots } => {
                out.push(*type_);
                out.extend(slots.borrow().iter().copied());
            }
            HeapObject::CPointer(p) => out.push(p.parent),
            HeapObject::Exception(e) => {
                out.extend([e.kind, e.message, e.irritants, e.procedure, e.source])
            }
            HeapObject::Env { parent, bindings } => {
                out.push(*parent);
                for (k, v) in bindings.borrow().iter() {
                    out.push(*k);
                    out.push(*v);
                }
            }
            HeapObject::Core { name, .. } => out.push(*name),
            HeapObject::Macro {
                procedure,
                env,
                source,
            } => out.extend([*procedure, *env, *source]),
            HeapObject::SynClo {
                env,
                free_vars,
                expr,
            } => out.extend([*env, *free_vars, *expr]),
            HeapObject::Parameter { value, converter } => {
                out.extend([value.get(), *converter])
            }
            HeapObject::String(_)
            | HeapObject::Bytes(_)
            | HeapObject::Symbol(_)
            | HeapObject::Flonum(_)
            | HeapObject::Bignum(_)
            | HeapObject::Port(_)
            | HeapObject::Context(_) => {}
        }
    }

    /// Approximate number of bytes this object occupies, for GC accounting.
    pub fn footprint(&self) -> usize {
        let payload = match self {
            HeapObject::String(b) | HeapObject::Bytes(b) => b.borrow().capacity(),
            HeapObject::Vector(v) => v.borrow().capacity() * std::mem::size_of::<Sexp>(),
            HeapObject::Symbol(s) => s.len(),
            HeapObject::Bignum(n) => n.bits() as usize / 8,
            HeapObject::Bytecode { code, .. } => code.len(),
            HeapObject::Record { slots, .. } => {
                slots.borrow().capacity() * std::mem::size_of::<Sexp>()
            }
            HeapObject::Env { bindings, .. } => {
                bindings.borrow().capacity() * 2 * std::mem::size_of::<Sexp>()
            }
            _ => 0,
        };
        std::mem::size_of::<HeapCell>() + payload
    }
}

/// Arena slot. The alignment keeps the low three bits of every cell address
/// clear for tagging.
#[repr(align(8))]
pub struct HeapCell {
    pub marked: Cell<bool>,
    pub obj: HeapObject,
}

impl HeapCell {
    pub fn new(obj: HeapObject) -> Self {
        HeapCell {
            marked: Cell::new(false),
            obj,
        }
    }
}
