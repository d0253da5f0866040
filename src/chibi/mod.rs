//! Context-threaded backend.
//!
//! Every allocating operation takes the context handle first. The runtime
//! modules implement the value model; [`shim`] exposes it as C functions and
//! [`util`] wraps it for Rust hosts.

pub mod builtins;
pub mod code;
pub mod context;
pub mod env;
pub mod exception;
pub mod foreign;
pub mod gc;
pub mod heap;
pub mod lists;
pub mod numeric;
pub mod port;
pub mod sexp;
pub mod shim;
pub mod strings;
pub mod types;
pub mod util;
pub mod writer;

pub use context::{destroy_context, scheme_init, Context, ContextConfig};
pub use exception::Condition;
pub use foreign::{ForeignFn, SexpProc1};
pub use sexp::{Sexp, SexpSint, SexpUint, SEXP_MAX_FIXNUM, SEXP_MIN_FIXNUM};
pub use util::{wrap_result, write_sexp, ChibiContext, ChibiVar};

use crate::model::{Backend, Export, ValueKind};

/// The context-threaded backend as seen by the value-model contract.
pub struct Chibi;

impl Backend for Chibi {
    type Handle = Sexp;
    const NAME: &'static str = "chibi";
    const REQUIRES_CONTEXT: bool = true;

    fn exports() -> &'static [Export] {
        crate::model::CHIBI_EXPORTS
    }

    fn kind_of(obj: Sexp) -> ValueKind {
        if obj.is_boolean() {
            ValueKind::Boolean
        } else if obj.is_fixnum() {
            ValueKind::Fixnum
        } else if obj.is_char() {
            ValueKind::Character
        } else if obj.is_string_cursor() {
            ValueKind::StringCursor
        } else if obj.is_null() {
            ValueKind::Null
        } else if obj.is_eof() {
            ValueKind::Eof
        } else if obj.is_void() || obj == Sexp::UNDEF {
            ValueKind::Unspecified
        } else if obj.is_flonum() {
            ValueKind::Flonum
        } else if obj.is_bignum() {
            ValueKind::Bignum
        } else if obj.is_ratio() {
            ValueKind::Ratio
        } else if obj.is_complex() {
            ValueKind::Complex
        } else if obj.is_string() {
            ValueKind::String
        } else if obj.is_bytes() {
            ValueKind::Bytevector
        } else if obj.is_symbol() {
            ValueKind::Symbol
        } else if obj.is_pair() {
            ValueKind::Pair
        } else if obj.is_vector() {
            ValueKind::Vector
        } else if obj.is_iport() {
            ValueKind::InputPort
        } else if obj.is_oport() {
            ValueKind::OutputPort
        } else if obj.is_procedure() {
            ValueKind::Procedure
        } else if obj.is_opcode() {
            ValueKind::Opcode
        } else if obj.is_type() {
            ValueKind::Type
        } else if obj.is_record() {
            ValueKind::Record
        } else if obj.is_exception() {
            ValueKind::Exception
        } else if obj.is_context() {
            ValueKind::Context
        } else if obj.is_env() {
            ValueKind::Environment
        } else if obj.is_core() {
            ValueKind::CoreForm
        } else if obj.is_macro() {
            ValueKind::Macro
        } else if obj.is_synclo() {
            ValueKind::SyntacticClosure
        } else if obj.is_bytecode() {
            ValueKind::Bytecode
        } else if obj.is_cpointer() {
            ValueKind::ForeignPointer
        } else if obj.is_parameter() {
            ValueKind::Parameter
        } else {
            ValueKind::Unknown
        }
    }
}
