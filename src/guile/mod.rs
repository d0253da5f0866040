//! Implicit-context backend.
//!
//! No operation here takes a context argument. Allocation goes through a
//! [`Guile`] instance, normally obtained with [`with_guile`].

pub mod convert;
pub mod runtime;
pub mod scm;
pub mod shim;

pub use runtime::{object_to_string, with_guile, Guile};
pub use scm::Scm;
pub use shim::wrapper_free;

use crate::model::{Backend, Export, ValueKind};

/// The implicit-context backend as seen by the value-model contract.
pub struct GuileBackend;

impl Backend for GuileBackend {
    type Handle = Scm;
    const NAME: &'static str = "guile";
    const REQUIRES_CONTEXT: bool = false;

    fn exports() -> &'static [Export] {
        crate::model::GUILE_EXPORTS
    }

    fn kind_of(obj: Scm) -> ValueKind {
        if obj.is_bool() {
            ValueKind::Boolean
        } else if obj.is_fixnum() {
            ValueKind::Fixnum
        } else if obj.is_char() {
            ValueKind::Character
        } else if obj.is_null() {
            ValueKind::Null
        } else if obj.is_eof() {
            ValueKind::Eof
        } else if obj.is_unspecified() || obj == Scm::UNDEFINED {
            ValueKind::Unspecified
        } else if obj.is_pair() {
            ValueKind::Pair
        } else if obj.is_string() {
            ValueKind::String
        } else if obj.is_symbol() {
            ValueKind::Symbol
        } else if obj.is_vector() {
            ValueKind::Vector
        } else if obj.is_bytevector() {
            ValueKind::Bytevector
        } else if obj.is_integer() {
            ValueKind::Bignum
        } else if obj.is_real() {
            match obj.number() {
                Some(crate::number::Number::Rational(..)) => ValueKind::Ratio,
                _ => ValueKind::Flonum,
            }
        } else if obj.is_number() {
            ValueKind::Complex
        } else {
            ValueKind::Unknown
        }
    }
}
