//! # scheme-shim
//!
//! Function-form access to the macro-only parts of two Scheme embedding
//! APIs. Many of their operations (type predicates, accessors, boxing)
//! exist only as preprocessor macros, which a binding generator cannot
//! see. This crate exports each one as a real C function and carries the
//! value model those functions operate on.
//!
//! ## Backends
//!
//! - [`chibi`] threads an explicit context handle through every
//!   allocating call. Its [`chibi::shim`] module holds the exports.
//! - [`guile`] keeps its instance implicit. Allocation happens inside
//!   [`guile::with_guile`], and [`guile::shim`] holds the exports.
//!
//! Both implement [`model::Backend`], which classifies handles into a
//! shared [`model::ValueKind`] and lists the exports for header
//! generation.
//!
//! ```
//! use scheme_shim::chibi::{ChibiContext, Sexp};
//!
//! let ctx = ChibiContext::new().unwrap();
//! let list = ctx.read_str("(1 2 3)").unwrap();
//! let c = ctx.context();
//! assert_eq!(c.length(list), Sexp::make_fixnum(3));
//! ```

pub mod chibi;
pub mod error;
pub mod guile;
pub mod model;
pub mod number;
pub mod reader;

pub use error::{Result, ShimError};
pub use model::{Backend, Export, ValueKind};
