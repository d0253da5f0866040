//! Shared test helpers.
//!
//! Contexts are created through the exported C surface so the helpers
//! exercise the same path a generated binding would take.

use scheme_shim::chibi::shim::{
    sexp_context_env, sexp_destroy_context, sexp_load_standard_env, sexp_make_eval_context,
};
use scheme_shim::chibi::util::form_to_string;
use scheme_shim::chibi::{Context, Sexp};

/// Run `f` against a fresh context with the standard environment loaded.
pub fn with_ctx<R>(f: impl FnOnce(Sexp, &Context) -> R) -> R {
    let ctx = sexp_make_eval_context();
    let res = sexp_load_standard_env(ctx, sexp_context_env(ctx), Sexp::make_fixnum(7));
    assert!(!res.is_exception(), "standard env failed to load");
    // SAFETY: `ctx` is live until the destroy call below.
    let out = f(ctx, unsafe { Context::from_sexp(ctx) });
    unsafe { sexp_destroy_context(ctx) };
    out
}

#[allow(dead_code)]
pub fn fx(n: isize) -> Sexp {
    Sexp::make_fixnum(n)
}

/// Read `text` in `c` and panic on read errors.
#[allow(dead_code)]
pub fn read(c: &Context, text: &str) -> Sexp {
    let port = c.open_input_string(c.c_string(text));
    let obj = c.read(port);
    assert!(!obj.is_exception(), "read failed: {}", form_to_string(obj));
    obj
}
