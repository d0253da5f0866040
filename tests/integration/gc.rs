// Collection, rooting and finalization.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::common::{fx, with_ctx};
use scheme_shim::chibi::shim::{sexp_gc, sexp_preserve_object, sexp_release_object};
use scheme_shim::chibi::strings::{vector_length, vector_ref};
use scheme_shim::chibi::types::type_id;
use scheme_shim::chibi::{ChibiContext, ForeignFn, Sexp, SexpSint};

fn collect(ctx: Sexp) -> usize {
    let mut freed = 0;
    unsafe { sexp_gc(ctx, &mut freed) };
    freed
}

#[test]
fn test_rooted_value_survives_collection() {
    let ctx = ChibiContext::new().unwrap();
    let list = ctx.read_str("(1 2 3)").unwrap();
    let var = ctx.make_var(list);
    collect(ctx.c);
    let c = ctx.context();
    assert_eq!(c.length(var.get()), fx(3));

    drop(var);
    assert!(collect(ctx.c) > 0);
    assert_eq!(collect(ctx.c), 0);
}

#[test]
fn test_var_set_moves_the_root() {
    let ctx = ChibiContext::new().unwrap();
    let c = ctx.context();
    let old = c.make_vector(4, fx(0));
    let mut var = ctx.make_var(old);
    collect(ctx.c);
    let live = c.heap_len();

    let new = c.make_vector(2, fx(7));
    var.set(new);
    assert!(collect(ctx.c) > 0);
    assert_eq!(c.heap_len(), live);
    assert_eq!(var.get(), new);
    assert_eq!(vector_length(var.get()), 2);
    assert_eq!(vector_ref(var.get(), fx(1)), fx(7));
}

#[test]
fn test_preserved_objects_are_roots() {
    with_ctx(|ctx, c| {
        let v = c.make_vector(8, fx(1));
        sexp_preserve_object(ctx, v);
        collect(ctx);
        let live = c.heap_len();
        assert_eq!(collect(ctx), 0);
        assert_eq!(c.heap_len(), live);
        sexp_release_object(ctx, v);
        assert!(collect(ctx) > 0);
        assert_eq!(c.heap_len(), live - 1);
    });
}

static FINALIZED: AtomicUsize = AtomicUsize::new(0);

extern "C" fn count_finalize(_ctx: Sexp, _op: Sexp, _n: SexpSint, _obj: Sexp) -> Sexp {
    FINALIZED.fetch_add(1, Ordering::SeqCst);
    Sexp::VOID
}

#[test]
fn test_finalizer_runs_once_per_foreign_pointer() {
    with_ctx(|ctx, c| {
        let fin = c.define_foreign(c.env(), "release-handle", ForeignFn::A1(count_finalize));
        let t = c.register_c_type(c.c_string("handle"), fin);
        assert!(t.is_type());
        let id = type_id(t).unwrap();
        let block = unsafe { libc::malloc(16) };
        c.make_cpointer(id, block, Sexp::FALSE, true);

        collect(ctx);
        assert_eq!(FINALIZED.load(Ordering::SeqCst), 1);
        collect(ctx);
        assert_eq!(FINALIZED.load(Ordering::SeqCst), 1);
    });
}
