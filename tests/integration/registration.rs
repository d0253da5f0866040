// Foreign procedures and types registered through the C surface.

use std::ffi::CString;
use std::mem;

use crate::common::{fx, with_ctx};
use scheme_shim::chibi::env::parameter_set;
use scheme_shim::chibi::foreign::SexpProc3;
use scheme_shim::chibi::shim::*;
use scheme_shim::chibi::types::type_num_slots;
use scheme_shim::chibi::{Sexp, SexpProc1, SexpSint};

extern "C" fn add2(_ctx: Sexp, _op: Sexp, _n: SexpSint, a: Sexp, b: Sexp) -> Sexp {
    Sexp::make_fixnum(a.unbox_fixnum() + b.unbox_fixnum())
}

fn add2_proc() -> SexpProc1 {
    unsafe { mem::transmute::<SexpProc3, SexpProc1>(add2) }
}

#[test]
fn test_optional_argument_uses_default() {
    with_ctx(|ctx, c| {
        let env = sexp_context_env(ctx);
        let name = CString::new("add-ten").unwrap();
        let op = unsafe { sexp_define_foreign_opt(ctx, env, name.as_ptr(), 2, Some(add2_proc()), fx(10)) };
        assert!(sexp_opcodep(op));
        assert_eq!(c.env_ref(env, c.intern("add-ten"), Sexp::FALSE), op);
        assert_eq!(sexp_apply(ctx, op, sexp_list1(ctx, fx(5))), fx(15));
        let both = c.list(&[fx(5), fx(1)]);
        assert_eq!(sexp_apply(ctx, op, both), fx(6));
        assert!(sexp_exceptionp(sexp_apply(ctx, op, Sexp::NULL)));
    });
}

#[test]
fn test_optional_argument_reads_parameter() {
    with_ctx(|ctx, c| {
        let env = sexp_context_env(ctx);
        let param = c.make_parameter(fx(100), Sexp::FALSE);
        c.env_define(env, c.intern("base"), param);
        let name = CString::new("add-base").unwrap();
        let pname = CString::new("base").unwrap();
        let op = unsafe {
            sexp_define_foreign_param(ctx, env, name.as_ptr(), 2, Some(add2_proc()), pname.as_ptr())
        };
        assert_eq!(sexp_apply(ctx, op, sexp_list1(ctx, fx(1))), fx(101));
        assert!(parameter_set(param, fx(5)));
        assert_eq!(sexp_apply(ctx, op, sexp_list1(ctx, fx(1))), fx(6));

        let missing = CString::new("no-such-param").unwrap();
        let bad = unsafe {
            sexp_define_foreign_param(ctx, env, name.as_ptr(), 2, Some(add2_proc()), missing.as_ptr())
        };
        assert!(sexp_opcodep(bad));
        assert_eq!(sexp_apply(ctx, bad, c.list(&[fx(1), fx(2)])), fx(3));
    });
}

#[test]
fn test_builtins_apply_through_environment() {
    with_ctx(|ctx, c| {
        let env = sexp_context_env(ctx);
        let reverse = c.env_ref(env, c.intern("reverse"), Sexp::FALSE);
        assert!(sexp_applicablep(reverse));
        let ls = c.list(&[fx(1), fx(2)]);
        let res = sexp_apply(ctx, reverse, sexp_list1(ctx, ls));
        assert_eq!(sexp_equalp(ctx, res, c.list(&[fx(2), fx(1)])), Sexp::TRUE);

        let to_number = c.env_ref(env, c.intern("string->number"), Sexp::FALSE);
        let n = sexp_apply(ctx, to_number, sexp_list1(ctx, c.c_string("17")));
        assert_eq!(n, fx(17));
    });
}

#[test]
fn test_simple_type_inherits_slots() {
    with_ctx(|ctx, c| {
        let point = sexp_register_simple_type(
            ctx,
            c.c_string("point"),
            Sexp::FALSE,
            c.list(&[c.intern("x"), c.intern("y")]),
        );
        assert!(sexp_typep(point));
        let point3 = sexp_register_simple_type(ctx, c.c_string("point3"), point, c.list(&[c.intern("z")]));
        assert_eq!(type_num_slots(point3), Some(3));

        let p = c.make_record(point3);
        assert_eq!(c.slot_set(p, fx(2), fx(9)), Sexp::VOID);
        assert_eq!(c.slot_ref(p, fx(2)), fx(9));
        assert!(sexp_exceptionp(c.slot_ref(p, fx(3))));

        let bad = sexp_register_simple_type(ctx, c.intern("oops"), Sexp::FALSE, Sexp::NULL);
        assert!(sexp_opcodep(bad));
        assert_eq!(sexp_apply(ctx, bad, c.list(&[fx(1), fx(2)])), fx(3));
    });
}

#[test]
fn test_applying_a_non_procedure_is_an_exception() {
    with_ctx(|ctx, _| {
        let res = sexp_apply(ctx, fx(3), Sexp::NULL);
        assert!(sexp_exceptionp(res));
    });
}
