// End-to-end use of the context-threaded surface through its C names.

use std::ffi::{CStr, CString};

use crate::common::{fx, read, with_ctx};
use scheme_shim::chibi::shim::*;
use scheme_shim::chibi::env::parameter_set;
use scheme_shim::chibi::util::form_to_string;
use scheme_shim::chibi::Sexp;

#[test]
fn test_vector_of_three_fixnums() {
    with_ctx(|ctx, _| {
        let v = sexp_make_vector(ctx, fx(3), Sexp::FALSE);
        for (i, n) in [1, 2, 3].into_iter().enumerate() {
            assert_eq!(sexp_vector_set(v, fx(i as isize), fx(n)), Sexp::VOID);
        }
        assert_eq!(sexp_vector_length(v), 3);
        let items: Vec<isize> = (0..3)
            .map(|i| sexp_unbox_fixnum(sexp_vector_ref(v, fx(i))))
            .collect();
        assert_eq!(items, vec![1, 2, 3]);
        assert!(sexp_vectorp(v));
        assert!(!sexp_pairp(v));
    });
}

#[test]
fn test_output_string_port_accumulates() {
    with_ctx(|ctx, _| {
        let out = sexp_open_output_string(ctx);
        let text = CString::new("ok").unwrap();
        unsafe { sexp_write_string(ctx, text.as_ptr(), out) };
        sexp_newline(ctx, out);
        let s = sexp_get_output_string(ctx, out);
        assert!(sexp_stringp(s));
        let data = unsafe { CStr::from_ptr(sexp_string_data(s)) };
        assert_eq!(data.to_str().unwrap(), "ok\n");
    });
}

#[test]
fn test_parse_number_in_radix_ten() {
    with_ctx(|ctx, c| {
        let n = sexp_string_to_number(ctx, c.c_string("42"), fx(10));
        assert!(sexp_integerp(n));
        assert_eq!(sexp_unbox_fixnum(n), 42);
        let hex = sexp_string_to_number(ctx, c.c_string("ff"), fx(16));
        assert_eq!(sexp_unbox_fixnum(hex), 255);
        assert_eq!(sexp_string_to_number(ctx, c.c_string("forty"), fx(10)), Sexp::FALSE);
    });
}

#[test]
fn test_write_then_read_back() {
    with_ctx(|ctx, c| {
        let datum = read(c, "(define (f x) #(1 2) \"s\")");
        let out = sexp_open_output_string(ctx);
        assert_eq!(sexp_write(ctx, datum, out), Sexp::VOID);
        let text = sexp_get_output_string(ctx, out);
        let port = sexp_open_input_string(ctx, text);
        let again = sexp_read(ctx, port);
        assert_eq!(sexp_equalp(ctx, datum, again), Sexp::TRUE);
        assert!(sexp_read(ctx, port).is_eof());
    });
}

#[test]
fn test_pair_and_list_laws() {
    with_ctx(|ctx, c| {
        let p = sexp_cons(ctx, fx(1), fx(2));
        assert_eq!(sexp_car(p), fx(1));
        assert_eq!(sexp_cdr(p), fx(2));
        for n in [0, 1, 5] {
            let items: Vec<Sexp> = (0..n).map(fx).collect();
            let ls = c.list(&items);
            assert_eq!(sexp_length(ctx, ls), fx(n));
            let back = sexp_reverse(ctx, sexp_reverse(ctx, ls));
            assert_eq!(sexp_equalp(ctx, back, ls), Sexp::TRUE);
        }
        let a = sexp_cons(ctx, fx(1), fx(2));
        let b = sexp_cons(ctx, fx(1), fx(2));
        assert_ne!(a, b);
        assert_eq!(sexp_equalp(ctx, a, b), Sexp::TRUE);
    });
}

#[test]
fn test_filled_sequences_read_back_fill() {
    with_ctx(|ctx, _| {
        let len = 4;
        let s = sexp_make_string(ctx, fx(len), sexp_make_character('λ' as u32));
        let bv = sexp_make_bytes(ctx, fx(len), fx(7));
        let v = sexp_make_vector(ctx, fx(len), Sexp::TRUE);
        for i in 0..len {
            assert_eq!(sexp_string_ref(ctx, s, fx(i)), sexp_make_character('λ' as u32));
            assert_eq!(sexp_bytes_ref(bv, fx(i)), fx(7));
            assert_eq!(sexp_vector_ref(v, fx(i)), Sexp::TRUE);
        }
        assert_eq!(sexp_string_set(ctx, s, fx(2), sexp_make_character('a' as u32)), Sexp::VOID);
        assert_eq!(sexp_string_ref(ctx, s, fx(2)), sexp_make_character('a' as u32));
        sexp_bytes_set(bv, fx(1), fx(200));
        assert_eq!(sexp_bytes_ref(bv, fx(1)), fx(200));
        assert_eq!(sexp_string_length(s), 4);
        assert_eq!(sexp_string_size(s), 3 * 2 + 1);
        assert!(sexp_exceptionp(sexp_string_ref(ctx, s, fx(len))));
    });
}

#[test]
fn test_string_cursors_walk_utf8() {
    with_ctx(|ctx, c| {
        let s = c.c_string("aλb");
        let start = sexp_make_string_cursor(0);
        let second = sexp_string_cursor_next(s, start);
        assert_eq!(sexp_unbox_string_cursor(second), 1);
        let third = sexp_string_cursor_next(s, second);
        assert_eq!(sexp_unbox_string_cursor(third), 3);
        assert_eq!(sexp_string_cursor_prev(s, third), second);
        assert_eq!(sexp_string_cursor_ref(ctx, s, second), sexp_make_character('λ' as u32));
        let tail = sexp_substring_cursor(ctx, s, second, Sexp::FALSE);
        assert_eq!(form_to_string(tail), "\"λb\"");
    });
}

#[test]
fn test_exceptions_print_to_ports() {
    with_ctx(|ctx, c| {
        let exn = c.user_exception(Sexp::FALSE, "bad thing", c.list(&[fx(1), c.intern("x")]));
        let out = sexp_open_output_string(ctx);
        sexp_print_exception(ctx, exn, out);
        let text = sexp_get_output_string(ctx, out);
        let data = unsafe { CStr::from_ptr(sexp_string_data(text)) };
        assert_eq!(data.to_str().unwrap(), "ERROR: bad thing: 1 x\n");
    });
}

#[test]
fn test_exact_prefix_parses_to_ratio() {
    with_ctx(|ctx, c| {
        let q = sexp_string_to_number(ctx, c.c_string("#e1.5"), fx(10));
        assert!(q.is_ratio());
        assert_eq!(sexp_ratio_numerator(q), fx(3));
        assert_eq!(sexp_ratio_denominator(q), fx(2));
        let big = sexp_string_to_number(ctx, c.c_string("#e1e40"), fx(10));
        assert!(sexp_bignump(big));
        assert!(!sexp_flonump(big));
    });
}

#[test]
fn test_debug_writes_to_current_error_port() {
    with_ctx(|ctx, c| {
        let param = c.env_ref(sexp_context_env(ctx), c.intern("current-error-port"), Sexp::FALSE);
        let err = sexp_open_output_string(ctx);
        assert!(parameter_set(param, err));

        let msg = CString::new("state: ").unwrap();
        let obj = read(c, "(1 \"two\" #\\3)");
        assert_eq!(unsafe { sexp_debug(ctx, msg.as_ptr(), obj) }, 0);
        let text = sexp_get_output_string(ctx, err);
        let data = unsafe { CStr::from_ptr(sexp_string_data(text)) };
        assert_eq!(data.to_str().unwrap(), "state: (1 \"two\" #\\3)\n");
    });
}
