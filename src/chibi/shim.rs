//! C-callable surface of the context-threaded backend.
//!
//! One exported function per embedding operation, each forwarding to a
//! single runtime operation and returning its result unchanged. Handles
//! passed in must be live: a `ctx` argument must come from
//! `sexp_make_eval_context` and not yet be destroyed.

use std::ffi::{c_char, c_int, CStr};

use super::context::{destroy_context, scheme_init, Context, ContextConfig};
use super::exception::Condition;
use super::foreign::{foreign_arity, ForeignFn, SexpProc1};
use super::numeric;
use super::sexp::{Sexp, SexpSint, SexpUint};
use super::strings;

fn context<'a>(ctx: Sexp) -> &'a Context {
    // SAFETY: callers pass a live context handle; `from_sexp` traps otherwise.
    unsafe { Context::from_sexp(ctx) }
}

/// Borrow a NUL-terminated UTF-8 argument.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated buffer.
unsafe fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

fn length_arg(len: Sexp) -> Option<usize> {
    if len.is_fixnum() {
        usize::try_from(len.unbox_fixnum()).ok()
    } else {
        None
    }
}

// =============================================================================
// Type predicates
// =============================================================================

macro_rules! sexp_predicate {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            #[no_mangle]
            pub extern "C" fn $name(obj: Sexp) -> bool {
                obj.$method()
            }
        )*
    };
}

sexp_predicate! {
    sexp_booleanp => is_boolean,
    sexp_fixnump => is_fixnum,
    sexp_flonump => is_flonum,
    sexp_bignump => is_bignum,
    sexp_integerp => is_integer,
    sexp_numberp => is_number,
    sexp_charp => is_char,
    sexp_stringp => is_string,
    sexp_string_cursorp => is_string_cursor,
    sexp_bytesp => is_bytes,
    sexp_symbolp => is_symbol,
    sexp_nullp => is_null,
    sexp_pairp => is_pair,
    sexp_vectorp => is_vector,
    sexp_iportp => is_iport,
    sexp_oportp => is_oport,
    sexp_portp => is_port,
    sexp_procedurep => is_procedure,
    sexp_opcodep => is_opcode,
    sexp_applicablep => is_applicable,
    sexp_typep => is_type,
    sexp_exceptionp => is_exception,
    sexp_contextp => is_context,
    sexp_envp => is_env,
    sexp_corep => is_core,
    sexp_macrop => is_macro,
    sexp_synclop => is_synclo,
    sexp_bytecodep => is_bytecode,
    sexp_cpointerp => is_cpointer,
}

// =============================================================================
// Strings
// =============================================================================

#[no_mangle]
pub extern "C" fn sexp_string_data(x: Sexp) -> *mut c_char {
    strings::string_data(x)
}

#[no_mangle]
pub extern "C" fn sexp_string_size(x: Sexp) -> SexpUint {
    strings::string_size(x)
}

#[no_mangle]
pub extern "C" fn sexp_string_length(x: Sexp) -> SexpUint {
    strings::string_length(x)
}

#[no_mangle]
pub extern "C" fn sexp_string_ref(ctx: Sexp, s: Sexp, i: Sexp) -> Sexp {
    context(ctx).string_ref(s, i)
}

#[no_mangle]
pub extern "C" fn sexp_string_set(ctx: Sexp, s: Sexp, i: Sexp, ch: Sexp) -> Sexp {
    context(ctx).string_set(s, i, ch)
}

#[no_mangle]
pub extern "C" fn sexp_string_cursor_ref(ctx: Sexp, s: Sexp, i: Sexp) -> Sexp {
    context(ctx).string_cursor_ref(s, i)
}

#[no_mangle]
pub extern "C" fn sexp_string_cursor_set(ctx: Sexp, s: Sexp, i: Sexp, ch: Sexp) -> Sexp {
    context(ctx).string_cursor_set(s, i, ch)
}

#[no_mangle]
pub extern "C" fn sexp_string_cursor_next(s: Sexp, i: Sexp) -> Sexp {
    strings::string_cursor_next(s, i)
}

#[no_mangle]
pub extern "C" fn sexp_string_cursor_prev(s: Sexp, i: Sexp) -> Sexp {
    strings::string_cursor_prev(s, i)
}

#[no_mangle]
pub extern "C" fn sexp_substring(ctx: Sexp, s: Sexp, i: Sexp, j: Sexp) -> Sexp {
    context(ctx).substring(s, i, j)
}

#[no_mangle]
pub extern "C" fn sexp_substring_cursor(ctx: Sexp, s: Sexp, i: Sexp, j: Sexp) -> Sexp {
    context(ctx).substring_cursor(s, i, j)
}

// =============================================================================
// Immediates
// =============================================================================

#[no_mangle]
pub extern "C" fn sexp_make_boolean(n: bool) -> Sexp {
    Sexp::make_boolean(n)
}

#[no_mangle]
pub extern "C" fn sexp_unbox_boolean(obj: Sexp) -> bool {
    obj.unbox_boolean()
}

#[no_mangle]
pub extern "C" fn sexp_make_fixnum(n: SexpSint) -> Sexp {
    Sexp::make_fixnum(n)
}

#[no_mangle]
pub extern "C" fn sexp_unbox_fixnum(obj: Sexp) -> SexpSint {
    obj.unbox_fixnum()
}

#[no_mangle]
pub extern "C" fn sexp_make_character(n: u32) -> Sexp {
    Sexp::make_character(n)
}

#[no_mangle]
pub extern "C" fn sexp_unbox_character(obj: Sexp) -> u32 {
    obj.unbox_character()
}

#[no_mangle]
pub extern "C" fn sexp_make_string_cursor(n: c_int) -> Sexp {
    Sexp::make_string_cursor(n as SexpSint)
}

#[no_mangle]
pub extern "C" fn sexp_unbox_string_cursor(obj: Sexp) -> c_int {
    obj.unbox_string_cursor() as c_int
}

// =============================================================================
// Pairs, numbers, bytevectors, vectors
// =============================================================================

#[no_mangle]
pub extern "C" fn sexp_car(pair: Sexp) -> Sexp {
    pair.car()
}

#[no_mangle]
pub extern "C" fn sexp_cdr(pair: Sexp) -> Sexp {
    pair.cdr()
}

#[no_mangle]
pub extern "C" fn sexp_ratio_numerator(q: Sexp) -> Sexp {
    numeric::ratio_numerator(q)
}

#[no_mangle]
pub extern "C" fn sexp_ratio_denominator(q: Sexp) -> Sexp {
    numeric::ratio_denominator(q)
}

#[no_mangle]
pub extern "C" fn sexp_complex_real(z: Sexp) -> Sexp {
    numeric::complex_real(z)
}

#[no_mangle]
pub extern "C" fn sexp_complex_imag(z: Sexp) -> Sexp {
    numeric::complex_imag(z)
}

#[no_mangle]
pub extern "C" fn sexp_bytes_length(bv: Sexp) -> SexpUint {
    strings::bytes_length(bv)
}

#[no_mangle]
pub extern "C" fn sexp_bytes_data(bv: Sexp) -> *mut c_char {
    strings::bytes_data(bv)
}

#[no_mangle]
pub extern "C" fn sexp_bytes_ref(bv: Sexp, i: Sexp) -> Sexp {
    strings::bytes_ref(bv, i)
}

#[no_mangle]
pub extern "C" fn sexp_bytes_set(bv: Sexp, i: Sexp, obj: Sexp) -> Sexp {
    strings::bytes_set(bv, i, obj)
}

#[no_mangle]
pub extern "C" fn sexp_vector_length(vec: Sexp) -> SexpUint {
    strings::vector_length(vec)
}

#[no_mangle]
pub extern "C" fn sexp_vector_ref(vec: Sexp, i: Sexp) -> Sexp {
    strings::vector_ref(vec, i)
}

#[no_mangle]
pub extern "C" fn sexp_vector_set(vec: Sexp, i: Sexp, obj: Sexp) -> Sexp {
    strings::vector_set(vec, i, obj)
}

// =============================================================================
// Constructors
// =============================================================================

#[no_mangle]
pub extern "C" fn sexp_cons(ctx: Sexp, obj1: Sexp, obj2: Sexp) -> Sexp {
    context(ctx).cons(obj1, obj2)
}

#[no_mangle]
pub extern "C" fn sexp_list1(ctx: Sexp, obj: Sexp) -> Sexp {
    context(ctx).list1(obj)
}

#[no_mangle]
pub extern "C" fn sexp_make_string(ctx: Sexp, len: Sexp, ch: Sexp) -> Sexp {
    let c = context(ctx);
    let Some(len) = length_arg(len) else {
        return c.type_exception(Sexp::FALSE, "non-negative fixnum", len);
    };
    match ch.as_char() {
        Some(fill) => c.make_string(len, fill),
        None => c.type_exception(Sexp::FALSE, "char", ch),
    }
}

#[no_mangle]
pub extern "C" fn sexp_make_bytes(ctx: Sexp, len: Sexp, i: Sexp) -> Sexp {
    let c = context(ctx);
    let Some(len) = length_arg(len) else {
        return c.type_exception(Sexp::FALSE, "non-negative fixnum", len);
    };
    let fill = if i.is_fixnum() {
        u8::try_from(i.unbox_fixnum()).ok()
    } else {
        None
    };
    match fill {
        Some(fill) => c.make_bytes(len, fill),
        None => c.type_exception(Sexp::FALSE, "byte", i),
    }
}

#[no_mangle]
pub extern "C" fn sexp_make_vector(ctx: Sexp, len: Sexp, obj: Sexp) -> Sexp {
    let c = context(ctx);
    match length_arg(len) {
        Some(len) => c.make_vector(len, obj),
        None => c.type_exception(Sexp::FALSE, "non-negative fixnum", len),
    }
}

// =============================================================================
// Ports and I/O
// =============================================================================

#[no_mangle]
pub extern "C" fn sexp_read(ctx: Sexp, r#in: Sexp) -> Sexp {
    context(ctx).read(r#in)
}

#[no_mangle]
pub extern "C" fn sexp_write(ctx: Sexp, obj: Sexp, out: Sexp) -> Sexp {
    context(ctx).write(obj, out)
}

/// # Safety
/// `str` must be null or a NUL-terminated UTF-8 buffer.
#[no_mangle]
pub unsafe extern "C" fn sexp_write_string(ctx: Sexp, str: *const c_char, out: Sexp) -> c_int {
    match c_str(str) {
        Some(text) => context(ctx).write_string(text, out),
        None => -1,
    }
}

#[no_mangle]
pub extern "C" fn sexp_newline(ctx: Sexp, out: Sexp) -> c_int {
    context(ctx).newline(out)
}

#[no_mangle]
pub extern "C" fn sexp_print_exception(ctx: Sexp, exn: Sexp, out: Sexp) -> Sexp {
    context(ctx).print_exception(exn, out)
}

#[no_mangle]
pub extern "C" fn sexp_current_input_port(ctx: Sexp) -> Sexp {
    context(ctx).current_input_port()
}

#[no_mangle]
pub extern "C" fn sexp_current_output_port(ctx: Sexp) -> Sexp {
    context(ctx).current_output_port()
}

#[no_mangle]
pub extern "C" fn sexp_current_error_port(ctx: Sexp) -> Sexp {
    context(ctx).current_error_port()
}

/// # Safety
/// `msg` must be null or a NUL-terminated UTF-8 buffer.
#[no_mangle]
pub unsafe extern "C" fn sexp_debug(ctx: Sexp, msg: *const c_char, obj: Sexp) -> c_int {
    context(ctx).debug(c_str(msg).unwrap_or(""), obj)
}

#[no_mangle]
pub extern "C" fn sexp_open_input_string(ctx: Sexp, str: Sexp) -> Sexp {
    context(ctx).open_input_string(str)
}

#[no_mangle]
pub extern "C" fn sexp_open_output_string(ctx: Sexp) -> Sexp {
    context(ctx).open_output_string()
}

#[no_mangle]
pub extern "C" fn sexp_get_output_string(ctx: Sexp, port: Sexp) -> Sexp {
    context(ctx).get_output_string(port)
}

// =============================================================================
// Sequences and equality
// =============================================================================

#[no_mangle]
pub extern "C" fn sexp_equalp(ctx: Sexp, x: Sexp, y: Sexp) -> Sexp {
    context(ctx).equalp(x, y)
}

#[no_mangle]
pub extern "C" fn sexp_length(ctx: Sexp, ls: Sexp) -> Sexp {
    context(ctx).length(ls)
}

#[no_mangle]
pub extern "C" fn sexp_listp(ctx: Sexp, x: Sexp) -> Sexp {
    context(ctx).listp(x)
}

#[no_mangle]
pub extern "C" fn sexp_memq(ctx: Sexp, x: Sexp, ls: Sexp) -> Sexp {
    context(ctx).memq(x, ls)
}

#[no_mangle]
pub extern "C" fn sexp_assq(ctx: Sexp, x: Sexp, ls: Sexp) -> Sexp {
    context(ctx).assq(x, ls)
}

#[no_mangle]
pub extern "C" fn sexp_reverse(ctx: Sexp, ls: Sexp) -> Sexp {
    context(ctx).reverse(ls)
}

#[no_mangle]
pub extern "C" fn sexp_nreverse(ctx: Sexp, ls: Sexp) -> Sexp {
    context(ctx).nreverse(ls)
}

#[no_mangle]
pub extern "C" fn sexp_append2(ctx: Sexp, a: Sexp, b: Sexp) -> Sexp {
    context(ctx).append2(a, b)
}

#[no_mangle]
pub extern "C" fn sexp_copy_list(ctx: Sexp, ls: Sexp) -> Sexp {
    context(ctx).copy_list(ls)
}

#[no_mangle]
pub extern "C" fn sexp_list_to_vector(ctx: Sexp, ls: Sexp) -> Sexp {
    context(ctx).list_to_vector(ls)
}

#[no_mangle]
pub extern "C" fn sexp_symbol_to_string(ctx: Sexp, sym: Sexp) -> Sexp {
    context(ctx).symbol_to_string(sym)
}

#[no_mangle]
pub extern "C" fn sexp_string_to_symbol(ctx: Sexp, str: Sexp) -> Sexp {
    context(ctx).string_to_symbol(str)
}

#[no_mangle]
pub extern "C" fn sexp_string_to_number(ctx: Sexp, str: Sexp, b: Sexp) -> Sexp {
    context(ctx).string_to_number(str, b)
}

// =============================================================================
// Extension registration
// =============================================================================

/// Validate the pieces every `sexp_define_foreign*` variant shares.
///
/// # Safety
/// `name` must be null or NUL-terminated; `func` must take `num_args`
/// arguments after the leading three.
unsafe fn foreign_parts<'a>(
    c: &Context,
    name: *const c_char,
    num_args: c_int,
    func: Option<SexpProc1>,
) -> Result<(&'a str, ForeignFn), Sexp> {
    let name = c_str(name).ok_or_else(|| c.raise(Condition::user("foreign name must be a UTF-8 C string")))?;
    let func = func.ok_or_else(|| c.raise(Condition::user("null foreign function")))?;
    foreign_arity(num_args)
        .and_then(|n| ForeignFn::from_proc1(func, n))
        .map(|f| (name, f))
        .ok_or_else(|| {
            c.raise(
                Condition::new("arity", "foreign functions take at most six arguments")
                    .irritant(Sexp::make_fixnum(num_args as SexpSint)),
            )
        })
}

/// # Safety
/// `name` must be null or NUL-terminated; `func` must take `num_args`
/// arguments after the leading three.
#[no_mangle]
pub unsafe extern "C" fn sexp_define_foreign(
    ctx: Sexp,
    env: Sexp,
    name: *const c_char,
    num_args: c_int,
    func: Option<SexpProc1>,
) -> Sexp {
    let c = context(ctx);
    match foreign_parts(c, name, num_args, func) {
        Ok((name, func)) => c.define_foreign(env, name, func),
        Err(exn) => exn,
    }
}

/// # Safety
/// As for [`sexp_define_foreign`].
#[no_mangle]
pub unsafe extern "C" fn sexp_define_foreign_opt(
    ctx: Sexp,
    env: Sexp,
    name: *const c_char,
    num_args: c_int,
    func: Option<SexpProc1>,
    dflt: Sexp,
) -> Sexp {
    let c = context(ctx);
    match foreign_parts(c, name, num_args, func) {
        Ok((name, func)) => c.define_foreign_opt(env, name, func, dflt),
        Err(exn) => exn,
    }
}

/// # Safety
/// As for [`sexp_define_foreign`]; `param` must also be null or
/// NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn sexp_define_foreign_param(
    ctx: Sexp,
    env: Sexp,
    name: *const c_char,
    num_args: c_int,
    func: Option<SexpProc1>,
    param: *const c_char,
) -> Sexp {
    let c = context(ctx);
    let Some(param) = c_str(param) else {
        return c.raise(Condition::user("parameter name must be a UTF-8 C string"));
    };
    match foreign_parts(c, name, num_args, func) {
        Ok((name, func)) => c.define_foreign_param(env, name, func, param),
        Err(exn) => exn,
    }
}

#[no_mangle]
pub extern "C" fn sexp_register_simple_type(ctx: Sexp, name: Sexp, parent: Sexp, slots: Sexp) -> Sexp {
    context(ctx).register_simple_type(name, parent, slots)
}

#[no_mangle]
pub extern "C" fn sexp_register_c_type(ctx: Sexp, name: Sexp, finalizer: Sexp) -> Sexp {
    context(ctx).register_c_type(name, finalizer)
}

// =============================================================================
// Context lifecycle and collection
// =============================================================================

#[no_mangle]
pub extern "C" fn sexp_scheme_init() {
    scheme_init();
}

/// New context configured from the environment (see `ContextConfig::from_env`).
#[no_mangle]
pub extern "C" fn sexp_make_eval_context() -> Sexp {
    Context::make_eval_context(ContextConfig::from_env())
}

#[no_mangle]
pub extern "C" fn sexp_load_standard_env(ctx: Sexp, env: Sexp, version: Sexp) -> Sexp {
    context(ctx).load_standard_env(env, version)
}

/// # Safety
/// `ctx` and every handle allocated in it are dangling afterwards.
#[no_mangle]
pub unsafe extern "C" fn sexp_destroy_context(ctx: Sexp) -> Sexp {
    destroy_context(ctx)
}

#[no_mangle]
pub extern "C" fn sexp_context_env(ctx: Sexp) -> Sexp {
    context(ctx).env()
}

/// # Safety
/// `sum_freed` must be null or valid for a write.
#[no_mangle]
pub unsafe extern "C" fn sexp_gc(ctx: Sexp, sum_freed: *mut usize) -> Sexp {
    context(ctx).gc(sum_freed.as_mut())
}

#[no_mangle]
pub extern "C" fn sexp_preserve_object(ctx: Sexp, obj: Sexp) {
    context(ctx).preserve_object(obj)
}

#[no_mangle]
pub extern "C" fn sexp_release_object(ctx: Sexp, obj: Sexp) {
    context(ctx).release_object(obj)
}

// =============================================================================
// Runtime helpers
// =============================================================================

/// # Safety
/// `name` must be null or NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn sexp_intern(ctx: Sexp, name: *const c_char) -> Sexp {
    let c = context(ctx);
    match c_str(name) {
        Some(name) => c.intern(name),
        None => c.raise(Condition::user("symbol name must be a UTF-8 C string")),
    }
}

/// # Safety
/// `str` must be null or NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn sexp_c_string(ctx: Sexp, str: *const c_char) -> Sexp {
    let c = context(ctx);
    match c_str(str) {
        Some(text) => c.c_string(text),
        None => c.raise(Condition::user("string must be a UTF-8 C string")),
    }
}

#[no_mangle]
pub extern "C" fn sexp_make_flonum(ctx: Sexp, f: f64) -> Sexp {
    context(ctx).make_flonum(f)
}

#[no_mangle]
pub extern "C" fn sexp_make_integer(ctx: Sexp, n: i64) -> Sexp {
    context(ctx).make_integer(n)
}

#[no_mangle]
pub extern "C" fn sexp_apply(ctx: Sexp, proc: Sexp, args: Sexp) -> Sexp {
    context(ctx).apply(proc, args)
}

#[no_mangle]
pub extern "C" fn sexp_write_to_string(ctx: Sexp, obj: Sexp) -> Sexp {
    context(ctx).write_to_string(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    extern "C" fn double_it(_ctx: Sexp, _op: Sexp, _n: SexpSint, x: Sexp) -> Sexp {
        Sexp::make_fixnum(x.unbox_fixnum() * 2)
    }

    fn with_ctx(f: impl FnOnce(Sexp)) {
        let ctx = sexp_make_eval_context();
        f(ctx);
        assert_eq!(unsafe { sexp_destroy_context(ctx) }, Sexp::TRUE);
    }

    #[test]
    fn test_vector_round_trip() {
        with_ctx(|ctx| {
            let v = sexp_make_vector(ctx, sexp_make_fixnum(3), Sexp::FALSE);
            for i in 0..3 {
                sexp_vector_set(v, sexp_make_fixnum(i), sexp_make_fixnum(i + 1));
            }
            assert!(sexp_vectorp(v));
            assert_eq!(sexp_vector_length(v), 3);
            assert_eq!(sexp_unbox_fixnum(sexp_vector_ref(v, sexp_make_fixnum(2))), 3);
        });
    }

    #[test]
    fn test_string_port_round_trip() {
        with_ctx(|ctx| {
            let out = sexp_open_output_string(ctx);
            let text = CString::new("ok").unwrap();
            assert_eq!(unsafe { sexp_write_string(ctx, text.as_ptr(), out) }, 0);
            assert_eq!(sexp_newline(ctx, out), 10);
            let s = sexp_get_output_string(ctx, out);
            assert_eq!(sexp_string_size(s), 3);
            let data = unsafe { CStr::from_ptr(sexp_string_data(s)) };
            assert_eq!(data.to_str().unwrap(), "ok\n");
        });
    }

    #[test]
    fn test_constructors_reject_bad_lengths() {
        with_ctx(|ctx| {
            assert!(sexp_exceptionp(sexp_make_string(ctx, sexp_make_fixnum(-1), sexp_make_character('a' as u32))));
            assert!(sexp_exceptionp(sexp_make_bytes(ctx, sexp_make_fixnum(2), sexp_make_fixnum(256))));
            let s = sexp_make_string(ctx, sexp_make_fixnum(2), sexp_make_character('z' as u32));
            assert_eq!(sexp_string_length(s), 2);
        });
    }

    #[test]
    fn test_oversized_constructors_raise_out_of_memory() {
        with_ctx(|ctx| {
            let huge = sexp_make_fixnum(super::super::sexp::SEXP_MAX_FIXNUM);
            let results = [
                sexp_make_vector(ctx, huge, Sexp::FALSE),
                sexp_make_string(ctx, huge, sexp_make_character('a' as u32)),
                sexp_make_bytes(ctx, huge, sexp_make_fixnum(0)),
            ];
            for res in results {
                assert!(sexp_exceptionp(res));
                assert_eq!(
                    super::super::exception::exception_kind(res),
                    Some("out-of-memory")
                );
            }
        });
    }

    #[test]
    fn test_define_foreign_through_c_names() {
        with_ctx(|ctx| {
            let env = sexp_context_env(ctx);
            let name = CString::new("double").unwrap();
            let f: SexpProc1 = unsafe { std::mem::transmute(double_it as super::super::foreign::SexpProc2) };
            let op = unsafe { sexp_define_foreign(ctx, env, name.as_ptr(), 1, Some(f)) };
            assert!(sexp_opcodep(op));
            let args = sexp_list1(ctx, sexp_make_fixnum(21));
            assert_eq!(sexp_apply(ctx, op, args), sexp_make_fixnum(42));

            let bad = unsafe { sexp_define_foreign(ctx, env, name.as_ptr(), 9, Some(f)) };
            assert!(sexp_exceptionp(bad));
            let null = unsafe { sexp_define_foreign(ctx, env, name.as_ptr(), 1, None) };
            assert!(sexp_exceptionp(null));
        });
    }

    #[test]
    fn test_gc_reports_through_pointer() {
        with_ctx(|ctx| {
            sexp_cons(ctx, Sexp::NULL, Sexp::NULL);
            let mut freed = 0usize;
            let res = unsafe { sexp_gc(ctx, &mut freed) };
            assert!(sexp_fixnump(res));
            assert_eq!(sexp_unbox_fixnum(res) as usize, freed);
            assert!(freed > 0);
        });
    }

    #[test]
    fn test_predicates_on_immediates() {
        assert!(sexp_nullp(Sexp::NULL));
        assert!(sexp_booleanp(sexp_make_boolean(true)));
        assert!(!sexp_pairp(Sexp::NULL));
        assert!(sexp_string_cursorp(sexp_make_string_cursor(4)));
        assert_eq!(sexp_unbox_string_cursor(sexp_make_string_cursor(4)), 4);
        assert_eq!(sexp_unbox_character(sexp_make_character(0x3bb)), 0x3bb);
    }
}
