// Predicate/constructor matrix for the context-threaded backend.
//
// Every predicate must accept values built by its own constructor and
// reject one value of every other kind.

use crate::common::{fx, with_ctx};
use scheme_shim::chibi::shim::*;
use scheme_shim::chibi::types::type_id;
use scheme_shim::chibi::{Chibi, Context, Sexp};
use scheme_shim::model::{Backend, ValueKind};

fn sample_values(ctx: Sexp, c: &Context) -> Vec<(Sexp, ValueKind)> {
    let env = c.env();
    let bytecode = c.make_bytecode(c.intern("f"), Sexp::NULL, &[0]);
    let procedure = c.make_procedure(0, 1, bytecode, Sexp::FALSE);
    let point = c.register_simple_type(c.c_string("point"), Sexp::FALSE, c.list(&[c.intern("x")]));
    let handle = c.register_c_type(c.c_string("handle"), Sexp::FALSE);
    let handle_id = type_id(handle).unwrap();
    vec![
        (Sexp::TRUE, ValueKind::Boolean),
        (fx(5), ValueKind::Fixnum),
        (sexp_make_character('a' as u32), ValueKind::Character),
        (sexp_make_string_cursor(0), ValueKind::StringCursor),
        (Sexp::NULL, ValueKind::Null),
        (Sexp::EOF, ValueKind::Eof),
        (Sexp::VOID, ValueKind::Unspecified),
        (c.make_flonum(1.5), ValueKind::Flonum),
        (c.make_integer(i64::MAX), ValueKind::Bignum),
        (c.make_ratio(fx(1), fx(3)), ValueKind::Ratio),
        (c.make_complex(fx(1), fx(2)), ValueKind::Complex),
        (c.c_string("s"), ValueKind::String),
        (c.make_bytes(2, 0), ValueKind::Bytevector),
        (c.intern("s"), ValueKind::Symbol),
        (sexp_cons(ctx, fx(1), fx(2)), ValueKind::Pair),
        (c.make_vector(1, Sexp::FALSE), ValueKind::Vector),
        (c.open_input_string(c.c_string("")), ValueKind::InputPort),
        (c.open_output_string(), ValueKind::OutputPort),
        (procedure, ValueKind::Procedure),
        (c.env_ref(env, c.intern("car"), Sexp::FALSE), ValueKind::Opcode),
        (point, ValueKind::Type),
        (c.make_record(point), ValueKind::Record),
        (c.user_exception(Sexp::FALSE, "boom", Sexp::NULL), ValueKind::Exception),
        (ctx, ValueKind::Context),
        (env, ValueKind::Environment),
        (c.env_ref(env, c.intern("lambda"), Sexp::FALSE), ValueKind::CoreForm),
        (c.make_macro(procedure, env), ValueKind::Macro),
        (c.make_synclo(env, Sexp::NULL, c.intern("x")), ValueKind::SyntacticClosure),
        (bytecode, ValueKind::Bytecode),
        (c.make_cpointer(handle_id, std::ptr::null_mut(), Sexp::FALSE, false), ValueKind::ForeignPointer),
        (c.make_parameter(fx(1), Sexp::FALSE), ValueKind::Parameter),
    ]
}

type Predicate = extern "C" fn(Sexp) -> bool;

const PREDICATES: &[(&str, Predicate, &[ValueKind])] = &[
    ("booleanp", sexp_booleanp, &[ValueKind::Boolean]),
    ("fixnump", sexp_fixnump, &[ValueKind::Fixnum]),
    ("flonump", sexp_flonump, &[ValueKind::Flonum]),
    ("bignump", sexp_bignump, &[ValueKind::Bignum]),
    ("integerp", sexp_integerp, &[ValueKind::Fixnum, ValueKind::Bignum]),
    (
        "numberp",
        sexp_numberp,
        &[
            ValueKind::Fixnum,
            ValueKind::Flonum,
            ValueKind::Bignum,
            ValueKind::Ratio,
            ValueKind::Complex,
        ],
    ),
    ("charp", sexp_charp, &[ValueKind::Character]),
    ("stringp", sexp_stringp, &[ValueKind::String]),
    ("string_cursorp", sexp_string_cursorp, &[ValueKind::StringCursor]),
    ("bytesp", sexp_bytesp, &[ValueKind::Bytevector]),
    ("symbolp", sexp_symbolp, &[ValueKind::Symbol]),
    ("nullp", sexp_nullp, &[ValueKind::Null]),
    ("pairp", sexp_pairp, &[ValueKind::Pair]),
    ("vectorp", sexp_vectorp, &[ValueKind::Vector]),
    ("iportp", sexp_iportp, &[ValueKind::InputPort]),
    ("oportp", sexp_oportp, &[ValueKind::OutputPort]),
    ("portp", sexp_portp, &[ValueKind::InputPort, ValueKind::OutputPort]),
    ("procedurep", sexp_procedurep, &[ValueKind::Procedure]),
    ("opcodep", sexp_opcodep, &[ValueKind::Opcode]),
    ("applicablep", sexp_applicablep, &[ValueKind::Procedure, ValueKind::Opcode]),
    ("typep", sexp_typep, &[ValueKind::Type]),
    ("exceptionp", sexp_exceptionp, &[ValueKind::Exception]),
    ("contextp", sexp_contextp, &[ValueKind::Context]),
    ("envp", sexp_envp, &[ValueKind::Environment]),
    ("corep", sexp_corep, &[ValueKind::CoreForm]),
    ("macrop", sexp_macrop, &[ValueKind::Macro]),
    ("synclop", sexp_synclop, &[ValueKind::SyntacticClosure]),
    ("bytecodep", sexp_bytecodep, &[ValueKind::Bytecode]),
    ("cpointerp", sexp_cpointerp, &[ValueKind::ForeignPointer]),
];

#[test]
fn test_kind_of_matches_constructor() {
    with_ctx(|ctx, c| {
        for (value, kind) in sample_values(ctx, c) {
            assert_eq!(Chibi::kind_of(value), kind, "misclassified {:?}", value);
        }
    });
}

#[test]
fn test_predicate_matrix() {
    with_ctx(|ctx, c| {
        let values = sample_values(ctx, c);
        for (name, predicate, accepts) in PREDICATES {
            for &(value, kind) in &values {
                assert_eq!(
                    predicate(value),
                    accepts.contains(&kind),
                    "sexp_{} on a {} value",
                    name,
                    kind
                );
            }
        }
    });
}
