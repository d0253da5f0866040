//! Builtin opcodes installed by `load_standard_env`.
//!
//! Each builtin is a foreign function with the ordinary calling convention,
//! declared in the `BUILTINS` table and registered through the same path as
//! host-defined procedures.

use super::context::Context;
use super::foreign::ForeignFn;
use super::sexp::{Sexp, SexpSint};
use super::strings::{vector_length, vector_ref};

/// Source of an omitted trailing argument.
#[derive(Debug, Clone, Copy)]
pub enum BuiltinOpt {
    None,
    Default(Sexp),
    /// Name of a parameter bound in the target environment.
    Param(&'static str),
}

pub struct BuiltinDef {
    pub name: &'static str,
    pub func: ForeignFn,
    pub optional: BuiltinOpt,
    pub doc: &'static str,
}

impl BuiltinDef {
    pub const DEFAULT: BuiltinDef = BuiltinDef {
        name: "",
        func: ForeignFn::A0(unreachable_builtin),
        optional: BuiltinOpt::None,
        doc: "",
    };
}

extern "C" fn unreachable_builtin(ctx: Sexp, _op: Sexp, _n: SexpSint) -> Sexp {
    context(ctx).raise(super::exception::Condition::user("builtin without implementation"))
}

fn context<'a>(ctx: Sexp) -> &'a Context {
    // SAFETY: opcodes are only invoked by `apply_slice` with a live context.
    unsafe { Context::from_sexp(ctx) }
}

extern "C" fn prim_car(ctx: Sexp, op: Sexp, _n: SexpSint, x: Sexp) -> Sexp {
    match x.as_pair() {
        Some((car, _)) => car,
        None => context(ctx).type_exception(op, "pair", x),
    }
}

extern "C" fn prim_cdr(ctx: Sexp, op: Sexp, _n: SexpSint, x: Sexp) -> Sexp {
    match x.as_pair() {
        Some((_, cdr)) => cdr,
        None => context(ctx).type_exception(op, "pair", x),
    }
}

extern "C" fn prim_cons(ctx: Sexp, _op: Sexp, _n: SexpSint, a: Sexp, b: Sexp) -> Sexp {
    context(ctx).cons(a, b)
}

extern "C" fn prim_length(ctx: Sexp, op: Sexp, _n: SexpSint, ls: Sexp) -> Sexp {
    let c = context(ctx);
    if c.listp(ls).is_true() {
        c.length(ls)
    } else {
        c.type_exception(op, "list", ls)
    }
}

extern "C" fn prim_reverse(ctx: Sexp, _op: Sexp, _n: SexpSint, ls: Sexp) -> Sexp {
    context(ctx).reverse(ls)
}

extern "C" fn prim_append(ctx: Sexp, _op: Sexp, _n: SexpSint, a: Sexp, b: Sexp) -> Sexp {
    context(ctx).append2(a, b)
}

extern "C" fn prim_list_to_vector(ctx: Sexp, _op: Sexp, _n: SexpSint, ls: Sexp) -> Sexp {
    context(ctx).list_to_vector(ls)
}

extern "C" fn prim_equalp(ctx: Sexp, _op: Sexp, _n: SexpSint, a: Sexp, b: Sexp) -> Sexp {
    context(ctx).equalp(a, b)
}

extern "C" fn prim_string_to_symbol(ctx: Sexp, _op: Sexp, _n: SexpSint, s: Sexp) -> Sexp {
    context(ctx).string_to_symbol(s)
}

extern "C" fn prim_symbol_to_string(ctx: Sexp, _op: Sexp, _n: SexpSint, s: Sexp) -> Sexp {
    context(ctx).symbol_to_string(s)
}

extern "C" fn prim_string_to_number(ctx: Sexp, _op: Sexp, _n: SexpSint, s: Sexp, radix: Sexp) -> Sexp {
    context(ctx).string_to_number(s, radix)
}

extern "C" fn prim_write(ctx: Sexp, _op: Sexp, _n: SexpSint, obj: Sexp, out: Sexp) -> Sexp {
    context(ctx).write(obj, out)
}

extern "C" fn prim_display(ctx: Sexp, _op: Sexp, _n: SexpSint, obj: Sexp, out: Sexp) -> Sexp {
    context(ctx).display(obj, out)
}

extern "C" fn prim_newline(ctx: Sexp, op: Sexp, _n: SexpSint, out: Sexp) -> Sexp {
    let c = context(ctx);
    if c.newline(out) < 0 {
        c.type_exception(op, "output port", out)
    } else {
        Sexp::VOID
    }
}

extern "C" fn prim_vector_length(ctx: Sexp, op: Sexp, _n: SexpSint, v: Sexp) -> Sexp {
    if v.is_vector() {
        Sexp::make_fixnum(vector_length(v) as SexpSint)
    } else {
        context(ctx).type_exception(op, "vector", v)
    }
}

extern "C" fn prim_vector_ref(ctx: Sexp, op: Sexp, _n: SexpSint, v: Sexp, i: Sexp) -> Sexp {
    let c = context(ctx);
    if !v.is_vector() {
        return c.type_exception(op, "vector", v);
    }
    if !i.is_fixnum() {
        return c.type_exception(op, "fixnum", i);
    }
    let len = vector_length(v);
    match usize::try_from(i.unbox_fixnum()) {
        Ok(k) if k < len => vector_ref(v, i),
        _ => c.range_exception(v, i, Sexp::make_fixnum(len as SexpSint)),
    }
}

pub const BUILTINS: &[BuiltinDef] = &[
    BuiltinDef {
        name: "car",
        func: ForeignFn::A1(prim_car),
        doc: "First element of a pair.",
        ..BuiltinDef::DEFAULT
    },
    BuiltinDef {
        name: "cdr",
        func: ForeignFn::A1(prim_cdr),
        doc: "Rest of a pair.",
        ..BuiltinDef::DEFAULT
    },
    BuiltinDef {
        name: "cons",
        func: ForeignFn::A2(prim_cons),
        doc: "Allocate a pair.",
        ..BuiltinDef::DEFAULT
    },
    BuiltinDef {
        name: "length",
        func: ForeignFn::A1(prim_length),
        doc: "Number of elements of a proper list.",
        ..BuiltinDef::DEFAULT
    },
    BuiltinDef {
        name: "reverse",
        func: ForeignFn::A1(prim_reverse),
        ..BuiltinDef::DEFAULT
    },
    BuiltinDef {
        name: "append",
        func: ForeignFn::A2(prim_append),
        optional: BuiltinOpt::Default(Sexp::NULL),
        doc: "Copy of the first list ending in the second.",
    },
    BuiltinDef {
        name: "list->vector",
        func: ForeignFn::A1(prim_list_to_vector),
        ..BuiltinDef::DEFAULT
    },
    BuiltinDef {
        name: "equal?",
        func: ForeignFn::A2(prim_equalp),
        doc: "Structural equality.",
        ..BuiltinDef::DEFAULT
    },
    BuiltinDef {
        name: "string->symbol",
        func: ForeignFn::A1(prim_string_to_symbol),
        ..BuiltinDef::DEFAULT
    },
    BuiltinDef {
        name: "symbol->string",
        func: ForeignFn::A1(prim_symbol_to_string),
        ..BuiltinDef::DEFAULT
    },
    BuiltinDef {
        name: "string->number",
        func: ForeignFn::A2(prim_string_to_number),
        optional: BuiltinOpt::Default(Sexp::make_fixnum(10)),
        doc: "Parse a number, or #f.",
    },
    BuiltinDef {
        name: "write",
        func: ForeignFn::A2(prim_write),
        optional: BuiltinOpt::Param("current-output-port"),
        doc: "Print in reader syntax.",
    },
    BuiltinDef {
        name: "display",
        func: ForeignFn::A2(prim_display),
        optional: BuiltinOpt::Param("current-output-port"),
        doc: "Print strings and characters raw.",
    },
    BuiltinDef {
        name: "newline",
        func: ForeignFn::A1(prim_newline),
        optional: BuiltinOpt::Param("current-output-port"),
        ..BuiltinDef::DEFAULT
    },
    BuiltinDef {
        name: "vector-length",
        func: ForeignFn::A1(prim_vector_length),
        ..BuiltinDef::DEFAULT
    },
    BuiltinDef {
        name: "vector-ref",
        func: ForeignFn::A2(prim_vector_ref),
        doc: "Element of a vector; range exception when out of bounds.",
        ..BuiltinDef::DEFAULT
    },
];

/// Define every builtin in `env`. Returns `#t` or the first exception.
pub fn register_builtins(ctx: &Context, env: Sexp) -> Sexp {
    for def in BUILTINS {
        let res = match def.optional {
            BuiltinOpt::None => ctx.define_foreign(env, def.name, def.func),
            BuiltinOpt::Default(x) => ctx.define_foreign_opt(env, def.name, def.func, x),
            BuiltinOpt::Param(p) => ctx.define_foreign_param(env, def.name, def.func, p),
        };
        if res.is_exception() {
            return res;
        }
    }
    Sexp::TRUE
}
