//! Foreign procedures: host functions registered as opcodes.
//!
//! A foreign function receives the context, its own opcode and the argument
//! count before the arguments themselves. Functions of up to six arguments
//! are supported; all of them travel through the shim as the zero-argument
//! pointer type and are recovered by arity on registration.

use std::ffi::c_int;
use std::mem;

use smallvec::SmallVec;
use tracing::debug;

use super::context::Context;
use super::env::{env_lookup, parameter_value};
use super::exception::Condition;
use super::heap::{HeapObject, Opcode, OptionalArg};
use super::lists::list_to_vec;
use super::sexp::{Sexp, SexpSint};

pub type SexpProc1 = extern "C" fn(Sexp, Sexp, SexpSint) -> Sexp;
pub type SexpProc2 = extern "C" fn(Sexp, Sexp, SexpSint, Sexp) -> Sexp;
pub type SexpProc3 = extern "C" fn(Sexp, Sexp, SexpSint, Sexp, Sexp) -> Sexp;
pub type SexpProc4 = extern "C" fn(Sexp, Sexp, SexpSint, Sexp, Sexp, Sexp) -> Sexp;
pub type SexpProc5 = extern "C" fn(Sexp, Sexp, SexpSint, Sexp, Sexp, Sexp, Sexp) -> Sexp;
pub type SexpProc6 = extern "C" fn(Sexp, Sexp, SexpSint, Sexp, Sexp, Sexp, Sexp, Sexp) -> Sexp;
pub type SexpProc7 =
    extern "C" fn(Sexp, Sexp, SexpSint, Sexp, Sexp, Sexp, Sexp, Sexp, Sexp) -> Sexp;

pub const MAX_FOREIGN_ARGS: usize = 6;

/// A foreign function pointer tagged with its arity.
#[derive(Debug, Clone, Copy)]
pub enum ForeignFn {
    A0(SexpProc1),
    A1(SexpProc2),
    A2(SexpProc3),
    A3(SexpProc4),
    A4(SexpProc5),
    A5(SexpProc6),
    A6(SexpProc7),
}

impl ForeignFn {
    /// Recover the real signature of a pointer passed as `SexpProc1`.
    ///
    /// # Safety
    /// `func` must really take `num_args` arguments after the leading three.
    pub unsafe fn from_proc1(func: SexpProc1, num_args: usize) -> Option<ForeignFn> {
        Some(match num_args {
            0 => ForeignFn::A0(func),
            1 => ForeignFn::A1(mem::transmute::<SexpProc1, SexpProc2>(func)),
            2 => ForeignFn::A2(mem::transmute::<SexpProc1, SexpProc3>(func)),
            3 => ForeignFn::A3(mem::transmute::<SexpProc1, SexpProc4>(func)),
            4 => ForeignFn::A4(mem::transmute::<SexpProc1, SexpProc5>(func)),
            5 => ForeignFn::A5(mem::transmute::<SexpProc1, SexpProc6>(func)),
            6 => ForeignFn::A6(mem::transmute::<SexpProc1, SexpProc7>(func)),
            _ => return None,
        })
    }

    pub fn arity(&self) -> usize {
        match self {
            ForeignFn::A0(_) => 0,
            ForeignFn::A1(_) => 1,
            ForeignFn::A2(_) => 2,
            ForeignFn::A3(_) => 3,
            ForeignFn::A4(_) => 4,
            ForeignFn::A5(_) => 5,
            ForeignFn::A6(_) => 6,
        }
    }

    /// Invoke with exactly `arity()` arguments.
    pub fn call(&self, ctx: Sexp, op: Sexp, args: &[Sexp]) -> Sexp {
        debug_assert_eq!(args.len(), self.arity());
        let n = args.len() as SexpSint;
        match (*self, args) {
            (ForeignFn::A0(f), []) => f(ctx, op, n),
            (ForeignFn::A1(f), &[a]) => f(ctx, op, n, a),
            (ForeignFn::A2(f), &[a, b]) => f(ctx, op, n, a, b),
            (ForeignFn::A3(f), &[a, b, c]) => f(ctx, op, n, a, b, c),
            (ForeignFn::A4(f), &[a, b, c, d]) => f(ctx, op, n, a, b, c, d),
            (ForeignFn::A5(f), &[a, b, c, d, e]) => f(ctx, op, n, a, b, c, d, e),
            (ForeignFn::A6(f), &[a, b, c, d, e, g]) => f(ctx, op, n, a, b, c, d, e, g),
            _ => panic!(
                "foreign call with {} arguments, expected {}",
                args.len(),
                self.arity()
            ),
        }
    }
}

impl Context {
    pub fn make_foreign(&self, name: &str, func: ForeignFn, optional: OptionalArg) -> Sexp {
        let name = self.c_string(name);
        self.alloc(HeapObject::Opcode(Opcode {
            name,
            func,
            optional,
        }))
    }

    fn bind_foreign(&self, env: Sexp, name: &str, func: ForeignFn, optional: OptionalArg) -> Sexp {
        if !env.is_env() {
            return self.type_exception(Sexp::FALSE, "environment", env);
        }
        let op = self.make_foreign(name, func, optional);
        let sym = self.intern(name);
        let res = self.env_define(env, sym, op);
        if res.is_exception() {
            return res;
        }
        debug!(name, arity = func.arity(), "foreign procedure defined");
        op
    }

    /// Bind `name` in `env` to a new opcode. Returns the opcode.
    pub fn define_foreign(&self, env: Sexp, name: &str, func: ForeignFn) -> Sexp {
        self.bind_foreign(env, name, func, OptionalArg::None)
    }

    /// Like `define_foreign`, with the last argument defaulting to `dflt`.
    pub fn define_foreign_opt(&self, env: Sexp, name: &str, func: ForeignFn, dflt: Sexp) -> Sexp {
        if func.arity() == 0 {
            return self.raise(Condition::user("optional argument needs arity of at least one"));
        }
        self.bind_foreign(env, name, func, OptionalArg::Default(dflt))
    }

    /// Like `define_foreign`, with the last argument defaulting to the
    /// current value of the parameter bound to `param` in `env`.
    pub fn define_foreign_param(&self, env: Sexp, name: &str, func: ForeignFn, param: &str) -> Sexp {
        if func.arity() == 0 {
            return self.raise(Condition::user("optional argument needs arity of at least one"));
        }
        // Resolved once, here. An unbound name leaves `#f` as the default.
        let p = env_lookup(env, self.intern(param)).unwrap_or(Sexp::FALSE);
        self.bind_foreign(env, name, func, OptionalArg::Param(p))
    }

    /// Apply `proc` to the elements of the list `args`.
    pub fn apply(&self, proc: Sexp, args: Sexp) -> Sexp {
        match list_to_vec(args) {
            Some(args) => self.apply_slice(proc, &args),
            None => self.type_exception(Sexp::FALSE, "list", args),
        }
    }

    /// Apply an opcode or parameter. Compiled procedures need an evaluator
    /// and are rejected.
    pub fn apply_slice(&self, proc: Sexp, args: &[Sexp]) -> Sexp {
        match proc.object() {
            Some(HeapObject::Opcode(op)) => {
                let arity = op.num_args();
                let mut full: SmallVec<[Sexp; MAX_FOREIGN_ARGS]> = args.iter().copied().collect();
                if full.len() + 1 == arity {
                    match op.optional {
                        OptionalArg::Default(x) => full.push(x),
                        OptionalArg::Param(p) => full.push(parameter_value(p).unwrap_or(Sexp::FALSE)),
                        OptionalArg::None => {}
                    }
                }
                if full.len() != arity {
                    return self.raise(
                        Condition::new("arity", "wrong number of arguments")
                            .irritant(Sexp::make_fixnum(args.len() as SexpSint))
                            .in_procedure(proc),
                    );
                }
                op.func.call(self.sexp(), proc, &full)
            }
            Some(HeapObject::Parameter { value, .. }) if args.is_empty() => value.get(),
            Some(HeapObject::Procedure { .. }) => self.raise(
                Condition::new("eval", "procedure application needs an evaluator").in_procedure(proc),
            ),
            _ => self.type_exception(Sexp::FALSE, "applicable object", proc),
        }
    }
}

/// Check a C-side arity before recovering a function pointer.
pub fn foreign_arity(num_args: c_int) -> Option<usize> {
    usize::try_from(num_args)
        .ok()
        .filter(|&n| n <= MAX_FOREIGN_ARGS)
}
