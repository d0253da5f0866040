//! Compiled-code and syntax objects.
//!
//! Without an evaluator these are inert: they can be built, inspected and
//! collected, but applying a procedure returns an exception.

use super::context::Context;
use super::heap::HeapObject;
use super::lists::is_proper_list;
use super::sexp::Sexp;

impl Context {
    /// `name` is a symbol or `#f`; `literals` a list.
    pub fn make_bytecode(&self, name: Sexp, literals: Sexp, code: &[u8]) -> Sexp {
        if !is_proper_list(literals) {
            return self.type_exception(Sexp::FALSE, "list", literals);
        }
        self.alloc(HeapObject::Bytecode {
            name,
            literals,
            code: code.into(),
        })
    }

    pub fn make_procedure(&self, flags: u8, num_args: usize, bytecode: Sexp, vars: Sexp) -> Sexp {
        if !bytecode.is_bytecode() {
            return self.type_exception(Sexp::FALSE, "bytecode", bytecode);
        }
        self.alloc(HeapObject::Procedure {
            flags,
            num_args,
            bytecode,
            vars,
        })
    }

    pub fn make_macro(&self, procedure: Sexp, env: Sexp) -> Sexp {
        self.alloc(HeapObject::Macro {
            procedure,
            env,
            source: Sexp::FALSE,
        })
    }

    pub fn make_synclo(&self, env: Sexp, free_vars: Sexp, expr: Sexp) -> Sexp {
        self.alloc(HeapObject::SynClo {
            env,
            free_vars,
            expr,
        })
    }
}

pub fn procedure_num_args(proc: Sexp) -> Option<usize> {
    match proc.object()? {
        HeapObject::Procedure { num_args, .. } => Some(*num_args),
        HeapObject::Opcode(op) => Some(op.num_args()),
        _ => None,
    }
}

pub fn synclo_expr(sc: Sexp) -> Option<Sexp> {
    match sc.object()? {
        HeapObject::SynClo { expr, .. } => Some(*expr),
        _ => None,
    }
}
