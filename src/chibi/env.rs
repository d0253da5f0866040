//! Environments and parameter objects.

use std::cell::{Cell, RefCell};

use rustc_hash::FxHashMap;

use super::context::Context;
use super::heap::HeapObject;
use super::sexp::Sexp;

impl Context {
    /// New empty environment whose lookups fall back to `parent` (`#f` for none).
    pub fn make_env(&self, parent: Sexp) -> Sexp {
        self.alloc(HeapObject::Env {
            parent,
            bindings: RefCell::new(FxHashMap::default()),
        })
    }

    /// Bind `sym` in `env` itself, replacing an existing binding.
    pub fn env_define(&self, env: Sexp, sym: Sexp, value: Sexp) -> Sexp {
        match env.object() {
            Some(HeapObject::Env { bindings, .. }) if sym.is_symbol() => {
                bindings.borrow_mut().insert(sym, value);
                Sexp::VOID
            }
            Some(HeapObject::Env { .. }) => self.type_exception(Sexp::FALSE, "symbol", sym),
            _ => self.type_exception(Sexp::FALSE, "environment", env),
        }
    }

    /// Value bound to `sym` in `env` or its ancestors, else `default`.
    pub fn env_ref(&self, env: Sexp, sym: Sexp, default: Sexp) -> Sexp {
        env_lookup(env, sym).unwrap_or(default)
    }

    pub fn make_parameter(&self, value: Sexp, converter: Sexp) -> Sexp {
        self.alloc(HeapObject::Parameter {
            value: Cell::new(value),
            converter,
        })
    }
}

pub fn env_lookup(env: Sexp, sym: Sexp) -> Option<Sexp> {
    let mut current = env;
    while let Some(HeapObject::Env { parent, bindings }) = current.object() {
        if let Some(&value) = bindings.borrow().get(&sym) {
            return Some(value);
        }
        current = *parent;
    }
    None
}

pub fn env_parent(env: Sexp) -> Option<Sexp> {
    match env.object() {
        Some(HeapObject::Env { parent, .. }) => Some(*parent),
        _ => None,
    }
}

pub fn parameter_value(param: Sexp) -> Option<Sexp> {
    match param.object() {
        Some(HeapObject::Parameter { value, .. }) => Some(value.get()),
        _ => None,
    }
}

/// Rebind a parameter's current value. Returns `false` for non-parameters.
pub fn parameter_set(param: Sexp, new: Sexp) -> bool {
    match param.object() {
        Some(HeapObject::Parameter { value, .. }) => {
            value.set(new);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::super::context::{destroy_context, ContextConfig};
    use super::*;

    #[test]
    fn test_lookup_walks_parents() {
        let ctx = Context::make_eval_context(ContextConfig::default());
        let c = unsafe { Context::from_sexp(ctx) };
        let outer = c.make_env(Sexp::FALSE);
        let inner = c.make_env(outer);
        let x = c.intern("x");
        c.env_define(outer, x, Sexp::make_fixnum(1));
        assert_eq!(c.env_ref(inner, x, Sexp::FALSE), Sexp::make_fixnum(1));

        c.env_define(inner, x, Sexp::make_fixnum(2));
        assert_eq!(c.env_ref(inner, x, Sexp::FALSE), Sexp::make_fixnum(2));
        assert_eq!(c.env_ref(outer, x, Sexp::FALSE), Sexp::make_fixnum(1));
        assert_eq!(env_parent(inner), Some(outer));

        let missing = c.intern("missing");
        assert_eq!(c.env_ref(inner, missing, Sexp::TRUE), Sexp::TRUE);
        unsafe { destroy_context(ctx) };
    }

    #[test]
    fn test_define_rejects_bad_arguments() {
        let ctx = Context::make_eval_context(ContextConfig::default());
        let c = unsafe { Context::from_sexp(ctx) };
        assert!(c.env_define(Sexp::NULL, c.intern("x"), Sexp::TRUE).is_exception());
        assert!(c.env_define(c.env(), Sexp::make_fixnum(1), Sexp::TRUE).is_exception());
        unsafe { destroy_context(ctx) };
    }

    #[test]
    fn test_parameters() {
        let ctx = Context::make_eval_context(ContextConfig::default());
        let c = unsafe { Context::from_sexp(ctx) };
        let p = c.make_parameter(Sexp::make_fixnum(10), Sexp::FALSE);
        assert!(p.is_parameter());
        assert_eq!(parameter_value(p), Some(Sexp::make_fixnum(10)));
        assert!(parameter_set(p, Sexp::make_fixnum(11)));
        assert_eq!(parameter_value(p), Some(Sexp::make_fixnum(11)));
        assert!(!parameter_set(Sexp::NULL, Sexp::TRUE));
        unsafe { destroy_context(ctx) };
    }
}
