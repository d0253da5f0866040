//! User-defined types: record types and foreign pointer types.

use std::cell::{Cell, RefCell};
use std::ffi::c_void;

use tracing::debug;

use super::context::Context;
use super::heap::{CPointer, HeapObject, HeapTag, TypeInfo, TypeKind};
use super::lists::list_to_vec;
use super::sexp::Sexp;

fn type_info(t: Sexp) -> Option<&'static TypeInfo> {
    match t.object() {
        Some(HeapObject::Type(info)) => Some(info),
        _ => None,
    }
}

pub fn type_id(t: Sexp) -> Option<usize> {
    type_info(t).map(|info| info.id)
}

pub fn type_num_slots(t: Sexp) -> Option<usize> {
    type_info(t).map(|info| info.num_slots)
}

pub fn cpointer_value(p: Sexp) -> Option<*mut c_void> {
    match p.object() {
        Some(HeapObject::CPointer(ptr)) => Some(ptr.value.get()),
        _ => None,
    }
}

pub fn cpointer_type_id(p: Sexp) -> Option<usize> {
    match p.object() {
        Some(HeapObject::CPointer(ptr)) => Some(ptr.type_id),
        _ => None,
    }
}

impl Context {
    fn register_type(&self, info: TypeInfo) -> Sexp {
        let name = info.name.string_value().unwrap_or_default();
        let (id, kind) = (info.id, info.kind);
        let t = self.alloc(HeapObject::Type(info));
        self.types.borrow_mut().push(t);
        debug!(id, name = %name, ?kind, "type registered");
        t
    }

    fn next_type_id(&self) -> usize {
        HeapTag::BUILTIN.len() + self.types.borrow().len()
    }

    /// Register a record type. `slots` is a list of symbols appended to the
    /// parent's slots; `parent` is a type descriptor or `#f`.
    pub fn register_simple_type(&self, name: Sexp, parent: Sexp, slots: Sexp) -> Sexp {
        if !name.is_string() {
            return self.type_exception(Sexp::FALSE, "string", name);
        }
        let inherited = if parent.is_boolean() && !parent.is_true() {
            0
        } else {
            match type_num_slots(parent) {
                Some(n) => n,
                None => return self.type_exception(Sexp::FALSE, "type", parent),
            }
        };
        let own = match list_to_vec(slots) {
            Some(items) if items.iter().all(|s| s.is_symbol()) => items.len(),
            _ => return self.type_exception(Sexp::FALSE, "list of symbols", slots),
        };
        self.register_type(TypeInfo {
            id: self.next_type_id(),
            name,
            parent,
            slots,
            num_slots: inherited + own,
            finalizer: Sexp::FALSE,
            kind: TypeKind::Record,
        })
    }

    /// Register a foreign pointer type. `finalizer` is an opcode of one
    /// argument run on each instance the collector frees, or `#f`.
    pub fn register_c_type(&self, name: Sexp, finalizer: Sexp) -> Sexp {
        if !name.is_string() {
            return self.type_exception(Sexp::FALSE, "string", name);
        }
        if !(finalizer.is_opcode() || finalizer == Sexp::FALSE) {
            return self.type_exception(Sexp::FALSE, "opcode", finalizer);
        }
        self.register_type(TypeInfo {
            id: self.next_type_id(),
            name,
            parent: Sexp::FALSE,
            slots: Sexp::NULL,
            num_slots: 0,
            finalizer,
            kind: TypeKind::CPointer,
        })
    }

    /// Fresh instance of a record type with every slot `#f`.
    pub fn make_record(&self, t: Sexp) -> Sexp {
        match type_info(t) {
            Some(info) if info.kind == TypeKind::Record => self.alloc(HeapObject::Record {
                type_: t,
                slots: RefCell::new(vec![Sexp::FALSE; info.num_slots]),
            }),
            _ => self.type_exception(Sexp::FALSE, "record type", t),
        }
    }

    pub fn slot_ref(&self, obj: Sexp, i: Sexp) -> Sexp {
        let Some(HeapObject::Record { slots, .. }) = obj.object() else {
            return self.type_exception(Sexp::FALSE, "record", obj);
        };
        let slots = slots.borrow();
        match slot_index(i, slots.len()) {
            Some(k) => slots[k],
            None => self.range_exception(obj, i, Sexp::make_fixnum(slots.len() as isize)),
        }
    }

    pub fn slot_set(&self, obj: Sexp, i: Sexp, value: Sexp) -> Sexp {
        let Some(HeapObject::Record { slots, .. }) = obj.object() else {
            return self.type_exception(Sexp::FALSE, "record", obj);
        };
        let len = slots.borrow().len();
        match slot_index(i, len) {
            Some(k) => {
                slots.borrow_mut()[k] = value;
                Sexp::VOID
            }
            None => self.range_exception(obj, i, Sexp::make_fixnum(len as isize)),
        }
    }

    /// Wrap a host pointer. With `freep` the collector releases `value`
    /// with `free` once the wrapper is unreachable.
    pub fn make_cpointer(&self, type_id: usize, value: *mut c_void, parent: Sexp, freep: bool) -> Sexp {
        self.alloc(HeapObject::CPointer(CPointer {
            type_id,
            value: Cell::new(value),
            parent,
            freep,
        }))
    }
}

fn slot_index(i: Sexp, len: usize) -> Option<usize> {
    if !i.is_fixnum() {
        return None;
    }
    usize::try_from(i.unbox_fixnum()).ok().filter(|&k| k < len)
}
