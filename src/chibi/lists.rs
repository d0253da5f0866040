//! Pairs, lists and structural equality.

use std::cell::{Cell, RefCell};

use super::context::Context;
use super::heap::HeapObject;
use super::numeric::eqv_numbers;
use super::sexp::Sexp;

impl Context {
    pub fn cons(&self, car: Sexp, cdr: Sexp) -> Sexp {
        self.alloc(HeapObject::Pair {
            car: Cell::new(car),
            cdr: Cell::new(cdr),
        })
    }

    pub fn list1(&self, x: Sexp) -> Sexp {
        self.cons(x, Sexp::NULL)
    }

    pub fn list(&self, items: &[Sexp]) -> Sexp {
        self.list_with_tail(items, Sexp::NULL)
    }

    pub fn list_with_tail(&self, items: &[Sexp], tail: Sexp) -> Sexp {
        items
            .iter()
            .rev()
            .fold(tail, |acc, &item| self.cons(item, acc))
    }

    /// Number of pairs in the spine as a fixnum; `#f` for a circular list.
    pub fn length(&self, ls: Sexp) -> Sexp {
        match spine_length(ls) {
            Some((n, _)) => Sexp::make_fixnum(n as isize),
            None => Sexp::FALSE,
        }
    }

    pub fn listp(&self, x: Sexp) -> Sexp {
        Sexp::make_boolean(is_proper_list(x))
    }

    pub fn memq(&self, x: Sexp, ls: Sexp) -> Sexp {
        let mut cursor = ls;
        while let Some((car, cdr)) = cursor.as_pair() {
            if car == x {
                return cursor;
            }
            cursor = cdr;
        }
        Sexp::FALSE
    }

    pub fn assq(&self, x: Sexp, ls: Sexp) -> Sexp {
        let mut cursor = ls;
        while let Some((entry, cdr)) = cursor.as_pair() {
            if let Some((key, _)) = entry.as_pair() {
                if key == x {
                    return entry;
                }
            }
            cursor = cdr;
        }
        Sexp::FALSE
    }

    pub fn reverse(&self, ls: Sexp) -> Sexp {
        let mut res = Sexp::NULL;
        let mut cursor = ls;
        while let Some((car, cdr)) = cursor.as_pair() {
            res = self.cons(car, res);
            cursor = cdr;
        }
        if cursor.is_null() {
            res
        } else {
            self.type_exception(Sexp::FALSE, "list", ls)
        }
    }

    /// Reverse in place by relinking the spine.
    pub fn nreverse(&self, ls: Sexp) -> Sexp {
        if !is_proper_list(ls) {
            return self.type_exception(Sexp::FALSE, "list", ls);
        }
        let mut prev = Sexp::NULL;
        let mut cursor = ls;
        while cursor.is_pair() {
            let next = cursor.cdr();
            cursor.set_cdr(prev);
            prev = cursor;
            cursor = next;
        }
        prev
    }

    /// Fresh copy of `a` whose last cdr is `b`.
    pub fn append2(&self, a: Sexp, b: Sexp) -> Sexp {
        match list_to_vec(a) {
            Some(items) => self.list_with_tail(&items, b),
            None => self.type_exception(Sexp::FALSE, "list", a),
        }
    }

    /// Copy the spine, keeping an improper tail.
    pub fn copy_list(&self, ls: Sexp) -> Sexp {
        let mut items = Vec::new();
        let mut cursor = ls;
        while let Some((car, cdr)) = cursor.as_pair() {
            items.push(car);
            cursor = cdr;
        }
        self.list_with_tail(&items, cursor)
    }

    pub fn list_to_vector(&self, ls: Sexp) -> Sexp {
        match list_to_vec(ls) {
            Some(items) => self.alloc(HeapObject::Vector(RefCell::new(items))),
            None => self.type_exception(Sexp::FALSE, "list", ls),
        }
    }

    pub fn equalp(&self, a: Sexp, b: Sexp) -> Sexp {
        Sexp::make_boolean(equal(a, b))
    }
}

/// Pair count and final tail, or `None` for a circular spine.
fn spine_length(ls: Sexp) -> Option<(usize, Sexp)> {
    let mut slow = ls;
    let mut fast = ls;
    let mut n = 0;
    loop {
        match fast.as_pair() {
            None => return Some((n, fast)),
            Some((_, next)) => {
                n += 1;
                fast = next;
            }
        }
        match fast.as_pair() {
            None => return Some((n, fast)),
            Some((_, next)) => {
                n += 1;
                fast = next;
            }
        }
        slow = slow.cdr();
        if slow == fast {
            return None;
        }
    }
}

pub fn is_proper_list(x: Sexp) -> bool {
    matches!(spine_length(x), Some((_, tail)) if tail.is_null())
}

/// Elements of a proper list.
pub fn list_to_vec(ls: Sexp) -> Option<Vec<Sexp>> {
    if !is_proper_list(ls) {
        return None;
    }
    let mut items = Vec::new();
    let mut cursor = ls;
    while let Some((car, cdr)) = cursor.as_pair() {
        items.push(car);
        cursor = cdr;
    }
    Some(items)
}

pub fn eqv(a: Sexp, b: Sexp) -> bool {
    a == b || (a.is_number() && b.is_number() && eqv_numbers(a, b))
}

/// Structural equality over pairs, strings, vectors and bytevectors.
pub fn equal(a: Sexp, b: Sexp) -> bool {
    let mut stack = vec![(a, b)];
    while let Some((a, b)) = stack.pop() {
        if eqv(a, b) {
            continue;
        }
        let same = match (a.object(), b.object()) {
            (
                Some(HeapObject::Pair { car: a1, cdr: d1 }),
                Some(HeapObject::Pair { car: a2, cdr: d2 }),
            ) => {
                stack.push((d1.get(), d2.get()));
                stack.push((a1.get(), a2.get()));
                true
            }
            (Some(HeapObject::String(x)), Some(HeapObject::String(y)))
            | (Some(HeapObject::Bytes(x)), Some(HeapObject::Bytes(y))) => {
                *x.borrow() == *y.borrow()
            }
            (Some(HeapObject::Vector(x)), Some(HeapObject::Vector(y))) => {
                let (x, y) = (x.borrow(), y.borrow());
                if x.len() == y.len() {
                    stack.extend(x.iter().copied().zip(y.iter().copied()));
                    true
                } else {
                    false
                }
            }
            _ => false,
        };
        if !same {
            return false;
        }
    }
    true
}
