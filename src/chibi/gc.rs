//! Explicit mark/sweep collection.
//!
//! Nothing is collected implicitly: allocation only grows the arena, and
//! memory is reclaimed when the host calls `gc`. Roots are the context
//! environment, the port parameters, the symbol table, preserved objects,
//! registered types and every registered host slot.

use tracing::{debug, trace, warn};

use super::context::Context;
use super::heap::{HeapCell, HeapObject};
use super::sexp::Sexp;

impl Context {
    /// Collect unreachable objects. Stores the number of bytes released in
    /// `sum_freed` and returns it as a fixnum. A collection started from a
    /// finalizer does nothing.
    pub fn gc(&self, sum_freed: Option<&mut usize>) -> Sexp {
        let roots = self.roots();
        let freed = self.collect(roots);
        if let Some(out) = sum_freed {
            *out = freed;
        }
        Sexp::make_fixnum(freed as isize)
    }

    fn roots(&self) -> Vec<Sexp> {
        let mut roots = vec![self.env()];
        roots.extend(self.port_params.iter().map(|p| p.get()));
        roots.extend(self.symbols.borrow().values().copied());
        roots.extend(self.preserved.borrow().iter().copied());
        roots.extend(self.types.borrow().iter().copied());
        for &slot in self.saves.borrow().iter() {
            // SAFETY: registered slots outlive their registration.
            roots.push(unsafe { (*slot).get() });
        }
        roots
    }

    /// Mark from `roots`, sweep, finalize. Returns bytes freed.
    pub(crate) fn collect(&self, roots: Vec<Sexp>) -> usize {
        if self.collecting.replace(true) {
            return 0;
        }
        let root_count = roots.len();
        let marked = mark(roots);
        let dead = self.sweep();
        let freed: usize = dead.iter().map(|c| c.obj.footprint()).sum();
        let finalized = self.finalize(&dead);
        let count = dead.len();
        drop(dead);
        self.collecting.set(false);

        if self.config().gc_trace {
            debug!(root_count, marked, freed_objects = count, freed, finalized, "gc");
        } else {
            trace!(root_count, marked, freed_objects = count, freed, finalized, "gc");
        }
        freed
    }

    fn sweep(&self) -> Vec<Box<HeapCell>> {
        let mut heap = self.heap.borrow_mut();
        let (live, dead): (Vec<_>, Vec<_>) = std::mem::take(&mut *heap)
            .into_iter()
            .partition(|cell| cell.marked.get());
        *heap = live;
        for cell in heap.iter() {
            cell.marked.set(false);
        }
        if let Some(cell) = self.sexp().cell() {
            cell.marked.set(false);
        }
        dead
    }

    /// Run type finalizers and release owned foreign memory for dead
    /// foreign pointers. The cells stay allocated until this returns, so a
    /// finalizer may still read its argument.
    fn finalize(&self, dead: &[Box<HeapCell>]) -> usize {
        let mut finalized = 0;
        for cell in dead {
            let HeapObject::CPointer(ptr) = &cell.obj else {
                continue;
            };
            let obj = Sexp::from_cell(&**cell);
            if let Some(HeapObject::Type(info)) =
                self.type_by_id(ptr.type_id).and_then(Sexp::object)
            {
                if info.finalizer.is_opcode() {
                    let res = self.apply_slice(info.finalizer, &[obj]);
                    if res.is_exception() {
                        warn!(
                            report = %self.exception_report(res),
                            "finalizer returned an exception"
                        );
                    }
                    finalized += 1;
                }
            }
            if ptr.freep {
                let value = ptr.value.replace(std::ptr::null_mut());
                if !value.is_null() {
                    // SAFETY: `freep` pointers were handed over as malloc blocks.
                    unsafe { libc::free(value) };
                }
            }
        }
        finalized
    }
}

fn mark(mut stack: Vec<Sexp>) -> usize {
    let mut marked = 0;
    while let Some(x) = stack.pop() {
        if let Some(cell) = x.cell() {
            if cell.marked.replace(true) {
                continue;
            }
            marked += 1;
            cell.obj.children(&mut stack);
        }
    }
    marked
}
