//! C-callable surface of the implicit-context backend.
//!
//! The accessors that are macros in the interpreter's headers get a
//! `_wrapper` export name so they do not clash with the real functions of
//! the same name; the rest are exported under their macro name.

use std::ffi::c_void;

use super::scm::Scm;

/// Traps on non-pairs.
#[export_name = "scm_car_wrapper"]
pub extern "C" fn scm_car(obj: Scm) -> Scm {
    obj.car()
}

/// Traps on non-pairs.
#[export_name = "scm_cdr_wrapper"]
pub extern "C" fn scm_cdr(obj: Scm) -> Scm {
    obj.cdr()
}

#[export_name = "scm_is_true_wrapper"]
pub extern "C" fn scm_is_true(obj: Scm) -> bool {
    obj.is_true()
}

#[export_name = "scm_is_false_wrapper"]
pub extern "C" fn scm_is_false(obj: Scm) -> bool {
    obj.is_false()
}

#[no_mangle]
pub extern "C" fn scm_is_null(obj: Scm) -> bool {
    obj.is_null()
}

#[no_mangle]
pub extern "C" fn scm_is_symbol(obj: Scm) -> bool {
    obj.is_symbol()
}

#[no_mangle]
pub extern "C" fn scm_from_bool(b: bool) -> Scm {
    Scm::from_bool(b)
}

/// Release a buffer handed out by the runtime, e.g. by
/// `scm_to_utf8_stringn`.
///
/// # Safety
/// `ptr` must be null or a block from the C allocator not yet freed.
#[no_mangle]
pub unsafe extern "C" fn wrapper_free(ptr: *mut c_void) {
    libc::free(ptr);
}
