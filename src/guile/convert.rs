//! Typed extraction for the implicit-context backend.
//!
//! These mirror the `conv_*` helpers of the context-threaded backend. Only
//! [`assq_str`] allocates, so it is the only one that takes the instance.

use std::ffi::{c_void, CStr};
use std::fmt::Display;

use num_traits::ToPrimitive;

use super::runtime::{
    object_to_string, scm_assq, scm_is_bool, scm_is_integer, scm_is_real, scm_list_p, scm_pair_p,
    scm_string_p, scm_to_double, scm_to_utf8_stringn, Guile,
};
use super::scm::Scm;
use super::shim::wrapper_free;
use crate::error::{Result, ShimError};
use crate::number::Number;

pub fn form_to_string(obj: Scm) -> String {
    object_to_string(obj)
}

fn data_error(expected: &str, obj: Scm) -> ShimError {
    ShimError::data(format!("Expected {}, found {}", expected, form_to_string(obj)))
}

/// Value bound to `key` in a `(key . val)` association list. `key` is
/// interned in `g`, which must be the instance that owns `alist`.
pub fn assq_str(g: &Guile, key: &str, alist: Scm) -> Result<Option<Scm>> {
    if scm_pair_p(alist).is_false() {
        return Err(ShimError::data(format!("Not an alist: {}", form_to_string(alist))));
    }
    let key = g.from_utf8_symbol(key);
    let res = scm_assq(key, alist);
    if scm_is_bool(res) {
        Ok(None)
    } else {
        Ok(Some(res.cdr()))
    }
}

pub fn parse_int<T>(obj: Scm) -> Result<T>
where
    T: TryFrom<i64>,
    <T as TryFrom<i64>>::Error: Display,
{
    if !scm_is_integer(obj) {
        return Err(data_error("integer", obj));
    }
    let n = obj
        .number()
        .and_then(|n| match n {
            Number::Integer(i) => i.to_i64(),
            _ => None,
        })
        .ok_or_else(|| ShimError::data(format!("Integer out of range: {}", form_to_string(obj))))?;
    T::try_from(n).map_err(|err| ShimError::data(err.to_string()))
}

pub fn parse_f64(obj: Scm) -> Result<f64> {
    if !scm_is_real(obj) {
        return Err(data_error("floating point number", obj));
    }
    Ok(scm_to_double(obj))
}

pub fn parse_f32(obj: Scm) -> Result<f32> {
    parse_f64(obj).map(|val| val as f32)
}

pub fn parse_bool(obj: Scm) -> Result<bool> {
    if !scm_is_bool(obj) {
        return Err(data_error("boolean", obj));
    }
    Ok(obj.is_true())
}

pub fn parse_string(obj: Scm) -> Result<String> {
    if scm_string_p(obj).is_false() {
        return Err(data_error("string", obj));
    }
    let raw = scm_to_utf8_stringn(obj, None);
    // SAFETY: `raw` is a NUL-terminated malloc block owned by us until freed.
    let out = unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned();
    unsafe { wrapper_free(raw as *mut c_void) };
    Ok(out)
}

pub fn parse_symbol(obj: Scm) -> Result<String> {
    obj.symbol_name()
        .map(str::to_string)
        .ok_or_else(|| data_error("symbol", obj))
}

/// Iterator over the elements of a proper list.
pub struct SchemeListIterator {
    cursor: Scm,
}

impl Iterator for SchemeListIterator {
    type Item = Scm;

    fn next(&mut self) -> Option<Scm> {
        let (car, cdr) = self.cursor.as_pair()?;
        self.cursor = cdr;
        Some(car)
    }
}

pub fn iter_list(list: Scm) -> Result<SchemeListIterator> {
    if scm_list_p(list).is_false() {
        return Err(ShimError::data(format!("Not a list: {}", form_to_string(list))));
    }
    Ok(SchemeListIterator { cursor: list })
}

pub use crate::chibi::util::CxrOp;

pub fn cxr(pair: Scm, ops: &[CxrOp]) -> Result<Scm> {
    ops.iter().try_fold(pair, |cursor, op| match (cursor.as_pair(), op) {
        (Some((car, _)), CxrOp::Car) => Ok(car),
        (Some((_, cdr)), CxrOp::Cdr) => Ok(cdr),
        (None, _) => Err(ShimError::data(format!(
            "Not a pair, cannot do car/cdr: {}",
            form_to_string(cursor)
        ))),
    })
}
