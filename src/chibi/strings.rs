//! Strings, symbols, bytevectors and vectors.
//!
//! Strings are stored as UTF-8 followed by a NUL so that `string_data` can
//! hand out a C string. Indices count characters; cursors are byte offsets.
//!
//! Context-taking operations report bad input as exception values. The
//! context-free accessors (`vector_ref`, `bytes_set`, ...) panic instead.

use std::cell::RefCell;
use std::ffi::c_char;

use super::context::Context;
use super::exception::Condition;
use super::heap::HeapObject;
use super::sexp::{Sexp, SEXP_MAX_FIXNUM};

fn string_cell(s: Sexp) -> Option<&'static RefCell<Vec<u8>>> {
    match s.object() {
        Some(HeapObject::String(bytes)) => Some(bytes),
        _ => None,
    }
}

fn bytes_cell(bv: Sexp) -> Option<&'static RefCell<Vec<u8>>> {
    match bv.object() {
        Some(HeapObject::Bytes(bytes)) => Some(bytes),
        _ => None,
    }
}

fn vector_cell(v: Sexp) -> Option<&'static RefCell<Vec<Sexp>>> {
    match v.object() {
        Some(HeapObject::Vector(items)) => Some(items),
        _ => None,
    }
}

/// Non-negative fixnum as an index.
fn index(i: Sexp) -> Option<usize> {
    if i.is_fixnum() {
        usize::try_from(i.unbox_fixnum()).ok()
    } else {
        None
    }
}

/// Byte offset from a string cursor (or a fixnum).
fn cursor(c: Sexp) -> Option<usize> {
    if c.is_string_cursor() {
        usize::try_from(c.unbox_string_cursor()).ok()
    } else {
        index(c)
    }
}

/// Contents without the terminator.
fn body(bytes: &[u8]) -> &[u8] {
    &bytes[..bytes.len() - 1]
}

/// Byte range of character `k`.
fn char_range(text: &str, k: usize) -> Option<(usize, usize)> {
    text.char_indices()
        .nth(k)
        .map(|(start, c)| (start, start + c.len_utf8()))
}

fn with_nul(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len() + 1);
    bytes.extend_from_slice(text.as_bytes());
    bytes.push(0);
    bytes
}

/// `len` copies of `fill`, or `None` when the allocation cannot be made.
fn filled<T: Clone>(len: usize, fill: T) -> Option<Vec<T>> {
    let mut items = Vec::new();
    items.try_reserve_exact(len).ok()?;
    items.resize(len, fill);
    Some(items)
}

fn utf8_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

impl Context {
    pub fn c_string(&self, text: &str) -> Sexp {
        self.alloc(HeapObject::String(RefCell::new(with_nul(text))))
    }

    pub fn make_string(&self, len: usize, fill: char) -> Sexp {
        let mut buf = [0u8; 4];
        let unit: &str = fill.encode_utf8(&mut buf);
        let unit = unit.as_bytes();
        let Some(mut bytes) = len
            .checked_mul(unit.len())
            .and_then(|size| size.checked_add(1))
            .and_then(|size| filled(size, 0u8))
        else {
            return self.out_of_memory(len);
        };
        for chunk in bytes[..len * unit.len()].chunks_exact_mut(unit.len()) {
            chunk.copy_from_slice(unit);
        }
        self.alloc(HeapObject::String(RefCell::new(bytes)))
    }

    fn out_of_memory(&self, len: usize) -> Sexp {
        let requested = Sexp::make_fixnum(len.min(SEXP_MAX_FIXNUM as usize) as isize);
        self.raise(Condition::out_of_memory(requested))
    }

    pub fn string_ref(&self, s: Sexp, i: Sexp) -> Sexp {
        let Some(bytes) = string_cell(s) else {
            return self.type_exception(Sexp::FALSE, "string", s);
        };
        let Some(k) = index(i) else {
            return self.type_exception(Sexp::FALSE, "fixnum", i);
        };
        let bytes = bytes.borrow();
        let text = String::from_utf8_lossy(body(&bytes));
        match text.chars().nth(k) {
            Some(c) => Sexp::make_character(c as u32),
            None => {
                let len = Sexp::make_fixnum(text.chars().count() as isize);
                self.range_exception(s, i, len)
            }
        }
    }

    pub fn string_set(&self, s: Sexp, i: Sexp, ch: Sexp) -> Sexp {
        let Some(cell) = string_cell(s) else {
            return self.type_exception(Sexp::FALSE, "string", s);
        };
        let Some(k) = index(i) else {
            return self.type_exception(Sexp::FALSE, "fixnum", i);
        };
        let Some(c) = ch.as_char() else {
            return self.type_exception(Sexp::FALSE, "char", ch);
        };
        let range = {
            let bytes = cell.borrow();
            let text = String::from_utf8_lossy(body(&bytes)).into_owned();
            char_range(&text, k).ok_or(text.chars().count())
        };
        match range {
            Ok((start, end)) => {
                let mut buf = [0u8; 4];
                cell.borrow_mut()
                    .splice(start..end, c.encode_utf8(&mut buf).bytes());
                Sexp::VOID
            }
            Err(len) => self.range_exception(s, i, Sexp::make_fixnum(len as isize)),
        }
    }

    /// Character starting at byte cursor `c`.
    pub fn string_cursor_ref(&self, s: Sexp, c: Sexp) -> Sexp {
        let Some(cell) = string_cell(s) else {
            return self.type_exception(Sexp::FALSE, "string", s);
        };
        let Some(off) = cursor(c) else {
            return self.type_exception(Sexp::FALSE, "string-cursor", c);
        };
        let decoded = {
            let bytes = cell.borrow();
            std::str::from_utf8(body(&bytes))
                .ok()
                .filter(|text| off < text.len() && text.is_char_boundary(off))
                .and_then(|text| text[off..].chars().next())
        };
        match decoded {
            Some(ch) => Sexp::make_character(ch as u32),
            None => {
                let size = Sexp::make_string_cursor(string_size(s) as isize);
                self.range_exception(s, c, size)
            }
        }
    }

    /// Replace the character starting at byte cursor `c`.
    pub fn string_cursor_set(&self, s: Sexp, c: Sexp, ch: Sexp) -> Sexp {
        let Some(cell) = string_cell(s) else {
            return self.type_exception(Sexp::FALSE, "string", s);
        };
        let Some(off) = cursor(c) else {
            return self.type_exception(Sexp::FALSE, "string-cursor", c);
        };
        let Some(new) = ch.as_char() else {
            return self.type_exception(Sexp::FALSE, "char", ch);
        };
        let old_width = {
            let bytes = cell.borrow();
            std::str::from_utf8(body(&bytes))
                .ok()
                .filter(|text| off < text.len() && text.is_char_boundary(off))
                .and_then(|text| text[off..].chars().next())
                .map(char::len_utf8)
        };
        match old_width {
            Some(width) => {
                let mut buf = [0u8; 4];
                cell.borrow_mut()
                    .splice(off..off + width, new.encode_utf8(&mut buf).bytes());
                Sexp::VOID
            }
            None => {
                let size = Sexp::make_string_cursor(string_size(s) as isize);
                self.range_exception(s, c, size)
            }
        }
    }

    /// Characters `i..j`; `j` of `#f` means the end of the string.
    pub fn substring(&self, s: Sexp, i: Sexp, j: Sexp) -> Sexp {
        let Some(cell) = string_cell(s) else {
            return self.type_exception(Sexp::FALSE, "string", s);
        };
        let text = String::from_utf8_lossy(body(&cell.borrow())).into_owned();
        let len = text.chars().count();
        let start = index(i);
        let end = if j == Sexp::FALSE { Some(len) } else { index(j) };
        match (start, end) {
            (Some(start), Some(end)) if start <= end && end <= len => {
                let sub: String = text.chars().skip(start).take(end - start).collect();
                self.c_string(&sub)
            }
            _ => self.range_exception(s, i, j),
        }
    }

    /// Bytes between two cursors; `j` of `#f` means the end of the string.
    pub fn substring_cursor(&self, s: Sexp, i: Sexp, j: Sexp) -> Sexp {
        let Some(cell) = string_cell(s) else {
            return self.type_exception(Sexp::FALSE, "string", s);
        };
        let sub = {
            let bytes = cell.borrow();
            let start = cursor(i);
            let end = if j == Sexp::FALSE {
                Some(bytes.len() - 1)
            } else {
                cursor(j)
            };
            std::str::from_utf8(body(&bytes)).ok().and_then(|text| match (start, end) {
                (Some(a), Some(b)) if a <= b => text.get(a..b).map(str::to_owned),
                _ => None,
            })
        };
        match sub {
            Some(sub) => self.c_string(&sub),
            None => self.range_exception(s, i, j),
        }
    }

    pub fn symbol_to_string(&self, sym: Sexp) -> Sexp {
        match sym.symbol_name() {
            Some(name) => self.c_string(name),
            None => self.type_exception(Sexp::FALSE, "symbol", sym),
        }
    }

    pub fn string_to_symbol(&self, s: Sexp) -> Sexp {
        match s.string_value() {
            Some(text) => self.intern(&text),
            None => self.type_exception(Sexp::FALSE, "string", s),
        }
    }

    pub fn make_bytes(&self, len: usize, fill: u8) -> Sexp {
        match filled(len, fill) {
            Some(bytes) => self.alloc(HeapObject::Bytes(RefCell::new(bytes))),
            None => self.out_of_memory(len),
        }
    }

    pub fn bytes_from(&self, data: &[u8]) -> Sexp {
        self.alloc(HeapObject::Bytes(RefCell::new(data.to_vec())))
    }

    pub fn make_vector(&self, len: usize, fill: Sexp) -> Sexp {
        match filled(len, fill) {
            Some(items) => self.alloc(HeapObject::Vector(RefCell::new(items))),
            None => self.out_of_memory(len),
        }
    }

    pub fn vector_from(&self, items: Vec<Sexp>) -> Sexp {
        self.alloc(HeapObject::Vector(RefCell::new(items)))
    }
}

// =============================================================================
// Context-free accessors
// =============================================================================

/// Pointer to the NUL-terminated UTF-8 contents. Valid until the string is
/// resized by a mutation or collected.
pub fn string_data(s: Sexp) -> *mut c_char {
    match string_cell(s) {
        Some(cell) => cell.borrow_mut().as_mut_ptr() as *mut c_char,
        None => panic!("string-data: not a string: {:?}", s),
    }
}

/// Size in bytes, excluding the terminator.
pub fn string_size(s: Sexp) -> usize {
    match string_cell(s) {
        Some(cell) => cell.borrow().len() - 1,
        None => panic!("string-size: not a string: {:?}", s),
    }
}

/// Length in characters.
pub fn string_length(s: Sexp) -> usize {
    match string_cell(s) {
        Some(cell) => String::from_utf8_lossy(body(&cell.borrow())).chars().count(),
        None => panic!("string-length: not a string: {:?}", s),
    }
}

/// Cursor just past the character starting at `c`.
pub fn string_cursor_next(s: Sexp, c: Sexp) -> Sexp {
    let Some(cell) = string_cell(s) else {
        panic!("string-cursor-next: not a string: {:?}", s);
    };
    let bytes = cell.borrow();
    match cursor(c) {
        Some(off) if off < bytes.len() - 1 => {
            Sexp::make_string_cursor((off + utf8_width(bytes[off])) as isize)
        }
        _ => panic!("string-cursor-next: cursor out of range: {:?}", c),
    }
}

/// Cursor at the start of the character before `c`.
pub fn string_cursor_prev(s: Sexp, c: Sexp) -> Sexp {
    let Some(cell) = string_cell(s) else {
        panic!("string-cursor-prev: not a string: {:?}", s);
    };
    let bytes = cell.borrow();
    match cursor(c) {
        Some(off) if off > 0 && off < bytes.len() => {
            let mut prev = off - 1;
            while prev > 0 && bytes[prev] & 0xC0 == 0x80 {
                prev -= 1;
            }
            Sexp::make_string_cursor(prev as isize)
        }
        _ => panic!("string-cursor-prev: cursor out of range: {:?}", c),
    }
}

pub fn bytes_length(bv: Sexp) -> usize {
    match bytes_cell(bv) {
        Some(cell) => cell.borrow().len(),
        None => panic!("bytes-length: not a bytevector: {:?}", bv),
    }
}

pub fn bytes_data(bv: Sexp) -> *mut c_char {
    match bytes_cell(bv) {
        Some(cell) => cell.borrow_mut().as_mut_ptr() as *mut c_char,
        None => panic!("bytes-data: not a bytevector: {:?}", bv),
    }
}

pub fn bytes_ref(bv: Sexp, i: Sexp) -> Sexp {
    let Some(cell) = bytes_cell(bv) else {
        panic!("bytes-ref: not a bytevector: {:?}", bv);
    };
    match index(i).and_then(|k| cell.borrow().get(k).copied()) {
        Some(b) => Sexp::make_fixnum(b as isize),
        None => panic!("bytes-ref: index out of range: {:?}", i),
    }
}

pub fn bytes_set(bv: Sexp, i: Sexp, obj: Sexp) -> Sexp {
    let Some(cell) = bytes_cell(bv) else {
        panic!("bytes-set!: not a bytevector: {:?}", bv);
    };
    let byte = if obj.is_fixnum() {
        u8::try_from(obj.unbox_fixnum()).ok()
    } else {
        None
    };
    let Some(byte) = byte else {
        panic!("bytes-set!: not a byte: {:?}", obj);
    };
    match index(i).and_then(|k| cell.borrow_mut().get_mut(k).map(|slot| *slot = byte)) {
        Some(()) => Sexp::VOID,
        None => panic!("bytes-set!: index out of range: {:?}", i),
    }
}

pub fn vector_length(v: Sexp) -> usize {
    match vector_cell(v) {
        Some(items) => items.borrow().len(),
        None => panic!("vector-length: not a vector: {:?}", v),
    }
}

pub fn vector_ref(v: Sexp, i: Sexp) -> Sexp {
    let Some(items) = vector_cell(v) else {
        panic!("vector-ref: not a vector: {:?}", v);
    };
    match index(i).and_then(|k| items.borrow().get(k).copied()) {
        Some(x) => x,
        None => panic!("vector-ref: index out of range: {:?}", i),
    }
}

pub fn vector_set(v: Sexp, i: Sexp, obj: Sexp) -> Sexp {
    let Some(items) = vector_cell(v) else {
        panic!("vector-set!: not a vector: {:?}", v);
    };
    match index(i).and_then(|k| items.borrow_mut().get_mut(k).map(|slot| *slot = obj)) {
        Some(()) => Sexp::VOID,
        None => panic!("vector-set!: index out of range: {:?}", i),
    }
}

/// Copy of a vector's elements.
pub fn vector_items(v: Sexp) -> Option<Vec<Sexp>> {
    vector_cell(v).map(|items| items.borrow().clone())
}

/// Copy of a bytevector's contents.
pub fn bytes_value(bv: Sexp) -> Option<Vec<u8>> {
    bytes_cell(bv).map(|cell| cell.borrow().clone())
}

#[cfg(test)]
mod tests {
    use super::super::context::{destroy_context, ContextConfig};
    use super::*;
    use std::ffi::CStr;

    fn fx(n: isize) -> Sexp {
        Sexp::make_fixnum(n)
    }

    fn with_context(f: impl FnOnce(&Context)) {
        let ctx = Context::make_eval_context(ContextConfig::default());
        f(unsafe { Context::from_sexp(ctx) });
        unsafe { destroy_context(ctx) };
    }

    #[test]
    fn test_string_data_is_nul_terminated() {
        with_context(|c| {
            let s = c.c_string("héllo");
            let text = unsafe { CStr::from_ptr(string_data(s)) };
            assert_eq!(text.to_str().unwrap(), "héllo");
            assert_eq!(string_size(s), 6);
            assert_eq!(string_length(s), 5);
        });
    }

    #[test]
    fn test_string_ref_and_set_by_character() {
        with_context(|c| {
            let s = c.c_string("héllo");
            assert_eq!(c.string_ref(s, fx(1)).as_char(), Some('é'));
            assert_eq!(c.string_set(s, fx(1), Sexp::make_character('e' as u32)), Sexp::VOID);
            assert_eq!(s.string_value().as_deref(), Some("hello"));
            assert_eq!(string_size(s), 5);
        });
    }

    #[test]
    fn test_string_ref_out_of_range_is_exception() {
        with_context(|c| {
            let s = c.c_string("ab");
            assert!(c.string_ref(s, fx(2)).is_exception());
            assert!(c.string_set(s, fx(9), Sexp::make_character('x' as u32)).is_exception());
            assert!(c.string_ref(fx(1), fx(0)).is_exception());
        });
    }

    #[test]
    fn test_cursor_walk() {
        with_context(|c| {
            let s = c.c_string("aλb");
            let start = Sexp::make_string_cursor(0);
            let second = string_cursor_next(s, start);
            assert_eq!(second.unbox_string_cursor(), 1);
            assert_eq!(c.string_cursor_ref(s, second).as_char(), Some('λ'));
            let third = string_cursor_next(s, second);
            assert_eq!(third.unbox_string_cursor(), 3);
            assert_eq!(string_cursor_prev(s, third), second);
            assert!(c.string_cursor_ref(s, Sexp::make_string_cursor(2)).is_exception());
        });
    }

    #[test]
    fn test_cursor_set_changes_width() {
        with_context(|c| {
            let s = c.c_string("abc");
            c.string_cursor_set(s, Sexp::make_string_cursor(1), Sexp::make_character('λ' as u32));
            assert_eq!(s.string_value().as_deref(), Some("aλc"));
        });
    }

    #[test]
    fn test_substring() {
        with_context(|c| {
            let s = c.c_string("hello world");
            let sub = c.substring(s, fx(6), Sexp::FALSE);
            assert_eq!(sub.string_value().as_deref(), Some("world"));
            let sub = c.substring(s, fx(0), fx(5));
            assert_eq!(sub.string_value().as_deref(), Some("hello"));
            assert!(c.substring(s, fx(3), fx(2)).is_exception());
            assert!(c.substring(s, fx(0), fx(40)).is_exception());
        });
    }

    #[test]
    fn test_substring_cursor() {
        with_context(|c| {
            let s = c.c_string("aλb");
            let sub = c.substring_cursor(s, Sexp::make_string_cursor(1), Sexp::make_string_cursor(3));
            assert_eq!(sub.string_value().as_deref(), Some("λ"));
            assert!(c
                .substring_cursor(s, Sexp::make_string_cursor(2), Sexp::FALSE)
                .is_exception());
        });
    }

    #[test]
    fn test_symbol_string_conversion() {
        with_context(|c| {
            let sym = c.intern("abc");
            let s = c.symbol_to_string(sym);
            assert_eq!(s.string_value().as_deref(), Some("abc"));
            assert_eq!(c.string_to_symbol(s), sym);
            assert!(c.symbol_to_string(s).is_exception());
        });
    }

    #[test]
    fn test_bytes() {
        with_context(|c| {
            let bv = c.make_bytes(3, 7);
            assert_eq!(bytes_length(bv), 3);
            assert_eq!(bytes_ref(bv, fx(2)), fx(7));
            assert_eq!(bytes_set(bv, fx(0), fx(255)), Sexp::VOID);
            assert_eq!(unsafe { *bytes_data(bv) } as u8, 255);
        });
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_vector_ref_traps_out_of_range() {
        let ctx = Context::make_eval_context(ContextConfig::default());
        let c = unsafe { Context::from_sexp(ctx) };
        let v = c.make_vector(2, Sexp::NULL);
        vector_ref(v, fx(2));
    }

    #[test]
    fn test_vector_set() {
        with_context(|c| {
            let v = c.make_vector(2, Sexp::FALSE);
            assert_eq!(vector_set(v, fx(1), fx(9)), Sexp::VOID);
            assert_eq!(vector_ref(v, fx(1)), fx(9));
            assert_eq!(vector_ref(v, fx(0)), Sexp::FALSE);
        });
    }
}
