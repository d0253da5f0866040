//! Host-side helpers for the context-threaded backend.
//!
//! [`ChibiContext`] owns a context for its lifetime and [`ChibiVar`] keeps a
//! value alive across collections. The `conv_*` family turns interpreter
//! data into Rust values, reporting shape mismatches as [`ShimError::Data`].

use std::cell::Cell;
use std::fmt::Display;
use std::io::Write;
use std::marker::PhantomData;
use std::pin::Pin;

use super::context::{destroy_context, Context, ContextConfig};
use super::sexp::Sexp;
use super::writer::{render, WriteMode};
use crate::error::{Result, ShimError};

/// Exception values become `Err`.
pub fn wrap_result(obj: Sexp) -> std::result::Result<Sexp, Sexp> {
    if obj.is_exception() {
        Err(obj)
    } else {
        Ok(obj)
    }
}

/// Write `obj` in reader syntax.
pub fn write_sexp<W: Write>(writer: &mut W, obj: Sexp) -> std::io::Result<()> {
    write!(writer, "{}", render(obj, WriteMode::Write))
}

pub fn form_to_string(obj: Sexp) -> String {
    render(obj, WriteMode::Write)
}

pub struct ChibiContext {
    pub c: Sexp,
    _not_send: PhantomData<*const ()>,
}

impl ChibiContext {
    /// Context with the standard environment loaded, configured from the
    /// process environment.
    pub fn new() -> Result<ChibiContext> {
        ChibiContext::with_config(ContextConfig::from_env())
    }

    pub fn with_config(config: ContextConfig) -> Result<ChibiContext> {
        let version = config.scheme_version;
        let ctx = ChibiContext {
            c: Context::make_eval_context(config),
            _not_send: PhantomData,
        };
        let c = ctx.context();
        let res = c.load_standard_env(c.env(), Sexp::make_fixnum(version as isize));
        if res.is_exception() {
            return Err(ShimError::Init(c.exception_report(res)));
        }
        Ok(ctx)
    }

    pub fn context(&self) -> &Context {
        // SAFETY: the handle stays live until `drop`.
        unsafe { Context::from_sexp(self.c) }
    }

    /// Turn an exception value into `ShimError::Exception`.
    pub fn catch_err(&self, obj: Sexp) -> Result<Sexp> {
        wrap_result(obj).map_err(|exn| ShimError::Exception(self.context().exception_report(exn)))
    }

    /// Root `val` for as long as the returned guard lives.
    pub fn make_var(&self, val: Sexp) -> ChibiVar<'_> {
        let var = Box::pin(Cell::new(val));
        // SAFETY: the pinned slot outlives its registration; `ChibiVar::drop`
        // unregisters it before the box is freed.
        unsafe { self.context().register_root(&*var) };
        ChibiVar { var, context: self }
    }

    /// Read the first datum of `text`.
    pub fn read_str(&self, text: &str) -> Result<Sexp> {
        let c = self.context();
        let port = self.make_var(c.open_input_string(c.c_string(text)));
        self.catch_err(c.read(port.get()))
    }
}

impl Drop for ChibiContext {
    fn drop(&mut self) {
        // SAFETY: this wrapper owns the handle and nothing uses it afterwards.
        unsafe { destroy_context(self.c) };
    }
}

/// A GC root slot owned by the host.
pub struct ChibiVar<'ctx> {
    var: Pin<Box<Cell<Sexp>>>,
    context: &'ctx ChibiContext,
}

impl ChibiVar<'_> {
    pub fn set(&mut self, val: Sexp) {
        self.var.as_ref().get_ref().set(val);
    }

    pub fn get(&self) -> Sexp {
        self.var.get()
    }
}

impl Drop for ChibiVar<'_> {
    fn drop(&mut self) {
        self.context.context().unregister_root(&*self.var);
    }
}

// =============================================================================
// Typed extraction
// =============================================================================

fn data_error(expected: &str, obj: Sexp) -> ShimError {
    ShimError::data(format!("Expected {}, found {}", expected, form_to_string(obj)))
}

/// Value bound to `key` in an association list. Accepts both `(key . val)`
/// and `(key val)` entries.
pub fn assq_str(ctx: &ChibiContext, key: &str, alist: Sexp) -> Result<Option<Sexp>> {
    if !alist.is_pair() {
        return Err(ShimError::data(format!("Not an alist: {}", form_to_string(alist))));
    }
    let c = ctx.context();
    let entry = c.assq(c.intern(key), alist);
    match entry.as_pair() {
        None => Ok(None),
        Some((_, rest)) => match rest.as_pair() {
            Some((val, _)) => Ok(Some(val)),
            None => Ok(Some(rest)),
        },
    }
}

pub fn conv_int<T>(obj: Sexp) -> Result<T>
where
    T: TryFrom<i64>,
    <T as TryFrom<i64>>::Error: Display,
{
    if !obj.is_fixnum() {
        return Err(data_error("integer", obj));
    }
    T::try_from(obj.unbox_fixnum() as i64).map_err(|err| ShimError::data(err.to_string()))
}

pub fn conv_f64(obj: Sexp) -> Result<f64> {
    obj.flonum_value()
        .ok_or_else(|| data_error("floating point number", obj))
}

pub fn conv_f32(obj: Sexp) -> Result<f32> {
    conv_f64(obj).map(|val| val as f32)
}

pub fn conv_bool(obj: Sexp) -> Result<bool> {
    if !obj.is_boolean() {
        return Err(data_error("boolean", obj));
    }
    Ok(obj.unbox_boolean())
}

pub fn conv_string(obj: Sexp) -> Result<String> {
    obj.string_value().ok_or_else(|| data_error("string", obj))
}

pub fn conv_symbol(obj: Sexp) -> Result<String> {
    obj.symbol_name()
        .map(str::to_string)
        .ok_or_else(|| data_error("symbol", obj))
}

/// Iterator over the elements of a proper list.
pub struct SchemeListIterator<'ctx> {
    _list: ChibiVar<'ctx>,
    cursor: Sexp,
}

impl Iterator for SchemeListIterator<'_> {
    type Item = Sexp;

    fn next(&mut self) -> Option<Sexp> {
        let (car, cdr) = self.cursor.as_pair()?;
        self.cursor = cdr;
        Some(car)
    }
}

pub fn iter_list(ctx: &ChibiContext, list: Sexp) -> Result<SchemeListIterator<'_>> {
    if !ctx.context().listp(list).is_true() {
        return Err(ShimError::data(format!("Not a list: {}", form_to_string(list))));
    }
    Ok(SchemeListIterator {
        _list: ctx.make_var(list),
        cursor: list,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CxrOp {
    Car,
    Cdr,
}

/// Apply a sequence of car/cdr steps.
pub fn cxr(pair: Sexp, ops: &[CxrOp]) -> Result<Sexp> {
    ops.iter().try_fold(pair, |cursor, op| match (cursor.as_pair(), op) {
        (Some((car, _)), CxrOp::Car) => Ok(car),
        (Some((_, cdr)), CxrOp::Cdr) => Ok(cdr),
        (None, _) => Err(ShimError::data(format!(
            "Not a pair, cannot do car/cdr: {}",
            form_to_string(cursor)
        ))),
    })
}

/// A datum converted according to a type description.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    String(String),
    Tuple(Vec<TypedValue>),
    Vec(Vec<TypedValue>),
}

/// Convert `data` as described by `item_type`: one of the symbols `u8`
/// through `i64`, `f32`, `f64`, `bool`, `string`; a list of types for a
/// tuple; or `(vec <type>)` for a homogeneous list.
pub fn parse_typed_value(ctx: &ChibiContext, item_type: Sexp, data: Sexp) -> Result<TypedValue> {
    if let Some(name) = item_type.symbol_name() {
        return Ok(match name {
            "u8" => TypedValue::U8(conv_int(data)?),
            "u16" => TypedValue::U16(conv_int(data)?),
            "u32" => TypedValue::U32(conv_int(data)?),
            "u64" => TypedValue::U64(conv_int(data)?),
            "i8" => TypedValue::I8(conv_int(data)?),
            "i16" => TypedValue::I16(conv_int(data)?),
            "i32" => TypedValue::I32(conv_int(data)?),
            "i64" => TypedValue::I64(conv_int(data)?),
            "f32" => TypedValue::F32(conv_f32(data)?),
            "f64" => TypedValue::F64(conv_f64(data)?),
            "bool" => TypedValue::Bool(conv_bool(data)?),
            "string" => TypedValue::String(conv_string(data)?),
            other => return Err(ShimError::data(format!("Unknown data type: {}", other))),
        });
    }
    if !ctx.context().listp(item_type).is_true() || item_type.is_null() {
        return Err(ShimError::data(format!(
            "Unsupported item type: {}",
            form_to_string(item_type)
        )));
    }
    if item_type.car().symbol_name() == Some("vec") {
        let elem = cxr(item_type, &[CxrOp::Cdr, CxrOp::Car])?;
        let items = iter_list(ctx, data)?
            .map(|item| parse_typed_value(ctx, elem, item))
            .collect::<Result<_>>()?;
        return Ok(TypedValue::Vec(items));
    }
    let c = ctx.context();
    if c.length(item_type) != c.length(data) {
        return Err(ShimError::data(
            "Tuple definition has differing number of types and values.",
        ));
    }
    let items = iter_list(ctx, item_type)?
        .zip(iter_list(ctx, data)?)
        .map(|(t, v)| parse_typed_value(ctx, t, v))
        .collect::<Result<_>>()?;
    Ok(TypedValue::Tuple(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ChibiContext {
        ChibiContext::with_config(ContextConfig::default()).unwrap()
    }

    #[test]
    fn test_chibi_var() {
        let ctx = ctx();
        let c = ctx.context();
        let var1 = ctx.make_var(c.cons(Sexp::make_fixnum(5), Sexp::make_fixnum(10)));
        let var2 = ctx.make_var(c.cons(Sexp::make_fixnum(15), Sexp::make_fixnum(20)));
        let mut sum_freed = 0;
        ctx.catch_err(c.gc(Some(&mut sum_freed))).unwrap();
        ctx.catch_err(c.gc(Some(&mut sum_freed))).unwrap();
        assert_eq!(sum_freed, 0);
        assert_eq!(var1.get().car(), Sexp::make_fixnum(5));

        drop(var1);
        c.gc(Some(&mut sum_freed));
        assert_ne!(sum_freed, 0);
        drop(var2);
        c.gc(Some(&mut sum_freed));
        assert_ne!(sum_freed, 0);
    }

    #[test]
    fn test_var_set() {
        let ctx = ctx();
        let c = ctx.context();
        let mut var = ctx.make_var(Sexp::NULL);
        var.set(c.c_string("kept"));
        c.gc(None);
        assert_eq!(var.get().string_value().as_deref(), Some("kept"));
    }

    #[test]
    fn test_write_sexp() {
        let ctx = ctx();
        let datum = ctx.read_str("(a \"b\" 1.5)").unwrap();
        let mut out = Vec::new();
        write_sexp(&mut out, datum).unwrap();
        assert_eq!(out, b"(a \"b\" 1.5)");
    }

    #[test]
    fn test_catch_err() {
        let ctx = ctx();
        let exn = ctx.context().user_exception(Sexp::FALSE, "nope", Sexp::NULL);
        match ctx.catch_err(exn) {
            Err(ShimError::Exception(report)) => assert_eq!(report, "ERROR: nope"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(ctx.read_str("(1").is_err());
    }

    #[test]
    fn test_assq_str() {
        let ctx = ctx();
        let alist = ctx.read_str("((a 1) (b 2) (c . 3) (d 4))").unwrap();
        assert_eq!(assq_str(&ctx, "b", alist).unwrap(), Some(Sexp::make_fixnum(2)));
        assert_eq!(assq_str(&ctx, "c", alist).unwrap(), Some(Sexp::make_fixnum(3)));
        assert_eq!(assq_str(&ctx, "e", alist).unwrap(), None);
        assert!(assq_str(&ctx, "a", Sexp::make_fixnum(15)).is_err());
    }

    #[test]
    fn test_conversions() {
        let ctx = ctx();
        let c = ctx.context();
        assert_eq!(conv_int::<u8>(Sexp::make_fixnum(200)).unwrap(), 200);
        assert!(conv_int::<u8>(Sexp::make_fixnum(300)).is_err());
        assert!(conv_int::<i32>(Sexp::TRUE).is_err());
        assert_eq!(conv_f64(c.make_flonum(2.5)).unwrap(), 2.5);
        assert_eq!(conv_bool(Sexp::FALSE).unwrap(), false);
        assert_eq!(conv_string(c.c_string("s")).unwrap(), "s");
        assert_eq!(conv_symbol(c.intern("sym")).unwrap(), "sym");
        assert!(conv_symbol(c.c_string("sym")).is_err());
    }

    #[test]
    fn test_iter_list_and_cxr() {
        let ctx = ctx();
        let ls = ctx.read_str("(1 (2 3))").unwrap();
        let items: Vec<_> = iter_list(&ctx, ls).unwrap().collect();
        assert_eq!(items.len(), 2);
        let three = cxr(ls, &[CxrOp::Cdr, CxrOp::Car, CxrOp::Cdr, CxrOp::Car]).unwrap();
        assert_eq!(three, Sexp::make_fixnum(3));
        assert!(cxr(Sexp::NULL, &[CxrOp::Car]).is_err());
        assert!(iter_list(&ctx, Sexp::make_fixnum(1)).is_err());
    }

    #[test]
    fn test_parse_typed_value() {
        let ctx = ctx();
        let t = ctx.read_str("(u8 (vec string) bool)").unwrap();
        let v = ctx.read_str("(7 (\"a\" \"b\") #t)").unwrap();
        assert_eq!(
            parse_typed_value(&ctx, t, v).unwrap(),
            TypedValue::Tuple(vec![
                TypedValue::U8(7),
                TypedValue::Vec(vec![
                    TypedValue::String("a".to_string()),
                    TypedValue::String("b".to_string()),
                ]),
                TypedValue::Bool(true),
            ])
        );

        let short = ctx.read_str("(7)").unwrap();
        assert!(parse_typed_value(&ctx, t, short).is_err());
        let unknown = ctx.read_str("u128").unwrap();
        assert!(parse_typed_value(&ctx, unknown, Sexp::ZERO).is_err());
    }
}
