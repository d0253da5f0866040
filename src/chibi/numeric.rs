//! Boxing of the numeric tower into handles.

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use super::context::Context;
use super::heap::HeapObject;
use super::sexp::{Sexp, SEXP_MAX_FIXNUM, SEXP_MIN_FIXNUM};
use crate::number::{parse_number, Number};

fn fits_fixnum(n: isize) -> bool {
    (SEXP_MIN_FIXNUM..=SEXP_MAX_FIXNUM).contains(&n)
}

impl Context {
    pub fn make_flonum(&self, f: f64) -> Sexp {
        self.alloc(HeapObject::Flonum(f))
    }

    /// Fixnum when `n` fits, bignum otherwise.
    pub fn make_integer(&self, n: i64) -> Sexp {
        match isize::try_from(n) {
            Ok(n) if fits_fixnum(n) => Sexp::make_fixnum(n),
            _ => self.alloc(HeapObject::Bignum(BigInt::from(n))),
        }
    }

    pub fn make_bignum(&self, n: BigInt) -> Sexp {
        match n.to_isize() {
            Some(small) if fits_fixnum(small) => Sexp::make_fixnum(small),
            _ => self.alloc(HeapObject::Bignum(n)),
        }
    }

    /// Box a ratio from already-normalized parts.
    pub fn make_ratio(&self, numerator: Sexp, denominator: Sexp) -> Sexp {
        self.alloc(HeapObject::Ratio {
            numerator,
            denominator,
        })
    }

    pub fn make_complex(&self, real: Sexp, imag: Sexp) -> Sexp {
        self.alloc(HeapObject::Complex { real, imag })
    }

    pub fn number_to_sexp(&self, n: &Number) -> Sexp {
        match n {
            Number::Integer(i) => self.make_bignum(i.clone()),
            Number::Rational(num, den) => {
                let num = self.make_bignum(num.clone());
                let den = self.make_bignum(den.clone());
                self.make_ratio(num, den)
            }
            Number::Real(f) => self.make_flonum(*f),
            Number::Complex(re, im) => {
                let re = self.number_to_sexp(re);
                let im = self.number_to_sexp(im);
                self.make_complex(re, im)
            }
        }
    }

    /// Parse a Scheme string as a number in `radix` (a fixnum; anything
    /// else means 10). Returns `#f` when the text is not a number.
    pub fn string_to_number(&self, s: Sexp, radix: Sexp) -> Sexp {
        let Some(text) = s.string_value() else {
            return self.type_exception(Sexp::FALSE, "string", s);
        };
        let radix = if radix.is_fixnum() {
            radix.unbox_fixnum() as u32
        } else {
            10
        };
        match parse_number(&text, radix) {
            Some(n) => self.number_to_sexp(&n),
            None => Sexp::FALSE,
        }
    }
}

/// Read a numeric handle back into the neutral tower.
pub fn sexp_to_number(x: Sexp) -> Option<Number> {
    if x.is_fixnum() {
        return Some(Number::Integer(BigInt::from(x.unbox_fixnum())));
    }
    match x.object()? {
        HeapObject::Flonum(f) => Some(Number::Real(*f)),
        HeapObject::Bignum(n) => Some(Number::Integer(n.clone())),
        HeapObject::Ratio {
            numerator,
            denominator,
        } => match (sexp_to_number(*numerator)?, sexp_to_number(*denominator)?) {
            (Number::Integer(n), Number::Integer(d)) => Some(Number::Rational(n, d)),
            _ => None,
        },
        HeapObject::Complex { real, imag } => Some(Number::Complex(
            Box::new(sexp_to_number(*real)?),
            Box::new(sexp_to_number(*imag)?),
        )),
        _ => None,
    }
}

/// Numeric `eqv?`: same exactness and value.
pub fn eqv_numbers(a: Sexp, b: Sexp) -> bool {
    match (sexp_to_number(a), sexp_to_number(b)) {
        (Some(Number::Real(x)), Some(Number::Real(y))) => x.to_bits() == y.to_bits() || x == y,
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

pub fn ratio_numerator(q: Sexp) -> Sexp {
    match q.object() {
        Some(HeapObject::Ratio { numerator, .. }) => *numerator,
        _ => panic!("ratio-numerator: not a ratio: {:?}", q),
    }
}

pub fn ratio_denominator(q: Sexp) -> Sexp {
    match q.object() {
        Some(HeapObject::Ratio { denominator, .. }) => *denominator,
        _ => panic!("ratio-denominator: not a ratio: {:?}", q),
    }
}

pub fn complex_real(z: Sexp) -> Sexp {
    match z.object() {
        Some(HeapObject::Complex { real, .. }) => *real,
        _ => panic!("complex-real: not a complex: {:?}", z),
    }
}

pub fn complex_imag(z: Sexp) -> Sexp {
    match z.object() {
        Some(HeapObject::Complex { imag, .. }) => *imag,
        _ => panic!("complex-imag: not a complex: {:?}", z),
    }
}
