//! Backend-neutral numeric tower.
//!
//! Numeric text is parsed into a [`Number`] first; each backend then boxes
//! the result into its own handle representation (fixnum, bignum, flonum,
//! ratio or complex).

use std::fmt;

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Integer(BigInt),
    /// Normalized: denominator > 1 and coprime with the numerator.
    Rational(BigInt, BigInt),
    Real(f64),
    /// Rectangular form; the imaginary part is never an exact zero.
    Complex(Box<Number>, Box<Number>),
}

impl Number {
    /// Build a normalized rational. Returns `None` for a zero denominator.
    pub fn rational(numerator: BigInt, denominator: BigInt) -> Option<Number> {
        if denominator.is_zero() {
            return None;
        }
        let g = gcd(&numerator, &denominator);
        let mut num = numerator / &g;
        let mut den = denominator / &g;
        if den.is_negative() {
            num = -num;
            den = -den;
        }
        if den.is_one() {
            Some(Number::Integer(num))
        } else {
            Some(Number::Rational(num, den))
        }
    }

    /// Build a complex number, collapsing an exact zero imaginary part.
    pub fn complex(real: Number, imag: Number) -> Number {
        match imag {
            Number::Integer(ref i) if i.is_zero() => real,
            imag => Number::Complex(Box::new(real), Box::new(imag)),
        }
    }

    pub fn is_exact(&self) -> bool {
        match self {
            Number::Integer(_) | Number::Rational(_, _) => true,
            Number::Real(_) => false,
            Number::Complex(re, im) => re.is_exact() && im.is_exact(),
        }
    }

    /// Real value as a float; `None` for complex numbers.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Number::Integer(i) => i.to_f64(),
            Number::Rational(n, d) => Some(n.to_f64()? / d.to_f64()?),
            Number::Real(f) => Some(*f),
            Number::Complex(_, _) => None,
        }
    }

    fn to_inexact(&self) -> Number {
        match self {
            Number::Complex(re, im) => Number::Complex(
                Box::new(re.to_inexact()),
                Box::new(im.to_inexact()),
            ),
            other => Number::Real(other.to_f64().unwrap_or(f64::NAN)),
        }
    }

    /// Exact value of a finite number. Infinities and NaN have none.
    fn to_exact(&self) -> Option<Number> {
        match self {
            Number::Real(f) => exact_float(*f),
            Number::Complex(re, im) => Some(Number::complex(re.to_exact()?, im.to_exact()?)),
            other => Some(other.clone()),
        }
    }
}

/// Split a finite float into `mantissa * 2^exponent` and build the exact
/// integer or ratio it denotes.
fn exact_float(f: f64) -> Option<Number> {
    if !f.is_finite() {
        return None;
    }
    let bits = f.to_bits();
    let biased = ((bits >> 52) & 0x7FF) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };
    let mut mantissa = BigInt::from(mantissa);
    if bits >> 63 == 1 {
        mantissa = -mantissa;
    }
    if exponent >= 0 {
        Some(Number::Integer(mantissa << exponent as usize))
    } else {
        Number::rational(mantissa, BigInt::one() << (-exponent) as usize)
    }
}

fn gcd(a: &BigInt, b: &BigInt) -> BigInt {
    let (mut a, mut b) = (a.abs(), b.abs());
    while !b.is_zero() {
        let r = &a % &b;
        a = b;
        b = r;
    }
    a
}

/// Format a flonum the way Scheme printers do: integral values keep a
/// trailing `.0`, infinities and NaN use the `+inf.0` family.
pub fn format_flonum(f: f64) -> String {
    if f.is_nan() {
        "+nan.0".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "+inf.0" } else { "-inf.0" }.to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Rational(n, d) => write!(f, "{}/{}", n, d),
            Number::Real(x) => write!(f, "{}", format_flonum(*x)),
            Number::Complex(re, im) => {
                let imag = im.to_string();
                if imag.starts_with('-') || imag.starts_with('+') {
                    write!(f, "{}{}i", re, imag)
                } else {
                    write!(f, "{}+{}i", re, imag)
                }
            }
        }
    }
}

/// Parse numeric text in the given radix. Returns `None` when the text is
/// not a number (the caller then usually treats it as a symbol).
pub fn parse_number(text: &str, radix: u32) -> Option<Number> {
    let mut radix = radix;
    let mut exactness = None;
    let mut rest = text;
    while let Some(prefix) = rest.get(..2).filter(|p| p.starts_with('#')) {
        match prefix.as_bytes()[1].to_ascii_lowercase() {
            b'x' => radix = 16,
            b'd' => radix = 10,
            b'o' => radix = 8,
            b'b' => radix = 2,
            b'e' => exactness = Some(true),
            b'i' => exactness = Some(false),
            _ => return None,
        }
        rest = &rest[2..];
    }
    if !matches!(radix, 2 | 8 | 10 | 16) {
        return None;
    }

    let number = parse_complex(rest, radix)?;
    Some(match exactness {
        Some(true) => number.to_exact()?,
        Some(false) => number.to_inexact(),
        None => number,
    })
}

fn parse_complex(text: &str, radix: u32) -> Option<Number> {
    let body = match text.strip_suffix('i') {
        Some(body) if radix != 16 && !body.is_empty() => body,
        _ => return parse_real(text, radix),
    };

    // Split at the last sign that does not belong to an exponent.
    let bytes = body.as_bytes();
    let split = (1..bytes.len())
        .rev()
        .find(|&i| matches!(bytes[i], b'+' | b'-') && !matches!(bytes[i - 1], b'e' | b'E'));

    let (real, imag) = match split {
        Some(pos) => (parse_real(&body[..pos], radix)?, &body[pos..]),
        None if body.starts_with('+') || body.starts_with('-') => {
            (Number::Integer(BigInt::zero()), body)
        }
        None => return None,
    };
    let imag = match imag {
        "+" => Number::Integer(BigInt::one()),
        "-" => Number::Integer(-BigInt::one()),
        text => parse_real(text, radix)?,
    };
    Some(Number::complex(real, imag))
}

fn parse_real(text: &str, radix: u32) -> Option<Number> {
    match text {
        "+inf.0" => return Some(Number::Real(f64::INFINITY)),
        "-inf.0" => return Some(Number::Real(f64::NEG_INFINITY)),
        "+nan.0" | "-nan.0" => return Some(Number::Real(f64::NAN)),
        _ => {}
    }
    if let Some((num, den)) = text.split_once('/') {
        if den.starts_with('+') || den.starts_with('-') {
            return None;
        }
        return Number::rational(parse_integer(num, radix)?, parse_integer(den, radix)?);
    }
    if let Some(i) = parse_integer(text, radix) {
        return Some(Number::Integer(i));
    }
    if radix == 10 && is_decimal(text) {
        return text.parse::<f64>().ok().map(Number::Real);
    }
    None
}

fn parse_integer(text: &str, radix: u32) -> Option<BigInt> {
    let (negative, digits) = match text.as_bytes().first()? {
        b'+' => (false, &text[1..]),
        b'-' => (true, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let value = BigInt::parse_bytes(digits.as_bytes(), radix)?;
    Some(if negative { -value } else { value })
}

/// `[sign] digits [. digits] [e [sign] digits]` with at least one mantissa digit.
fn is_decimal(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let mut mantissa_digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        mantissa_digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            mantissa_digits += 1;
        }
    }
    if mantissa_digits == 0 {
        return false;
    }
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
    }
    i == bytes.len()
}
