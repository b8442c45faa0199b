//! Exact decimal arithmetic under a fixed significant-digit context.
//!
//! Every arithmetic step in the expression engine is rounded through a
//! [`MathContext`] (32 significant digits, half-up by default). Results are
//! surfaced as plain text with trailing zeros stripped.
//!
//! A value's decimal exponent is bounded by [`MathContext::MAX_EXPONENT`].
//! Operator and function results past the bound are overflow errors.

use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::{BigInt, Sign};
use num_traits::{FromPrimitive, One, ToPrimitive, Zero};

use crate::error::{AnonError, AnonResult};

/// Significant-digit precision plus rounding mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MathContext {
    precision: u64,
    rounding: RoundingMode,
}

impl Default for MathContext {
    fn default() -> Self {
        MathContext::new(MathContext::DEFAULT_PRECISION)
    }
}

impl MathContext {
    pub const DEFAULT_PRECISION: u64 = 32;

    /// Largest power of ten a value's leading digit may have, in either
    /// direction.
    pub const MAX_EXPONENT: i64 = 9_999;

    /// A half-up context with `precision` significant digits (at least one).
    pub fn new(precision: u64) -> Self {
        MathContext {
            precision: precision.max(1),
            rounding: RoundingMode::HalfUp,
        }
    }

    pub fn precision(&self) -> u64 {
        self.precision
    }

    pub fn rounding(&self) -> RoundingMode {
        self.rounding
    }

    /// Round `value` to this context's number of significant digits.
    pub fn round(&self, value: &BigDecimal) -> BigDecimal {
        let (digits, scale) = value.as_bigint_and_exponent();
        let count = digit_count(&digits);
        if count <= self.precision {
            return value.clone();
        }
        let excess = (count - self.precision) as i64;
        value.with_scale_round(scale - excess, self.rounding)
    }

    /// Pass `value` through if its exponent is in range.
    pub fn check(&self, value: BigDecimal) -> AnonResult<BigDecimal> {
        if value.is_zero() {
            return Ok(BigDecimal::zero());
        }
        let exponent = adjusted_exponent(&value);
        if exponent.abs() > Self::MAX_EXPONENT {
            return Err(AnonError::Eval(format!("Overflow: exponent {} is out of range", exponent)));
        }
        Ok(value)
    }

    pub fn add(&self, left: &BigDecimal, right: &BigDecimal) -> BigDecimal {
        self.round(&(left + right))
    }

    pub fn subtract(&self, left: &BigDecimal, right: &BigDecimal) -> BigDecimal {
        self.round(&(left - right))
    }

    pub fn multiply(&self, left: &BigDecimal, right: &BigDecimal) -> BigDecimal {
        self.round(&(left * right))
    }

    pub fn divide(&self, left: &BigDecimal, right: &BigDecimal) -> AnonResult<BigDecimal> {
        if right.is_zero() {
            return Err(AnonError::Eval("Division by zero".into()));
        }
        Ok(self.round(&(left / right)))
    }

    /// Truncated remainder: the result carries the sign of the dividend.
    pub fn remainder(&self, left: &BigDecimal, right: &BigDecimal) -> AnonResult<BigDecimal> {
        if right.is_zero() {
            return Err(AnonError::Eval("Division by zero".into()));
        }
        Ok(self.round(&(left % right)))
    }
}

fn digit_count(digits: &BigInt) -> u64 {
    digits.magnitude().to_str_radix(10).len() as u64
}

/// Power of ten of the leading digit: 2 for 123, -3 for 0.00123.
fn adjusted_exponent(value: &BigDecimal) -> i64 {
    let (digits, scale) = value.as_bigint_and_exponent();
    (digit_count(&digits) as i64 - 1).saturating_sub(scale)
}

fn pow10(exponent: usize) -> BigInt {
    num_traits::pow(BigInt::from(10u32), exponent)
}

/// Parse a decimal literal, rounding it to the context. Literals whose
/// exponent is out of range are rejected.
pub fn parse(text: &str, context: &MathContext) -> AnonResult<BigDecimal> {
    let value = BigDecimal::from_str(text).map_err(|_| AnonError::Eval(format!("'{}' is not a number", text)))?;
    let value = context.check(value)?;
    Ok(context.round(&value))
}

/// Beyond this exponent `to_plain_string` switches to `E` notation.
const PLAIN_EXPONENT_LIMIT: i64 = 1_000;

/// Render without exponent notation and without trailing zeros. Values
/// past `PLAIN_EXPONENT_LIMIT` in either direction use `E` notation,
/// e.g. `1.5E+2000`.
pub fn to_plain_string(value: &BigDecimal) -> String {
    if value.is_zero() {
        return "0".to_string();
    }
    let value = value.normalized();
    let exponent = adjusted_exponent(&value);
    let (digits, scale) = value.as_bigint_and_exponent();
    let mut text = digits.magnitude().to_str_radix(10);
    if exponent.abs() > PLAIN_EXPONENT_LIMIT {
        if text.len() > 1 {
            text.insert(1, '.');
        }
        text = format!("{}E{:+}", text, exponent);
    } else if scale <= 0 {
        text.push_str(&"0".repeat(scale.unsigned_abs() as usize));
    } else {
        let scale = scale as usize;
        if text.len() <= scale {
            text = format!("0.{}{}", "0".repeat(scale - text.len()), text);
        } else {
            text.insert(text.len() - scale, '.');
        }
    }
    if digits.sign() == Sign::Minus {
        text.insert(0, '-');
    }
    text
}

/// Nonzero values are true in a boolean context.
pub fn truthy(value: &BigDecimal) -> bool {
    !value.is_zero()
}

/// Boolean results are exactly 1 or 0.
pub fn from_bool(value: bool) -> BigDecimal {
    if value {
        BigDecimal::one()
    } else {
        BigDecimal::zero()
    }
}

pub fn to_f64(value: &BigDecimal) -> AnonResult<f64> {
    value
        .to_f64()
        .ok_or_else(|| AnonError::Eval(format!("{} is out of floating-point range", value)))
}

pub fn from_f64(value: f64, context: &MathContext) -> AnonResult<BigDecimal> {
    BigDecimal::from_f64(value)
        .map(|d| context.round(&d))
        .ok_or_else(|| AnonError::Eval(format!("{} is not a finite number", value)))
}

/// Integer power by repeated squaring, rounding and range-checking after
/// every product.
pub fn powi(base: &BigDecimal, exponent: u32, context: &MathContext) -> AnonResult<BigDecimal> {
    let mut result = BigDecimal::one();
    let mut factor = context.check(base.clone())?;
    let mut remaining = exponent;
    while remaining > 0 {
        if remaining & 1 == 1 {
            result = context.check(context.multiply(&result, &factor))?;
        }
        remaining >>= 1;
        if remaining > 0 {
            factor = context.check(context.multiply(&factor, &factor))?;
        }
    }
    Ok(result)
}

/// `base ^ exponent` for any decimal exponent.
///
/// The integer part of `|exponent|` is applied exactly; the fractional part
/// falls back to double precision. Negative exponents take the reciprocal.
pub fn pow(base: &BigDecimal, exponent: &BigDecimal, context: &MathContext) -> AnonResult<BigDecimal> {
    let negative = *exponent < BigDecimal::zero();
    let magnitude = exponent.abs();
    let integer_part = magnitude.with_scale_round(0, RoundingMode::Down);
    let fraction = &magnitude - &integer_part;
    let whole = integer_part
        .to_i32()
        .ok_or_else(|| AnonError::Eval(format!("Exponent {} is out of range", exponent)))?;

    let integer_power = powi(base, whole.unsigned_abs(), context)?;
    let fraction_power = if fraction.is_zero() {
        BigDecimal::one()
    } else {
        from_f64(to_f64(base)?.powf(to_f64(&fraction)?), context)?
    };

    let result = context.check(context.multiply(&integer_power, &fraction_power))?;
    if negative {
        context.check(context.divide(&BigDecimal::one(), &result)?)
    } else {
        Ok(result)
    }
}

/// Square root by Newton's method on integers scaled to the working
/// precision.
pub fn sqrt(value: &BigDecimal, context: &MathContext) -> AnonResult<BigDecimal> {
    if value.is_zero() {
        return Ok(BigDecimal::zero());
    }
    if *value < BigDecimal::zero() {
        return Err(AnonError::Eval("Argument to sqrt() must not be negative".into()));
    }

    // n = value * 10^(2 * precision), truncated to an integer.
    let shift = (context.precision * 2) as i64;
    let (digits, scale) = value.as_bigint_and_exponent();
    let exponent = shift - scale;
    let n = if exponent >= 0 {
        digits * pow10(exponent as usize)
    } else {
        digits / pow10(exponent.unsigned_abs() as usize)
    };
    if n.is_zero() {
        return Ok(BigDecimal::zero());
    }

    // Start above the root so the iterates decrease until they converge.
    let half_bits = ((n.bits() + 1) / 2) as usize;
    let mut root = BigInt::one() << half_bits;
    loop {
        let next: BigInt = (&root + &n / &root) >> 1usize;
        if next >= root {
            break;
        }
        root = next;
    }

    Ok(context.round(&BigDecimal::new(root, context.precision as i64)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(text: &str) -> BigDecimal {
        BigDecimal::from_str(text).unwrap()
    }

    #[test]
    fn rounds_to_significant_digits_half_up() {
        let context = MathContext::new(4);
        assert_eq!(to_plain_string(&context.round(&dec("1.23449"))), "1.234");
        assert_eq!(to_plain_string(&context.round(&dec("1.23450"))), "1.235");
        assert_eq!(to_plain_string(&context.round(&dec("99999"))), "100000");
        assert_eq!(to_plain_string(&context.round(&dec("-2.71828"))), "-2.718");
    }

    #[test]
    fn plain_string_strips_trailing_zeros() {
        assert_eq!(to_plain_string(&dec("2.500")), "2.5");
        assert_eq!(to_plain_string(&dec("1000")), "1000");
        assert_eq!(to_plain_string(&dec("1E+3")), "1000");
        assert_eq!(to_plain_string(&dec("0.000")), "0");
        assert_eq!(to_plain_string(&dec("0.0012")), "0.0012");
        assert_eq!(to_plain_string(&dec("-12.50")), "-12.5");
    }

    #[test]
    fn division_is_rounded_to_context() {
        let context = MathContext::default();
        let third = context.divide(&dec("1"), &dec("3")).unwrap();
        assert_eq!(to_plain_string(&third), format!("0.{}", "3".repeat(32)));
        let two_thirds = context.divide(&dec("2"), &dec("3")).unwrap();
        assert_eq!(to_plain_string(&two_thirds), format!("0.{}7", "6".repeat(31)));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let context = MathContext::default();
        assert!(matches!(context.divide(&dec("1"), &dec("0")), Err(AnonError::Eval(_))));
        assert!(matches!(context.remainder(&dec("1"), &dec("0")), Err(AnonError::Eval(_))));
    }

    #[test]
    fn remainder_keeps_dividend_sign() {
        let context = MathContext::default();
        assert_eq!(to_plain_string(&context.remainder(&dec("7"), &dec("3")).unwrap()), "1");
        assert_eq!(to_plain_string(&context.remainder(&dec("-7"), &dec("3")).unwrap()), "-1");
        assert_eq!(to_plain_string(&context.remainder(&dec("5.5"), &dec("2")).unwrap()), "1.5");
    }

    #[test]
    fn integer_and_negative_powers() {
        let context = MathContext::default();
        assert_eq!(to_plain_string(&pow(&dec("2"), &dec("10"), &context).unwrap()), "1024");
        assert_eq!(to_plain_string(&pow(&dec("2"), &dec("-2"), &context).unwrap()), "0.25");
        assert_eq!(to_plain_string(&pow(&dec("7"), &dec("0"), &context).unwrap()), "1");
        assert_eq!(to_plain_string(&pow(&dec("1.5"), &dec("2"), &context).unwrap()), "2.25");
    }

    #[test]
    fn fractional_power_uses_double_fallback() {
        let context = MathContext::default();
        let root = pow(&dec("4"), &dec("0.5"), &context).unwrap();
        assert_eq!(to_plain_string(&root), "2");
        assert!(pow(&dec("0"), &dec("-1"), &context).is_err());
    }

    #[test]
    fn sqrt_converges_exactly() {
        let context = MathContext::default();
        assert_eq!(to_plain_string(&sqrt(&dec("16"), &context).unwrap()), "4");
        assert_eq!(to_plain_string(&sqrt(&dec("0.25"), &context).unwrap()), "0.5");
        assert_eq!(to_plain_string(&sqrt(&dec("0"), &context).unwrap()), "0");
        let two = to_plain_string(&sqrt(&dec("2"), &context).unwrap());
        assert!(two.starts_with("1.414213562373095048801688724"), "{two}");
    }

    #[test]
    fn huge_exponents_switch_to_e_notation() {
        assert_eq!(to_plain_string(&dec("1e1000")), format!("1{}", "0".repeat(1000)));
        assert_eq!(to_plain_string(&dec("1e1001")), "1E+1001");
        assert_eq!(to_plain_string(&dec("-1.50e999999999999999")), "-1.5E+999999999999999");
        assert_eq!(to_plain_string(&dec("2.5e-5000")), "2.5E-5000");
    }

    #[test]
    fn out_of_range_results_overflow() {
        let context = MathContext::default();
        assert!(context.check(dec("1e9999")).is_ok());
        assert!(context.check(dec("1e-9999")).is_ok());
        assert!(matches!(context.check(dec("1e10000")), Err(AnonError::Eval(_))));
        assert!(matches!(context.check(dec("1e-10000")), Err(AnonError::Eval(_))));
        assert!(matches!(parse("1e999999999999999", &context), Err(AnonError::Eval(_))));
    }

    #[test]
    fn repeated_powers_overflow_instead_of_panicking() {
        let context = MathContext::default();
        assert!(matches!(pow(&dec("10"), &dec("2000000000"), &context), Err(AnonError::Eval(_))));
        assert!(matches!(pow(&dec("10"), &dec("-2000000000"), &context), Err(AnonError::Eval(_))));
        assert!(matches!(pow(&dec("0.1"), &dec("20000"), &context), Err(AnonError::Eval(_))));
        assert_eq!(to_plain_string(&pow(&dec("1"), &dec("2000000000"), &context).unwrap()), "1");
        assert_eq!(powi(&dec("10"), 9999, &context).unwrap(), dec("1e9999"));
    }

    #[test]
    fn sqrt_of_negative_is_an_error() {
        let context = MathContext::default();
        assert!(matches!(sqrt(&dec("-4"), &context), Err(AnonError::Eval(_))));
    }

    #[test]
    fn parse_rejects_garbage() {
        let context = MathContext::default();
        assert!(parse("1.2.3", &context).is_err());
        assert!(parse("abc", &context).is_err());
        assert_eq!(to_plain_string(&parse("-0.50", &context).unwrap()), "-0.5");
    }

    #[test]
    fn booleans_are_one_and_zero() {
        assert_eq!(from_bool(true), BigDecimal::one());
        assert_eq!(from_bool(false), BigDecimal::zero());
        assert!(truthy(&dec("-3")));
        assert!(!truthy(&dec("0.000")));
    }
}
