use std::fmt;

use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::ToPrimitive;

use crate::decimal;
use crate::error::{AnonError, AnonResult};

/// A variable's value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Decimal(BigDecimal),
    Text(String),
}

/// The type tag a variable is locked to by its first value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Decimal,
    Text,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Integer => "Integer",
            ValueKind::Decimal => "Decimal",
            ValueKind::Text => "Text",
        }
    }

    pub fn is_numeric(self) -> bool {
        self != ValueKind::Text
    }

    /// Whether a variable locked to this kind may take a `other` value.
    /// Numbers convert into each other; text only takes text.
    pub fn accepts(self, other: ValueKind) -> bool {
        self == other || (self.is_numeric() && other.is_numeric())
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    /// An integral result that fits in 64 bits becomes an `Integer`,
    /// anything else a `Decimal`.
    pub fn from_decimal(value: BigDecimal) -> Value {
        let value = value.normalized();
        match to_i64_exact(&value) {
            Some(n) => Value::Integer(n),
            None => Value::Decimal(value),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Integer(_) => ValueKind::Integer,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Text(_) => ValueKind::Text,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind().is_numeric()
    }

    /// Convert to `kind`. Integers widen to decimals exactly and decimals
    /// round half-up to integers; a rounded decimal outside 64 bits is an
    /// overflow. Check [`ValueKind::accepts`] first: text and numbers
    /// never convert.
    pub fn coerce(self, kind: ValueKind) -> AnonResult<Value> {
        match (self, kind) {
            (value, kind) if value.kind() == kind => Ok(value),
            (Value::Integer(n), ValueKind::Decimal) => Ok(Value::Decimal(BigDecimal::from(n))),
            (Value::Decimal(d), ValueKind::Integer) => {
                let whole = if d.as_bigint_and_exponent().1 > 0 {
                    d.with_scale_round(0, RoundingMode::HalfUp)
                } else {
                    d
                };
                to_i64_exact(&whole).map(Value::Integer).ok_or_else(|| {
                    AnonError::Eval(format!("{} overflows a 64-bit integer", decimal::to_plain_string(&whole)))
                })
            }
            (value, kind) => Err(AnonError::Eval(format!("A {} value cannot become {}", value.kind(), kind))),
        }
    }

    /// Add `delta` keeping the value's type. Text has no successor.
    pub fn offset(&self, delta: i64) -> AnonResult<Value> {
        match self {
            Value::Integer(n) => n
                .checked_add(delta)
                .map(Value::Integer)
                .ok_or_else(|| AnonError::Eval(format!("{} overflows a 64-bit integer", n))),
            Value::Decimal(d) => Ok(Value::Decimal((d + BigDecimal::from(delta)).normalized())),
            Value::Text(_) => Err(AnonError::Eval("Text has no numeric successor".into())),
        }
    }
}

/// The value as an `i64` if it is integral and in range. Large exponents
/// are rejected before any digits are expanded.
fn to_i64_exact(value: &BigDecimal) -> Option<i64> {
    let (digits, scale) = value.normalized().as_bigint_and_exponent();
    match scale {
        0 => digits.to_i64(),
        s if (-18..0).contains(&s) => {
            let factor = 10i64.checked_pow(s.unsigned_abs() as u32)?;
            digits.to_i64()?.checked_mul(factor)
        }
        _ => None,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Decimal(d) => f.write_str(&decimal::to_plain_string(d)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}
