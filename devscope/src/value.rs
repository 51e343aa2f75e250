//! Tagged scalar values produced by readers and operators.
//!
//! A [`Value`] keeps the raw bytes it was built from and parses lazily:
//! `"42"` stays a string until someone asks for [`Value::to_i64`]. An empty
//! value is distinct from `"0"`.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;

/// Immutable scalar value.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Value(Bytes);

impl Value {
    /// Create a value from anything formattable.
    pub fn new(value: impl fmt::Display) -> Self {
        Value(Bytes::from(value.to_string()))
    }

    /// Create a value from raw bytes.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Value(bytes.into())
    }

    /// The empty value.
    pub fn empty() -> Self {
        Value(Bytes::new())
    }

    /// Whether the value holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// String view (lossy UTF-8).
    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    /// Parse as a signed integer.
    pub fn to_i64(&self) -> Result<i64, ValueError> {
        let s = self.as_str();
        let trimmed = s.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            return Ok(v);
        }
        // "12.0" is a valid integer, "12.5" is not
        let decimal = self.to_decimal()?;
        if decimal.fract().is_zero() {
            return i64::try_from(decimal).map_err(|_| ValueError::OutOfRange(s.to_string()));
        }
        Err(ValueError::NotNumeric(s.to_string()))
    }

    /// Parse as an unsigned 64-bit integer.
    pub fn to_u64(&self) -> Result<u64, ValueError> {
        let s = self.as_str();
        let trimmed = s.trim();
        if let Ok(v) = trimmed.parse::<u64>() {
            return Ok(v);
        }
        if trimmed.starts_with('-') && trimmed.parse::<i64>().is_ok() {
            return Err(ValueError::OutOfRange(s.to_string()));
        }
        let decimal = self.to_decimal()?;
        if decimal.fract().is_zero() {
            return u64::try_from(decimal).map_err(|_| ValueError::OutOfRange(s.to_string()));
        }
        Err(ValueError::NotNumeric(s.to_string()))
    }

    /// Parse as a 64-bit float.
    pub fn to_f64(&self) -> Result<f64, ValueError> {
        let s = self.as_str();
        s.trim()
            .parse::<f64>()
            .map_err(|_| ValueError::NotNumeric(s.to_string()))
    }

    /// Parse as a boolean (`1/t/true/0/f/false`, any case).
    pub fn to_bool(&self) -> Result<bool, ValueError> {
        let s = self.as_str();
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "t" | "true" => Ok(true),
            "0" | "f" | "false" => Ok(false),
            _ => Err(ValueError::NotBoolean(s.to_string())),
        }
    }

    /// Parse as an exact decimal number.
    pub fn to_decimal(&self) -> Result<Decimal, ValueError> {
        let s = self.as_str();
        let trimmed = s.trim();
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| ValueError::NotNumeric(s.to_string()))
    }

    /// Compare two values numerically.
    ///
    /// Fails if either side is not a number.
    pub fn cmp_numeric(&self, other: &Value) -> Result<Ordering, ValueError> {
        Ok(self.to_decimal()?.cmp(&other.to_decimal()?))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({:?})", self.as_str())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value(Bytes::from(s))
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value(Bytes::from(bytes))
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::new(d.normalize())
    }
}

macro_rules! value_from_display {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::new(v)
                }
            }
        )*
    };
}

value_from_display!(i32, i64, u32, u64, usize, f64, bool);

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str())
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Value::from)
    }
}
