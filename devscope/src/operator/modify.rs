use std::sync::Arc;

use indexmap::IndexMap;
use log::trace;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::context::OperationContext;
use crate::error::{Error, Result, ValueError};
use crate::reader::ReaderSet;
use crate::value::Value;

/// Decimal places kept by a division.
const DIVISION_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    fn apply(&self, lhs: Decimal, rhs: Decimal) -> std::result::Result<Decimal, ValueError> {
        match self {
            ArithmeticOp::Add => lhs.checked_add(rhs).ok_or(ValueError::Overflow),
            ArithmeticOp::Subtract => lhs.checked_sub(rhs).ok_or(ValueError::Overflow),
            ArithmeticOp::Multiply => lhs.checked_mul(rhs).ok_or(ValueError::Overflow),
            ArithmeticOp::Divide => {
                if rhs.is_zero() {
                    return Err(ValueError::DivisionByZero);
                }
                let quotient = lhs.checked_div(rhs).ok_or(ValueError::Overflow)?;
                Ok(quotient
                    .round_dp_with_strategy(DIVISION_SCALE, RoundingStrategy::MidpointAwayFromZero))
            }
        }
    }
}

/// A value transformation.
#[derive(Debug, Clone)]
pub enum Modifier {
    /// Find the first match and expand `format` against it (`$1`, `${name}`).
    RegexSubmatch { regex: Regex, format: String },

    /// Replace every match.
    RegexReplace { regex: Regex, replace: String },

    ToUpperCase,
    ToLowerCase,

    /// Discard the input.
    Overwrite(String),
    AddPrefix(String),
    AddSuffix(String),

    /// Expand `$property$` (the input) and `$read_value$` in `format`.
    InsertReadValue { format: String, read_value: ReaderSet },

    /// Look the input up in a mapping table.
    Map {
        mappings: Arc<IndexMap<String, String>>,
        ignore_on_mismatch: bool,
    },

    /// Decimal arithmetic with the value of `operand` as right-hand side.
    Arithmetic { op: ArithmeticOp, operand: ReaderSet },
}

impl Modifier {
    pub(super) async fn apply(&self, ctx: &OperationContext, value: Value) -> Result<Value> {
        match self {
            Modifier::RegexSubmatch { regex, format } => {
                let input = value.as_str();
                let found = regex.find(&input).ok_or_else(|| {
                    Error::DidNotMatch(format!("'{input}' does not match '{}'", regex.as_str()))
                })?;
                Ok(Value::from(
                    regex.replace_all(found.as_str(), format.as_str()).into_owned(),
                ))
            }
            Modifier::RegexReplace { regex, replace } => Ok(Value::from(
                regex
                    .replace_all(&value.as_str(), replace.as_str())
                    .into_owned(),
            )),
            Modifier::ToUpperCase => Ok(Value::from(value.as_str().to_ascii_uppercase())),
            Modifier::ToLowerCase => Ok(Value::from(value.as_str().to_ascii_lowercase())),
            Modifier::Overwrite(literal) => Ok(Value::from(literal.as_str())),
            Modifier::AddPrefix(prefix) => Ok(Value::from(format!("{prefix}{value}"))),
            Modifier::AddSuffix(suffix) => Ok(Value::from(format!("{value}{suffix}"))),
            Modifier::InsertReadValue { format, read_value } => {
                let read = read_value.read(ctx).await?;
                let out = format
                    .replace("$property$", &value.as_str())
                    .replace("$read_value$", &read.as_str());
                Ok(Value::from(out))
            }
            Modifier::Map {
                mappings,
                ignore_on_mismatch,
            } => {
                let key = value.as_str();
                match mappings.get(key.as_ref()) {
                    Some(mapped) => Ok(Value::from(mapped.as_str())),
                    None if *ignore_on_mismatch => {
                        trace!("no mapping for '{key}', using empty value");
                        Ok(Value::empty())
                    }
                    None => Err(Error::DidNotMatch(format!("no mapping for '{key}'"))),
                }
            }
            Modifier::Arithmetic { op, operand } => {
                let rhs = operand.read(ctx).await?.to_decimal()?;
                let lhs = value.to_decimal()?;
                Ok(Value::from(op.apply(lhs, rhs)?))
            }
        }
    }
}
