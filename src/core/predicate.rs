//! Single-condition record filtering with one fixed coercion rule.
//!
//! Values are compared the same way everywhere (filters, primary-key lookup,
//! `count_of`):
//!
//! 1. If both sides are integers (a JSON integer, or a string holding one after
//!    trimming) they compare exactly.
//! 2. Otherwise, if both sides are numeric (a JSON number, or a string that
//!    parses as a finite number after trimming) they compare as `f64`.
//! 3. Otherwise two strings compare lexicographically, two booleans compare with
//!    `false < true`, and `null` equals only `null`.
//! 4. Arrays and objects are equal only to structurally equal values and have
//!    no ordering.
//! 5. Every other pairing is incomparable: only `!=`/`<>` holds.
//!
//! Filters read a missing field as `null`. Primary-key lookup and `count_of`
//! only look at records that carry the field.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::core::document::Record;
use crate::core::error::{Error, ErrorKind};

pub const SUPPORTED_OPERATORS: &[&str] = &["=", ">", "<", ">=", "<=", "!=", "<>"];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operator {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
    Ne,
}

impl Operator {
    pub fn holds(self, ordering: Option<Ordering>) -> bool {
        match self {
            Operator::Eq => ordering == Some(Ordering::Equal),
            Operator::Ne => ordering != Some(Ordering::Equal),
            Operator::Gt => ordering == Some(Ordering::Greater),
            Operator::Lt => ordering == Some(Ordering::Less),
            Operator::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            Operator::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Ne => "!=",
        }
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "=" => Ok(Operator::Eq),
            ">" => Ok(Operator::Gt),
            "<" => Ok(Operator::Lt),
            ">=" => Ok(Operator::Ge),
            "<=" => Ok(Operator::Le),
            "!=" | "<>" => Ok(Operator::Ne),
            other => Err(Error::new(ErrorKind::UnsupportedOperation)
                .with_message(format!("unsupported operator `{other}`"))
                .with_hint(format!(
                    "Supported operators: {}",
                    SUPPORTED_OPERATORS.join(" ")
                ))),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// `record[column] <operator> value`.
#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
}

impl Predicate {
    pub fn new(column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn parse(column: &str, operator: &str, value: impl Into<Value>) -> Result<Self, Error> {
        Ok(Self::new(column, operator.parse()?, value))
    }

    pub fn matches(&self, record: &Record) -> bool {
        let field = record.get(&self.column).unwrap_or(&Value::Null);
        self.operator.holds(loose_cmp(field, &self.value))
    }

    /// Keeps only matching records, preserving order.
    pub fn apply(&self, records: &mut Vec<Record>) {
        records.retain(|record| self.matches(record));
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.operator, self.value)
    }
}

pub fn loose_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(l), Some(r)) = (integer(left), integer(right)) {
        return Some(l.cmp(&r));
    }
    if let (Some(l), Some(r)) = (numeric(left), numeric(right)) {
        return l.partial_cmp(&r);
    }
    match (left, right) {
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
            (left == right).then_some(Ordering::Equal)
        }
        _ => None,
    }
}

pub fn loose_eq(left: &Value, right: &Value) -> bool {
    loose_cmp(left, right) == Some(Ordering::Equal)
}

// i128 covers both the i64 and u64 ranges serde_json stores without rounding.
fn integer(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from)),
        Value::String(s) => s.trim().parse::<i128>().ok(),
        _ => None,
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}
