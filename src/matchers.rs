//! Query parameter value matching.
//!
//! An expected parameter value is either a literal scalar, compared for
//! equality after coercing the received string to the literal's type, or an
//! approximate numeric value accepted within a tolerance band. Received values
//! always arrive as raw query-string text, so every comparison starts from a
//! `&str`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::expectation::ExpectationError;

/// Discriminator key marking a tagged (non-literal) parameter value on the wire.
pub const TYPE_KEY: &str = "__type__";

/// Tag value identifying an approximate parameter value.
pub const APPROXIMATE_VALUE_TAG: &str = "approximate_value";

/// A numeric quantity that keeps track of whether it was given as an integer.
///
/// The distinction matters for coercion: an integer center only accepts
/// received values that parse as integers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Integer(i64),
    Float(f64),
}

impl Numeric {
    fn from_number(number: &Number) -> Option<Self> {
        match number.as_i64() {
            Some(i) => Some(Self::Integer(i)),
            None => number.as_f64().map(Self::Float),
        }
    }

    /// Lossy conversion used for tolerance arithmetic.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Integer(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    fn to_value(self) -> Value {
        match self {
            Self::Integer(i) => Value::from(i),
            Self::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        }
    }
}

impl From<i64> for Numeric {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Numeric {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// A literal expected value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Check whether the received text equals this literal once coerced to its type.
    ///
    /// # Parameters
    ///
    /// - `actual` - Raw query parameter value as received
    ///
    /// # Returns
    ///
    /// Returns `true` on equality; a failed coercion is a non-match.
    pub fn matches(&self, actual: &str) -> bool {
        match self {
            Self::String(expected) => expected == actual,
            Self::Integer(expected) => actual.trim().parse::<i64>().is_ok_and(|v| v == *expected),
            Self::Float(expected) => actual.trim().parse::<f64>().is_ok_and(|v| v == *expected),
            Self::Bool(expected) => actual.trim().parse::<bool>().is_ok_and(|v| v == *expected),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(i) => Value::from(*i),
            Self::Float(f) => Numeric::Float(*f).to_value(),
            Self::String(s) => Value::String(s.clone()),
        }
    }
}

/// A numeric value accepted within `delta` of `value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproximateValue {
    pub value: Numeric,
    pub delta: Numeric,
}

impl ApproximateValue {
    /// Create a new approximate value.
    pub fn new(value: impl Into<Numeric>, delta: impl Into<Numeric>) -> Self {
        Self { value: value.into(), delta: delta.into() }
    }

    /// Check whether the received text lies within the tolerance band.
    ///
    /// The received text is coerced to the type of the center first, so an
    /// integer center rejects `"10.4"` outright.
    pub fn matches(&self, actual: &str) -> bool {
        let delta = self.delta.as_f64();
        let actual = actual.trim();
        match self.value {
            Numeric::Integer(center) => actual.parse::<i64>().is_ok_and(|v| {
                (i128::from(center) - i128::from(v)).unsigned_abs() as f64 <= delta
            }),
            Numeric::Float(center) => {
                actual.parse::<f64>().is_ok_and(|v| (center - v).abs() <= delta)
            }
        }
    }

    fn from_fields(fields: &Map<String, Value>) -> Result<Self, ExpectationError> {
        let numeric = |name: &'static str| match fields.get(name) {
            Some(Value::Number(n)) => {
                Numeric::from_number(n).ok_or(ExpectationError::InvalidApproximate(name))
            }
            _ => Err(ExpectationError::InvalidApproximate(name)),
        };
        Ok(Self { value: numeric("value")?, delta: numeric("delta")? })
    }
}

/// An expected query parameter value.
///
/// On the wire a literal is a bare JSON scalar and an approximate value is an
/// object tagged with `"__type__": "approximate_value"`. Decoding rejects
/// unknown tags instead of guessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum ParamValue {
    Literal(Scalar),
    Approximate(ApproximateValue),
}

impl ParamValue {
    /// Create an approximate value accepting anything within `delta` of `value`.
    pub fn approximate(value: impl Into<Numeric>, delta: impl Into<Numeric>) -> Self {
        Self::Approximate(ApproximateValue::new(value, delta))
    }

    /// Check whether a received query parameter value satisfies this expectation.
    ///
    /// # Parameters
    ///
    /// - `actual` - Raw query parameter value as received
    ///
    /// # Returns
    ///
    /// Returns `true` if the value matches; coercion failures yield `false`.
    pub fn matches(&self, actual: &str) -> bool {
        match self {
            Self::Literal(scalar) => scalar.matches(actual),
            Self::Approximate(approx) => approx.matches(actual),
        }
    }
}

impl TryFrom<Value> for ParamValue {
    type Error = ExpectationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(Self::Literal(Scalar::String(s))),
            Value::Bool(b) => Ok(Self::Literal(Scalar::Bool(b))),
            Value::Number(n) => match Numeric::from_number(&n) {
                Some(Numeric::Integer(i)) => Ok(Self::Literal(Scalar::Integer(i))),
                Some(Numeric::Float(f)) => Ok(Self::Literal(Scalar::Float(f))),
                None => Err(ExpectationError::UnsupportedValue(n.to_string())),
            },
            Value::Object(fields) => match fields.get(TYPE_KEY) {
                Some(Value::String(tag)) if tag == APPROXIMATE_VALUE_TAG => {
                    ApproximateValue::from_fields(&fields).map(Self::Approximate)
                }
                Some(tag) => Err(ExpectationError::UnknownValueKind(tag.to_string())),
                None => Err(ExpectationError::UnsupportedValue(Value::Object(fields).to_string())),
            },
            other => Err(ExpectationError::UnsupportedValue(other.to_string())),
        }
    }
}

impl From<ParamValue> for Value {
    fn from(value: ParamValue) -> Self {
        match value {
            ParamValue::Literal(scalar) => scalar.to_value(),
            ParamValue::Approximate(approx) => {
                let mut fields = Map::new();
                fields.insert(TYPE_KEY.to_string(), Value::from(APPROXIMATE_VALUE_TAG));
                fields.insert("value".to_string(), approx.value.to_value());
                fields.insert("delta".to_string(), approx.delta.to_value());
                Value::Object(fields)
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Literal(Scalar::String(value.to_string()))
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Literal(Scalar::String(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Literal(Scalar::Integer(value))
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Literal(Scalar::Integer(i64::from(value)))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Literal(Scalar::Float(value))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Literal(Scalar::Bool(value))
    }
}
