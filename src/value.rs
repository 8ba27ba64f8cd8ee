//! Runtime value type flowing along graph edges.
//!
//! Every component owns a current [`Value`]; edges propagate values between
//! components; the host channel serializes them back out as JSON. The enum is
//! deliberately closed: graphs move scalars and small lists around, nothing
//! richer. Structured JSON arriving from outside (e.g. an MQTT payload with an
//! object body) is carried as its JSON text so it still round-trips.
//!
//! Equality is explicit and type-specific rather than serialize-and-compare:
//! change detection relies on it, so `NaN == NaN` here — a component whose
//! value went NaN must not emit `change` on every reassignment forever.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use miette::Diagnostic;
use thiserror::Error;

/// A value held by a component and propagated along edges.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<Value>),
}

/// Raised when an action cannot interpret its input as the type it needs.
///
/// Always isolated per call: the offending component reports it on the host
/// channel and leaves its value unchanged.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
#[error("cannot interpret {value} as {wanted}")]
#[diagnostic(
    code(breadboard::value::coercion),
    help("check the source node wired into this input")
)]
pub struct CoercionError {
    pub wanted: &'static str,
    /// JSON rendering of the offending value.
    pub value: String,
}

impl CoercionError {
    fn new(wanted: &'static str, value: &Value) -> Self {
        Self {
            wanted,
            value: value.to_json().to_string(),
        }
    }
}

impl Value {
    /// Numeric coercion used by counter/calculate/rangemap-style inputs:
    /// numbers pass through, booleans map to 0/1, text is parsed.
    ///
    /// `Null` and lists are not coercible; callers that treat `Null` as
    /// "argument absent" must check for it first.
    pub fn as_number(&self) -> Result<f64, CoercionError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| CoercionError::new("a number", self)),
            Value::Null | Value::List(_) => Err(CoercionError::new("a number", self)),
        }
    }

    /// Boolean interpretation used by gate inputs.
    ///
    /// Bool is itself; numbers are true unless zero or NaN; text and lists
    /// are true when non-empty; null is false.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
        }
    }

    /// Plain-text rendering used for prompt variables and text comparison.
    ///
    /// Integral numbers render without a trailing `.0`; lists join their
    /// rendered elements with `", "`.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => render_number(*n),
            Value::Text(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::render)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Wire rendering. Integral numbers serialize as JSON integers so the
    /// host sees `3`, not `3.0`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < i64::MAX as f64 {
                    serde_json::Value::from(*n as i64)
                } else {
                    serde_json::Value::from(*n)
                }
            }
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// =============================================================================
// Equality
// =============================================================================

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            // NaN compares equal to NaN so change detection terminates.
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

// =============================================================================
// Conversions
// =============================================================================

impl From<serde_json::Value> for Value {
    /// Total mapping from wire JSON. Objects have no variant of their own and
    /// are carried as their compact JSON text.
    fn from(raw: serde_json::Value) -> Self {
        match raw {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            obj @ serde_json::Value::Object(_) => Value::Text(obj.to_string()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Value::from(serde_json::Value::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_type_specific() {
        assert_eq!(Value::Number(3.0), Value::Number(3.0));
        assert_ne!(Value::Number(1.0), Value::Bool(true));
        assert_ne!(Value::Text("1".into()), Value::Number(1.0));
        assert_ne!(Value::Null, Value::Bool(false));
    }

    #[test]
    fn nan_equals_nan() {
        assert_eq!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_ne!(Value::Number(f64::NAN), Value::Number(0.0));
    }

    #[test]
    fn lists_compare_elementwise() {
        let a = Value::List(vec![Value::Number(1.0), Value::Text("x".into())]);
        let b = Value::List(vec![Value::Number(1.0), Value::Text("x".into())]);
        let c = Value::List(vec![Value::Number(1.0)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(Value::Number(2.5).as_number().unwrap(), 2.5);
        assert_eq!(Value::Bool(true).as_number().unwrap(), 1.0);
        assert_eq!(Value::Bool(false).as_number().unwrap(), 0.0);
        assert_eq!(Value::Text(" 42 ".into()).as_number().unwrap(), 42.0);
        assert!(Value::Text("pancake".into()).as_number().is_err());
        assert!(Value::Null.as_number().is_err());
        assert!(Value::List(vec![]).as_number().is_err());
    }

    #[test]
    fn coercion_error_carries_offending_value() {
        let err = Value::Text("pancake".into()).as_number().unwrap_err();
        assert_eq!(err.value, "\"pancake\"");
        assert_eq!(err.wanted, "a number");
    }

    #[test]
    fn truthiness_table() {
        assert!(!Value::Null.truthy());
        assert!(Value::Bool(true).truthy());
        assert!(!Value::Bool(false).truthy());
        assert!(Value::Number(0.5).truthy());
        assert!(!Value::Number(0.0).truthy());
        assert!(!Value::Number(f64::NAN).truthy());
        assert!(Value::Text("x".into()).truthy());
        assert!(!Value::Text(String::new()).truthy());
        assert!(!Value::List(vec![]).truthy());
        assert!(Value::List(vec![Value::Null]).truthy());
    }

    #[test]
    fn integral_numbers_serialize_without_fraction() {
        assert_eq!(Value::Number(3.0).to_json().to_string(), "3");
        assert_eq!(Value::Number(3.25).to_json().to_string(), "3.25");
        assert_eq!(Value::Number(-0.0).to_json().to_string(), "0");
    }

    #[test]
    fn json_round_trip() {
        let raw = serde_json::json!({ "topic": "state", "level": 3 });
        let v = Value::from(raw);
        // Objects are carried as their JSON text.
        match &v {
            Value::Text(s) => assert!(s.contains("\"topic\"")),
            other => panic!("expected text, got {other:?}"),
        }

        let list = Value::from(serde_json::json!([1, "two", true, null]));
        assert_eq!(
            list,
            Value::List(vec![
                Value::Number(1.0),
                Value::Text("two".into()),
                Value::Bool(true),
                Value::Null,
            ])
        );
    }

    #[test]
    fn render_formats() {
        assert_eq!(Value::Number(7.0).render(), "7");
        assert_eq!(Value::Number(7.5).render(), "7.5");
        assert_eq!(Value::Bool(true).render(), "true");
        assert_eq!(Value::Null.render(), "");
        assert_eq!(
            Value::List(vec![Value::Number(1.0), Value::Number(2.0)]).render(),
            "1, 2"
        );
    }
}
