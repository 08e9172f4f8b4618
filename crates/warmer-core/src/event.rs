//! Untyped inbound event records.
//!
//! Events arrive as arbitrary JSON. Field lookup is by name (the names are
//! configurable), and every accessor degrades to `None`/`false` when the
//! field is missing or has the wrong shape. Reading an event never fails.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single inbound event record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Value);

impl Event {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Raw field lookup. Non-object events have no fields.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.as_object().and_then(|map| map.get(key))
    }

    /// Truthiness with loose-typing rules: `null`, `false`, `0`, `NaN`
    /// and `""` are falsy, everything else present is truthy.
    pub fn is_truthy(&self, key: &str) -> bool {
        self.get(key).is_some_and(truthy)
    }

    /// A finite numeric value. Numeric strings (`"3"`) are accepted.
    pub fn number(&self, key: &str) -> Option<f64> {
        let n = match self.get(key)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    /// A count of at least one, truncated toward zero.
    ///
    /// Zero, negative and fractional-below-one values are treated as absent,
    /// as are values that do not fit in a `u32`.
    pub fn count(&self, key: &str) -> Option<u32> {
        let n = self.number(key)?.trunc();
        (n >= 1.0 && n <= f64::from(u32::MAX)).then_some(n as u32)
    }

    /// A non-empty string value. Numbers are rendered to their string form.
    pub fn string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Event {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
