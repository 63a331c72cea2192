use std::collections::BTreeMap;

use serde_json::Value;

use crate::expression::filter::Filter;

/// Parameter bag keyed by option name. Ordered so resolution and hashing are deterministic.
pub type Params = BTreeMap<String, ParamValue>;

/// One parameter value as supplied to a builder call.
///
/// `Seq` only appears on vectorized entry points; everything else is a concrete value. A JSON
/// array inside `Value` is an ordinary (atomic) value and never triggers expansion.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// A concrete JSON value.
    Value(Value),
    /// A filter predicate, attached unevaluated.
    Filter(Filter),
    /// Per-intent values for vector expansion.
    Seq(Vec<ParamValue>),
}

impl ParamValue {
    /// Build a sequence value from anything convertible.
    pub fn seq<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ParamValue>,
    {
        Self::Seq(items.into_iter().map(Into::into).collect())
    }

    /// Length as seen by the vector expander (scalars count as 1).
    pub fn arity(&self) -> usize {
        match self {
            Self::Seq(items) => items.len(),
            Self::Value(_) | Self::Filter(_) => 1,
        }
    }

    /// The JSON value, when this is a concrete value.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Filter(_) | Self::Seq(_) => None,
        }
    }

    /// The string payload, when this is a JSON string.
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }
}

/// Text used when a value is substituted into a template or shown as a label.
///
/// `null` has no text; arrays and objects render as compact JSON.
pub(crate) fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(v.to_string()),
    }
}

impl From<Value> for ParamValue {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Value(Value::String(v.to_owned()))
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Value(Value::String(v))
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Value(Value::Bool(v))
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Value(Value::from(v))
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Value(Value::from(v))
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        Self::Value(Value::from(v))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Value(Value::from(v))
    }
}

impl From<Filter> for ParamValue {
    fn from(v: Filter) -> Self {
        Self::Filter(v)
    }
}
