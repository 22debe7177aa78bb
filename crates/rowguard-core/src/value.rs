use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Dynamic field value carried between records and bound parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Strict integer reading: only values that already denote a whole
    /// number. Used by the number rule's format validation.
    pub fn integer_value(&self) -> Option<i128> {
        match self {
            Value::Int(n) => Some(i128::from(*n)),
            Value::UInt(n) => Some(i128::from(*n)),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i128),
            Value::Text(text) => text.trim().parse::<i128>().ok(),
            _ => None,
        }
    }

    /// Lenient integer reading for magnitude comparisons: floats truncate,
    /// booleans count as 0/1, numeric text parses.
    pub fn coarse_integer(&self) -> Option<i128> {
        match self {
            Value::Bool(flag) => Some(i128::from(*flag)),
            Value::Float(f) => Some(*f as i128),
            Value::Text(text) => {
                let trimmed = text.trim();
                trimmed
                    .parse::<i128>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i128))
            }
            other => other.integer_value(),
        }
    }

    /// Rendered length used by string-family length rules.
    pub fn rendered_len(&self) -> usize {
        self.to_string().chars().count()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(true) => write!(f, "1"),
            Value::Bool(false) => Ok(()),
            Value::Int(n) => write!(f, "{n}"),
            Value::UInt(n) => write!(f, "{n}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(text) => write!(f, "{text}"),
            Value::DateTime(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt(n)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Bool(flag)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(ts: NaiveDateTime) -> Self {
        Value::DateTime(ts)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_value_is_strict() {
        assert_eq!(Value::Int(42).integer_value(), Some(42));
        assert_eq!(Value::Text("42".into()).integer_value(), Some(42));
        assert_eq!(Value::Float(2.0).integer_value(), Some(2));
        assert_eq!(Value::Float(2.5).integer_value(), None);
        assert_eq!(Value::Text("abc".into()).integer_value(), None);
        assert_eq!(Value::Bool(true).integer_value(), None);
    }

    #[test]
    fn coarse_integer_truncates() {
        assert_eq!(Value::Float(3.7).coarse_integer(), Some(3));
        assert_eq!(Value::Bool(true).coarse_integer(), Some(1));
        assert_eq!(Value::Text("3.7".into()).coarse_integer(), Some(3));
    }

    #[test]
    fn rendered_len_counts_characters() {
        assert_eq!(Value::Text("héllo".into()).rendered_len(), 5);
        assert_eq!(Value::Int(1234).rendered_len(), 4);
        assert_eq!(Value::Null.rendered_len(), 0);
    }
}
