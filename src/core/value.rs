use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Scalar value of a single record field.
///
/// Serialized untagged so payloads and snapshots carry plain JSON scalars.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

/// Partial or full set of scalar fields keyed by field name.
pub type FieldMap = BTreeMap<String, FieldValue>;

impl FieldValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Boolean(_) => "BOOLEAN",
            Self::Text(_) => "TEXT",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Null or a text value with no non-whitespace characters.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Character count of the textual form, used for length ceilings.
    pub fn char_len(&self) -> usize {
        match self {
            Self::Null => 0,
            Self::Text(s) => s.chars().count(),
            other => other.to_string().chars().count(),
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => {
                if a.is_nan() && b.is_nan() {
                    return true;
                }
                (a - b).abs() < f64::EPSILON
            }
            (Self::Integer(i), Self::Float(f)) | (Self::Float(f), Self::Integer(i)) => {
                (*i as f64 - f).abs() < f64::EPSILON
            }
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_json_scalars() {
        let values: Vec<FieldValue> =
            serde_json::from_str(r#"[null, 5, 2.5, true, "abc"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FieldValue::Null,
                FieldValue::Integer(5),
                FieldValue::Float(2.5),
                FieldValue::Boolean(true),
                FieldValue::Text("abc".into()),
            ]
        );
        assert_eq!(
            serde_json::to_string(&FieldValue::Null).unwrap(),
            "null"
        );
    }

    #[test]
    fn blank_and_length() {
        assert!(FieldValue::Text("  ".into()).is_blank());
        assert!(FieldValue::Null.is_blank());
        assert!(!FieldValue::Integer(0).is_blank());
        assert_eq!(FieldValue::Text("héllo".into()).char_len(), 5);
        assert_eq!(FieldValue::Integer(1234).char_len(), 4);
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(FieldValue::Integer(3), FieldValue::Float(3.0));
        assert_eq!(FieldValue::Text(" 4.5 ".into()).as_f64(), Some(4.5));
        assert_eq!(FieldValue::Boolean(true).as_f64(), None);
    }
}
