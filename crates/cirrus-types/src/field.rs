//! Field values stored in a page document.
//!
//! A document field holds a scalar, a flat list of scalars, or an arbitrary
//! nested structure (for example the `redirect` list of objects). Only the
//! first two shapes are ever rewritten by the size limiter.

use serde::{Deserialize, Serialize};

/// A single scalar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Borrow the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer payload, if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// Value of one document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A single scalar
    Scalar(Scalar),
    /// A flat list of scalars
    List(Vec<Scalar>),
    /// Objects, lists of objects, or lists of lists
    Nested(serde_json::Value),
}

impl FieldValue {
    /// Build a list of strings.
    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::List(values.into_iter().map(|v| Scalar::Str(v.into())).collect())
    }

    /// Borrow the string payload of a scalar string field.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) => s.as_str(),
            _ => None,
        }
    }

    /// Get the integer payload of a scalar integer field.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Scalar(s) => s.as_i64(),
            _ => None,
        }
    }

    /// Borrow every element as a string.
    ///
    /// Returns `None` for nested values, non-string scalars, and lists that
    /// contain at least one non-string element. A scalar string is returned
    /// as a one-element list.
    pub fn string_elements(&self) -> Option<Vec<&str>> {
        match self {
            FieldValue::Scalar(Scalar::Str(s)) => Some(vec![s.as_str()]),
            FieldValue::List(items) => items.iter().map(Scalar::as_str).collect(),
            _ => None,
        }
    }

    /// True for an empty list.
    pub fn is_empty_list(&self) -> bool {
        matches!(self, FieldValue::List(items) if items.is_empty())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(value.into())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Scalar(value.into())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Scalar(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Scalar(value.into())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::strings(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_deserialization_shapes() {
        let scalar: FieldValue = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(scalar, FieldValue::from("hello"));

        let int: FieldValue = serde_json::from_str("42").unwrap();
        assert_eq!(int.as_i64(), Some(42));

        let list: FieldValue = serde_json::from_str("[\"a\", 1, null]").unwrap();
        assert_eq!(
            list,
            FieldValue::List(vec![Scalar::from("a"), Scalar::Int(1), Scalar::Null])
        );

        let nested: FieldValue =
            serde_json::from_str(r#"[{"namespace": 0, "title": "Foo"}]"#).unwrap();
        assert!(matches!(nested, FieldValue::Nested(_)));
    }

    #[test]
    fn test_string_elements() {
        assert_eq!(FieldValue::from("x").string_elements(), Some(vec!["x"]));
        assert_eq!(
            FieldValue::strings(["a", "b"]).string_elements(),
            Some(vec!["a", "b"])
        );

        let mixed = FieldValue::List(vec![Scalar::from("a"), Scalar::Int(3)]);
        assert_eq!(mixed.string_elements(), None);
        assert_eq!(FieldValue::from(7).string_elements(), None);
    }

    #[test]
    fn test_serializes_without_tags() {
        let value = FieldValue::strings(["one", "two"]);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"["one","two"]"#);
        assert_eq!(serde_json::to_string(&FieldValue::from(true)).unwrap(), "true");
    }
}
