//! Structured document element
//!
//! A small toolkit-independent tree of named fields and child elements. It is
//! the export form of the viewer state, meant to be embedded in a larger
//! document, and its JSON rendering is what viewer-state slots store.

use clipview_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A primitive field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// A named element holding fields and child elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default)]
    pub children: Vec<Element>,
}

impl Element {
    /// Create an empty element
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style field insertion
    pub fn with_field<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.set_field(key, value);
        self
    }

    /// Builder-style child insertion
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Insert or replace a field
    pub fn set_field<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) {
        self.fields.insert(key.into(), value.into());
    }

    /// Append a child element
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Raw field lookup
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// First child with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn path(&self, key: &str) -> String {
        format!("{}.{}", self.name, key)
    }

    fn require(&self, key: &str) -> Result<&Value> {
        self.fields
            .get(key)
            .ok_or_else(|| Error::deserialization(self.path(key), "missing field"))
    }

    fn mismatch(&self, key: &str, expected: &str, found: &Value) -> Error {
        Error::deserialization(
            self.path(key),
            format!("expected {}, found {}", expected, found.kind()),
        )
    }

    /// Required real field; integers are accepted and widened
    pub fn real(&self, key: &str) -> Result<f64> {
        match self.require(key)? {
            Value::Real(v) if v.is_finite() => Ok(*v),
            Value::Real(_) => Err(Error::deserialization(self.path(key), "value is not finite")),
            Value::Int(v) => Ok(*v as f64),
            other => Err(self.mismatch(key, "real", other)),
        }
    }

    /// Required integer field
    pub fn int(&self, key: &str) -> Result<i64> {
        match self.require(key)? {
            Value::Int(v) => Ok(*v),
            other => Err(self.mismatch(key, "int", other)),
        }
    }

    /// Required boolean field
    pub fn boolean(&self, key: &str) -> Result<bool> {
        match self.require(key)? {
            Value::Bool(v) => Ok(*v),
            other => Err(self.mismatch(key, "bool", other)),
        }
    }

    /// Required text field
    pub fn text(&self, key: &str) -> Result<&str> {
        match self.require(key)? {
            Value::Text(v) => Ok(v.as_str()),
            other => Err(self.mismatch(key, "text", other)),
        }
    }

    /// Required child element
    pub fn require_child(&self, name: &str) -> Result<&Element> {
        self.child(name)
            .ok_or_else(|| Error::deserialization(self.path(name), "missing element"))
    }

    /// Render as JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidData(e.to_string()))
    }

    /// Parse from JSON
    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(|e| Error::deserialization("<document>", e.to_string()))
    }
}

/// Prefix the field path of a deserialization error with its parent context
pub(crate) fn within(context: &str, error: Error) -> Error {
    match error {
        Error::Deserialization { field, reason } => Error::Deserialization {
            field: format!("{}.{}", context, field),
            reason,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("root")
            .with_field("flag", true)
            .with_field("count", 3i64)
            .with_field("ratio", 0.1 + 0.2)
            .with_field("label", "xz")
            .with_child(Element::new("leaf").with_field("x", 1.5))
            .with_child(Element::new("leaf").with_field("x", -2.0))
    }

    #[test]
    fn test_typed_accessors() {
        let element = sample();
        assert!(element.boolean("flag").unwrap());
        assert_eq!(element.int("count").unwrap(), 3);
        assert_eq!(element.real("ratio").unwrap(), 0.1 + 0.2);
        assert_eq!(element.real("count").unwrap(), 3.0);
        assert_eq!(element.text("label").unwrap(), "xz");
        assert_eq!(element.children_named("leaf").count(), 2);
    }

    #[test]
    fn test_missing_field_names_path() {
        let element = sample();
        match element.real("absent") {
            Err(Error::Deserialization { field, reason }) => {
                assert_eq!(field, "root.absent");
                assert_eq!(reason, "missing field");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_type_mismatch() {
        let element = sample();
        match element.boolean("label") {
            Err(Error::Deserialization { field, reason }) => {
                assert_eq!(field, "root.label");
                assert!(reason.contains("expected bool"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_json_preserves_floats_exactly() {
        let element = sample();
        let json = element.to_json().unwrap();
        let parsed = Element::from_json(&json).unwrap();
        assert_eq!(parsed, element);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Element::from_json("{not json"),
            Err(Error::Deserialization { .. })
        ));
    }

    #[test]
    fn test_within_prefixes_path() {
        let error = within("camera", Error::deserialization("position.x", "missing field"));
        match error {
            Error::Deserialization { field, .. } => assert_eq!(field, "camera.position.x"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
