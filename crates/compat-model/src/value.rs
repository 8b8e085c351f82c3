//! Dynamically typed value trees
//!
//! Provides [`ModelValue`], the semi-structured value carried by resource
//! payloads and legacy schema snapshots.
//!
//! A named field of an object value is in one of three states:
//! - **absent**: the key is not present at all
//! - **undefined**: the key is present with [`ModelValue::Undefined`]
//! - **defined**: the key is present with any other variant
//!
//! These states are queried through [`ModelValue::state`] and are never
//! collapsed into one another.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::fmt::{self, Display, Formatter};
use std::io::Read;

/// A node of a dynamically typed value tree
///
/// Object members keep their insertion order, which is also the order
/// they were read from a serialized stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ModelValue {
    /// Declared but carrying no value
    #[default]
    Undefined,

    /// Boolean scalar
    Boolean(bool),

    /// Integral scalar
    Long(i64),

    /// Floating point scalar
    Double(f64),

    /// String scalar
    String(String),

    /// Ordered list of values
    List(Vec<ModelValue>),

    /// Ordered map of named values
    Object(IndexMap<String, ModelValue>),
}

/// Definedness of a named field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueState {
    /// Key not present
    Absent,

    /// Key present, value undefined
    Undefined,

    /// Key present with a value
    Defined,
}

impl ModelValue {
    /// Create an undefined value
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::Undefined
    }

    /// Create a defined object with no members
    #[inline]
    #[must_use]
    pub fn empty_object() -> Self {
        Self::Object(IndexMap::new())
    }

    /// Build an object from `(name, value)` pairs, keeping their order
    #[must_use]
    pub fn object<K, I>(members: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ModelValue)>,
    {
        Self::Object(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Check whether this value is defined
    #[inline]
    #[must_use]
    pub fn is_defined(&self) -> bool {
        !matches!(self, Self::Undefined)
    }

    /// Check whether this value is an object
    #[inline]
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Name of the variant, for diagnostics
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "UNDEFINED",
            Self::Boolean(_) => "BOOLEAN",
            Self::Long(_) => "LONG",
            Self::Double(_) => "DOUBLE",
            Self::String(_) => "STRING",
            Self::List(_) => "LIST",
            Self::Object(_) => "OBJECT",
        }
    }

    /// Get a named member
    ///
    /// Returns `None` when the member is absent or this value is not an
    /// object. An undefined member is returned as `Some(&Undefined)`.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ModelValue> {
        match self {
            Self::Object(map) => map.get(name),
            _ => None,
        }
    }

    /// Get a named member mutably
    #[inline]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ModelValue> {
        match self {
            Self::Object(map) => map.get_mut(name),
            _ => None,
        }
    }

    /// Definedness of a named member
    #[must_use]
    pub fn state(&self, name: &str) -> ValueState {
        match self.get(name) {
            None => ValueState::Absent,
            Some(Self::Undefined) => ValueState::Undefined,
            Some(_) => ValueState::Defined,
        }
    }

    /// Check whether a named member is present and defined
    #[inline]
    #[must_use]
    pub fn has_defined(&self, name: &str) -> bool {
        self.state(name) == ValueState::Defined
    }

    /// Follow a sequence of member names
    #[must_use]
    pub fn get_path(&self, path: &[&str]) -> Option<&ModelValue> {
        let mut current = self;
        for segment in path {
            current = current.get(segment)?;
        }
        Some(current)
    }

    /// Set a named member
    ///
    /// An undefined value becomes an object on first write.
    ///
    /// # Errors
    /// Returns [`ValueError::TypeMismatch`] if this value is defined but not
    /// an object
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ModelValue>,
    ) -> Result<(), ValueError> {
        if let Self::Undefined = self {
            *self = Self::empty_object();
        }
        match self {
            Self::Object(map) => {
                map.insert(name.into(), value.into());
                Ok(())
            }
            other => Err(ValueError::type_mismatch("OBJECT", other)),
        }
    }

    /// Remove a named member, keeping the order of the remaining members
    pub fn remove(&mut self, name: &str) -> Option<ModelValue> {
        match self {
            Self::Object(map) => map.shift_remove(name),
            _ => None,
        }
    }

    /// Replace this value with a defined, empty object
    #[inline]
    pub fn set_empty_object(&mut self) {
        *self = Self::empty_object();
    }

    /// Append to a list
    ///
    /// An undefined value becomes a list on first append.
    ///
    /// # Errors
    /// Returns [`ValueError::TypeMismatch`] if this value is defined but not
    /// a list
    pub fn push(&mut self, value: impl Into<ModelValue>) -> Result<(), ValueError> {
        if let Self::Undefined = self {
            *self = Self::List(Vec::new());
        }
        match self {
            Self::List(items) => {
                items.push(value.into());
                Ok(())
            }
            other => Err(ValueError::type_mismatch("LIST", other)),
        }
    }

    /// Borrow as object members
    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&IndexMap<String, ModelValue>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow as mutable object members
    #[inline]
    pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, ModelValue>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow as list items
    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[ModelValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow as a string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read as an integer
    #[inline]
    #[must_use]
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(n) => Some(*n),
            _ => None,
        }
    }

    /// Read as a float, widening integers
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(n) => Some(*n),
            Self::Long(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Read as a boolean
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Member names of an object, in order (empty for non-objects)
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.as_object()
            .into_iter()
            .flat_map(|map| map.keys().map(String::as_str))
    }

    /// `(name, value)` members of an object, in order (empty for non-objects)
    pub fn properties(&self) -> impl Iterator<Item = (&str, &ModelValue)> {
        self.as_object()
            .into_iter()
            .flat_map(|map| map.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Parse a value tree from its serialized form
    ///
    /// JSON `null` decodes to [`ModelValue::Undefined`]; object members keep
    /// document order.
    ///
    /// # Errors
    /// Returns [`ValueError::Malformed`] if the bytes are not a valid stream
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValueError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Ok(Self::from(value))
    }

    /// Read and parse a value tree from a byte stream
    ///
    /// # Errors
    /// - [`ValueError::Io`] if reading fails
    /// - [`ValueError::Malformed`] if the content is not a valid stream
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, ValueError> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Self::from_slice(&buf)
    }

    /// Convert to a JSON value
    ///
    /// Non-finite doubles have no JSON form and become `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::from(self)
    }

    /// Serialize to a compact string
    #[must_use]
    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }

    /// Serialize to an indented string
    #[must_use]
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.to_json()).unwrap_or_default()
    }
}

impl Display for ModelValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<Value> for ModelValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Undefined,
            Value::Bool(b) => Self::Boolean(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Long(i)
                } else if let Some(u) = n.as_u64() {
                    Self::Double(u as f64)
                } else {
                    Self::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&ModelValue> for Value {
    fn from(value: &ModelValue) -> Self {
        match value {
            ModelValue::Undefined => Value::Null,
            ModelValue::Boolean(b) => Value::Bool(*b),
            ModelValue::Long(n) => Value::Number((*n).into()),
            ModelValue::Double(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
            ModelValue::String(s) => Value::String(s.clone()),
            ModelValue::List(items) => Value::Array(items.iter().map(Value::from).collect()),
            ModelValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

impl From<bool> for ModelValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for ModelValue {
    fn from(value: i32) -> Self {
        Self::Long(i64::from(value))
    }
}

impl From<i64> for ModelValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<u32> for ModelValue {
    fn from(value: u32) -> Self {
        Self::Long(i64::from(value))
    }
}

impl From<f64> for ModelValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for ModelValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ModelValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<ModelValue>> for ModelValue {
    fn from(items: Vec<ModelValue>) -> Self {
        Self::List(items)
    }
}

impl<K: Into<String>> FromIterator<(K, ModelValue)> for ModelValue {
    fn from_iter<I: IntoIterator<Item = (K, ModelValue)>>(iter: I) -> Self {
        Self::object(iter)
    }
}

impl Serialize for ModelValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ModelValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}

/// Errors related to value trees
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// Stream content is not a valid value tree
    #[error("malformed value stream: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Stream could not be read
    #[error("io error reading value stream: {0}")]
    Io(#[from] std::io::Error),

    /// Operation requires a different variant
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

impl ValueError {
    fn type_mismatch(expected: &'static str, actual: &ModelValue) -> Self {
        Self::TypeMismatch {
            expected,
            actual: actual.type_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn three_states_are_distinct() {
        let value = ModelValue::from(json!({"defined": 1, "undefined": null}));

        assert_eq!(value.state("defined"), ValueState::Defined);
        assert_eq!(value.state("undefined"), ValueState::Undefined);
        assert_eq!(value.state("absent"), ValueState::Absent);

        assert!(value.has_defined("defined"));
        assert!(!value.has_defined("undefined"));
        assert_eq!(value.get("undefined"), Some(&ModelValue::Undefined));
        assert_eq!(value.get("absent"), None);
    }

    #[test]
    fn scalar_has_no_members() {
        let value = ModelValue::from("text");
        assert_eq!(value.state("anything"), ValueState::Absent);
        assert_eq!(value.keys().count(), 0);
    }

    #[test]
    fn object_keeps_document_order() {
        let value = ModelValue::from_slice(br#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
        let keys: Vec<_> = value.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn set_on_undefined_creates_object() {
        let mut value = ModelValue::new();
        assert!(!value.is_defined());

        value.set("port", 8080).unwrap();
        assert!(value.is_object());
        assert_eq!(value.get("port").and_then(ModelValue::as_long), Some(8080));
    }

    #[test]
    fn set_on_scalar_fails() {
        let mut value = ModelValue::from(true);
        let result = value.set("x", 1);
        assert!(matches!(
            result,
            Err(ValueError::TypeMismatch {
                expected: "OBJECT",
                actual: "BOOLEAN"
            })
        ));
    }

    #[test]
    fn push_on_undefined_creates_list() {
        let mut value = ModelValue::new();
        value.push("a").unwrap();
        value.push("b").unwrap();
        assert_eq!(value.as_list().map(<[ModelValue]>::len), Some(2));
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut value = ModelValue::from(json!({"a": 1, "b": 2, "c": 3}));
        assert_eq!(value.remove("b"), Some(ModelValue::Long(2)));
        let keys: Vec<_> = value.keys().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn get_path_descends() {
        let value = ModelValue::from(json!({"server": {"host": "localhost", "port": 8080}}));
        assert_eq!(
            value.get_path(&["server", "host"]).and_then(ModelValue::as_str),
            Some("localhost")
        );
        assert_eq!(value.get_path(&["server", "missing"]), None);
        assert_eq!(value.get_path(&[]), Some(&value));
    }

    #[test]
    fn empty_object_is_defined() {
        let mut value = ModelValue::new();
        value.set_empty_object();
        assert!(value.is_defined());
        assert_eq!(value.as_object().map(IndexMap::len), Some(0));
    }

    #[test]
    fn numbers_convert() {
        let value = ModelValue::from(json!({"int": 42, "float": 1.5, "neg": -7}));
        assert_eq!(value.get("int"), Some(&ModelValue::Long(42)));
        assert_eq!(value.get("float"), Some(&ModelValue::Double(1.5)));
        assert_eq!(value.get("neg"), Some(&ModelValue::Long(-7)));
    }

    #[test]
    fn json_conversion_preserves_undefined() {
        let original = json!({"a": null, "b": [1, "two", null], "c": {"d": false}});
        let value = ModelValue::from(original.clone());
        assert_eq!(value.to_json(), original);
    }

    #[test]
    fn malformed_stream_is_error() {
        let result = ModelValue::from_slice(b"{\"a\": ");
        assert!(matches!(result, Err(ValueError::Malformed(_))));
    }

    #[test]
    fn from_reader_parses() {
        let bytes: &[u8] = br#"{"name": "web"}"#;
        let value = ModelValue::from_reader(bytes).unwrap();
        assert_eq!(value.get("name").and_then(ModelValue::as_str), Some("web"));
    }

    #[test]
    fn serde_roundtrip_through_json() {
        let value = ModelValue::object([("enabled", ModelValue::from(true))]);
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, r#"{"enabled":true}"#);
        let back: ModelValue = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn display_is_compact_json() {
        let value = ModelValue::object([("a", ModelValue::Undefined)]);
        assert_eq!(value.to_string(), r#"{"a":null}"#);
    }
}
