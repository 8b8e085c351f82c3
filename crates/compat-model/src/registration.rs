//! Resource registrations
//!
//! A [`Registration`] describes one node of the management schema: which
//! attributes are valid there and which child shapes may appear below it.
//! [`ResourceSchema`] is the in-memory implementation, built either with its
//! builder methods or from the description format stored in legacy schema
//! snapshots.
//!
//! # Description format
//!
//! ```text
//! {
//!     "description": "...",
//!     "attributes": { "<name>": { ... } },
//!     "children": {
//!         "<key>": { "model-description": { "*" | "<value>": <description> } }
//!     }
//! }
//! ```

use crate::address::{ChildPattern, PathAddress, PathElement};
use crate::value::ModelValue;
use indexmap::IndexMap;
use std::fmt::Debug;

const DESCRIPTION: &str = "description";
const ATTRIBUTES: &str = "attributes";
const CHILDREN: &str = "children";
const MODEL_DESCRIPTION: &str = "model-description";

/// Schema for one node of the management tree
///
/// Schemas are finite and acyclic: following `sub_registration` always
/// terminates.
pub trait Registration: Send + Sync + Debug {
    /// Attribute names valid at this node (order irrelevant)
    fn attribute_names(&self) -> Vec<String>;

    /// Declared child patterns, in declaration order
    fn child_patterns(&self) -> Vec<ChildPattern>;

    /// Registration for a declared child pattern
    fn sub_registration(&self, pattern: &ChildPattern) -> Option<&dyn Registration>;

    /// Registration governing a concrete child element
    ///
    /// A singleton registered for exactly `element` wins over a wildcard
    /// registered for its key.
    fn child_registration(&self, element: &PathElement) -> Option<&dyn Registration> {
        let exact = ChildPattern::from(element.clone());
        self.sub_registration(&exact)
            .or_else(|| self.sub_registration(&ChildPattern::wildcard(element.key())))
    }

    /// Check if no child patterns are declared
    fn is_leaf(&self) -> bool {
        self.child_patterns().is_empty()
    }
}

/// In-memory registration tree
///
/// # Example
/// ```rust
/// use compat_model::{Registration, ResourceSchema};
///
/// let schema = ResourceSchema::new()
///     .attribute("default-host")
///     .wildcard_child("connector", ResourceSchema::new().attribute("port"));
///
/// assert_eq!(schema.attribute_names(), vec!["default-host".to_string()]);
/// assert_eq!(schema.child_patterns().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceSchema {
    description: Option<String>,
    attributes: IndexMap<String, ModelValue>,
    children: IndexMap<ChildPattern, ResourceSchema>,
}

impl ResourceSchema {
    /// Create schema with no attributes or children
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the human-readable description
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Declare an attribute
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes
            .insert(name.into(), ModelValue::empty_object());
        self
    }

    /// Declare several attributes
    #[must_use]
    pub fn attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self = self.attribute(name);
        }
        self
    }

    /// Declare a wildcard child
    #[must_use]
    pub fn wildcard_child(mut self, key: impl Into<String>, schema: ResourceSchema) -> Self {
        self.children.insert(ChildPattern::wildcard(key), schema);
        self
    }

    /// Declare a singleton child
    #[must_use]
    pub fn singleton_child(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        schema: ResourceSchema,
    ) -> Self {
        self.children
            .insert(ChildPattern::singleton(key, value), schema);
        self
    }

    /// Human-readable description, if any
    #[inline]
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Stored description of one attribute
    #[inline]
    #[must_use]
    pub fn attribute_description(&self, name: &str) -> Option<&ModelValue> {
        self.attributes.get(name)
    }

    /// Concrete child schema by pattern
    #[inline]
    #[must_use]
    pub fn child_schema(&self, pattern: &ChildPattern) -> Option<&ResourceSchema> {
        self.children.get(pattern)
    }

    /// Build schema from a resource description
    ///
    /// # Errors
    /// Returns [`DescriptionError`] if a section has the wrong shape
    pub fn from_description(description: &ModelValue) -> Result<Self, DescriptionError> {
        Self::parse_node(description, &PathAddress::root())
    }

    fn parse_node(node: &ModelValue, location: &PathAddress) -> Result<Self, DescriptionError> {
        if !node.is_object() {
            return Err(DescriptionError::not_an_object(location, None, node));
        }

        let mut schema = Self::new();
        if let Some(text) = node.get(DESCRIPTION).and_then(ModelValue::as_str) {
            schema.description = Some(text.to_string());
        }

        if let Some(attributes) = defined_section(node, ATTRIBUTES, location)? {
            for (name, attribute) in attributes.properties() {
                schema.attributes.insert(name.to_string(), attribute.clone());
            }
        }

        if let Some(children) = defined_section(node, CHILDREN, location)? {
            for (key, child) in children.properties() {
                if !child.is_object() {
                    return Err(DescriptionError::not_an_object(location, Some(key), child));
                }
                let Some(by_value) = defined_section(child, MODEL_DESCRIPTION, location)? else {
                    continue;
                };
                for (value, sub) in by_value.properties() {
                    let element = PathElement::new(key, value);
                    let sub_schema = if sub.is_defined() {
                        Self::parse_node(sub, &location.append(element.clone()))?
                    } else {
                        Self::new()
                    };
                    schema.children.insert(ChildPattern::from(element), sub_schema);
                }
            }
        }

        Ok(schema)
    }

    /// Render this schema in description format
    #[must_use]
    pub fn to_description(&self) -> ModelValue {
        let mut members: IndexMap<String, ModelValue> = IndexMap::new();
        if let Some(text) = &self.description {
            members.insert(DESCRIPTION.to_string(), ModelValue::from(text.as_str()));
        }
        members.insert(
            ATTRIBUTES.to_string(),
            ModelValue::Object(self.attributes.clone()),
        );

        let mut children: IndexMap<String, ModelValue> = IndexMap::new();
        for (pattern, sub) in &self.children {
            let element = pattern.to_element();
            let entry = children
                .entry(element.key().to_string())
                .or_insert_with(|| {
                    ModelValue::object([(MODEL_DESCRIPTION, ModelValue::empty_object())])
                });
            if let Some(by_value) = entry
                .get_mut(MODEL_DESCRIPTION)
                .and_then(ModelValue::as_object_mut)
            {
                by_value.insert(element.value().to_string(), sub.to_description());
            }
        }
        members.insert(CHILDREN.to_string(), ModelValue::Object(children));
        ModelValue::Object(members)
    }
}

/// Read an optional section that must be an object when defined
fn defined_section<'a>(
    node: &'a ModelValue,
    section: &'static str,
    location: &PathAddress,
) -> Result<Option<&'a ModelValue>, DescriptionError> {
    match node.get(section) {
        None | Some(ModelValue::Undefined) => Ok(None),
        Some(value) if value.is_object() => Ok(Some(value)),
        Some(value) => Err(DescriptionError::not_an_object(location, Some(section), value)),
    }
}

impl Registration for ResourceSchema {
    fn attribute_names(&self) -> Vec<String> {
        self.attributes.keys().cloned().collect()
    }

    fn child_patterns(&self) -> Vec<ChildPattern> {
        self.children.keys().cloned().collect()
    }

    fn sub_registration(&self, pattern: &ChildPattern) -> Option<&dyn Registration> {
        self.children
            .get(pattern)
            .map(|schema| schema as &dyn Registration)
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Errors reading resource descriptions
#[derive(Debug, thiserror::Error)]
pub enum DescriptionError {
    /// A description node or section is not an object
    #[error("malformed description at {location}: {section} must be an object, got {actual}")]
    NotAnObject {
        location: String,
        section: String,
        actual: &'static str,
    },
}

impl DescriptionError {
    fn not_an_object(location: &PathAddress, section: Option<&str>, actual: &ModelValue) -> Self {
        Self::NotAnObject {
            location: location.to_string(),
            section: section.unwrap_or("node").to_string(),
            actual: actual.type_name(),
        }
    }
}
