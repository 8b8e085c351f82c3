//! Materialized resource trees
//!
//! A [`Resource`] pairs a payload (the node's own attribute values) with an
//! ordered set of children keyed by [`PathElement`]. The payload never holds
//! child subtrees; [`Resource::to_model`] folds them back in when a flat
//! value tree is needed.

use crate::address::{PathAddress, PathElement};
use crate::value::ModelValue;
use indexmap::IndexMap;

/// Node of a resource tree
///
/// Children keep insertion order and there is at most one child per
/// `(key, name)`. Trees are plain owned values: cloning produces an
/// independent copy and equality is deep.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resource {
    model: ModelValue,
    children: IndexMap<PathElement, Resource>,
}

impl Resource {
    /// Create resource with an undefined payload and no children
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create resource with the given payload
    #[inline]
    #[must_use]
    pub fn with_model(model: ModelValue) -> Self {
        Self {
            model,
            children: IndexMap::new(),
        }
    }

    /// Payload
    #[inline]
    #[must_use]
    pub fn model(&self) -> &ModelValue {
        &self.model
    }

    /// Mutable payload
    #[inline]
    pub fn model_mut(&mut self) -> &mut ModelValue {
        &mut self.model
    }

    /// Replace the payload
    #[inline]
    pub fn write_model(&mut self, model: ModelValue) {
        self.model = model;
    }

    /// Register a new child
    ///
    /// # Errors
    /// - [`ResourceError::WildcardChild`] if `element` is a wildcard
    /// - [`ResourceError::DuplicateChild`] if a child already exists there
    pub fn register_child(
        &mut self,
        element: PathElement,
        child: Resource,
    ) -> Result<(), ResourceError> {
        if element.is_wildcard() {
            return Err(ResourceError::WildcardChild(element));
        }
        if self.children.contains_key(&element) {
            return Err(ResourceError::DuplicateChild(element));
        }
        self.children.insert(element, child);
        Ok(())
    }

    /// Insert or replace a child, keeping its position if it existed
    pub fn replace_child(&mut self, element: PathElement, child: Resource) -> Option<Resource> {
        self.children.insert(element, child)
    }

    /// Remove a child, keeping the order of the remaining children
    pub fn remove_child(&mut self, element: &PathElement) -> Option<Resource> {
        self.children.shift_remove(element)
    }

    /// Direct child at element
    #[inline]
    #[must_use]
    pub fn child(&self, element: &PathElement) -> Option<&Resource> {
        self.children.get(element)
    }

    /// Mutable direct child at element
    #[inline]
    pub fn child_mut(&mut self, element: &PathElement) -> Option<&mut Resource> {
        self.children.get_mut(element)
    }

    /// Check if a direct child exists
    #[inline]
    #[must_use]
    pub fn has_child(&self, element: &PathElement) -> bool {
        self.children.contains_key(element)
    }

    /// Check if this resource has any children
    #[inline]
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// All children, in insertion order
    pub fn iter_children(&self) -> impl Iterator<Item = (&PathElement, &Resource)> {
        self.children.iter()
    }

    /// Children under one key, as `(name, child)` in insertion order
    pub fn children<'a>(&'a self, key: &'a str) -> impl Iterator<Item = (&'a str, &'a Resource)> {
        self.children
            .iter()
            .filter(move |(element, _)| element.key() == key)
            .map(|(element, child)| (element.value(), child))
    }

    /// Distinct child keys, in first-seen order
    #[must_use]
    pub fn child_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = Vec::new();
        for element in self.children.keys() {
            if !types.contains(&element.key()) {
                types.push(element.key());
            }
        }
        types
    }

    /// Child names under one key
    #[must_use]
    pub fn children_names(&self, key: &str) -> Vec<&str> {
        self.children
            .keys()
            .filter(|element| element.key() == key)
            .map(PathElement::value)
            .collect()
    }

    /// Descendant at a relative address
    #[must_use]
    pub fn navigate(&self, address: &PathAddress) -> Option<&Resource> {
        address
            .iter()
            .try_fold(self, |current, element| current.child(element))
    }

    /// Number of direct children
    #[inline]
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Split into payload and children
    #[must_use]
    pub fn into_parts(self) -> (ModelValue, IndexMap<PathElement, Resource>) {
        (self.model, self.children)
    }

    /// Fold the tree back into a single value tree
    ///
    /// Children appear as `key => { name => child }` members after the
    /// payload's own attributes.
    #[must_use]
    pub fn to_model(&self) -> ModelValue {
        if self.children.is_empty() {
            return self.model.clone();
        }

        let mut members = match &self.model {
            ModelValue::Object(map) => map.clone(),
            _ => IndexMap::new(),
        };
        for (element, child) in &self.children {
            let by_name = members
                .entry(element.key().to_string())
                .or_insert_with(ModelValue::empty_object);
            if !by_name.is_object() {
                by_name.set_empty_object();
            }
            if let Some(map) = by_name.as_object_mut() {
                map.insert(element.value().to_string(), child.to_model());
            }
        }
        ModelValue::Object(members)
    }
}

/// Errors related to resource trees
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// A child is already registered at this element
    #[error("duplicate child resource: {0}")]
    DuplicateChild(PathElement),

    /// Children must have concrete names
    #[error("cannot register child at wildcard element: {0}")]
    WildcardChild(PathElement),
}
