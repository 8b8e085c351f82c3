//! Resource addresses
//!
//! Provides [`PathElement`] and [`PathAddress`] for addressing resources in
//! the management tree, and [`ChildPattern`] for the child shapes a
//! registration declares.

use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// One `(key, name)` segment of a resource address
///
/// # Examples
/// - `subsystem=web`
/// - `connector=http`
/// - `connector=*` (wildcard, only meaningful in registrations)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathElement {
    key: String,
    value: String,
}

impl PathElement {
    /// Value marking a wildcard element
    pub const WILDCARD: &'static str = "*";

    /// Create element from key and value
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create wildcard element for key
    #[inline]
    #[must_use]
    pub fn wildcard(key: impl Into<String>) -> Self {
        Self::new(key, Self::WILDCARD)
    }

    /// Element key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Element value (the instance name)
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Check if this is a wildcard element
    #[inline]
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.value == Self::WILDCARD
    }

    /// Check if this element matches another, honoring wildcards on `self`
    #[inline]
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.key == other.key && (self.is_wildcard() || self.value == other.value)
    }
}

impl Display for PathElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl FromStr for PathElement {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, value)) if !key.is_empty() && !value.is_empty() && !value.contains('=') => {
                Ok(Self::new(key, value))
            }
            _ => Err(AddressError::InvalidElement(s.to_string())),
        }
    }
}

/// Address of a resource relative to some root
///
/// The root address is the empty sequence. Most addresses are a handful of
/// segments deep, so segments are stored inline.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PathAddress(SmallVec<[PathElement; 4]>);

impl PathAddress {
    /// Create address from elements
    #[inline]
    #[must_use]
    pub fn new(elements: Vec<PathElement>) -> Self {
        Self(SmallVec::from_vec(elements))
    }

    /// Root (empty) address
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(SmallVec::new())
    }

    /// Address with a single element
    #[inline]
    #[must_use]
    pub fn single(element: PathElement) -> Self {
        let mut elements = SmallVec::new();
        elements.push(element);
        Self(elements)
    }

    /// Address elements
    #[inline]
    #[must_use]
    pub fn elements(&self) -> &[PathElement] {
        &self.0
    }

    /// Number of elements
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if this is the root address
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parent address (if not root)
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.0.split_last()?;
        Some(Self(init.iter().cloned().collect()))
    }

    /// Last element (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&PathElement> {
        self.0.last()
    }

    /// Append an element, returning the new address
    #[inline]
    #[must_use]
    pub fn append(&self, element: PathElement) -> Self {
        let mut new = self.clone();
        new.0.push(element);
        new
    }

    /// Check if this address is a prefix of another
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0[..] == other.0[..self.0.len()]
    }

    /// Get address relative to ancestor
    ///
    /// # Errors
    /// Returns error if `self` is not a descendant of `ancestor`
    pub fn relative_to(&self, ancestor: &Self) -> Result<Self, AddressError> {
        if !ancestor.is_prefix_of(self) {
            return Err(AddressError::NotDescendant {
                address: self.to_string(),
                ancestor: ancestor.to_string(),
            });
        }
        Ok(Self(self.0[ancestor.0.len()..].iter().cloned().collect()))
    }

    /// Iterator over elements from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &PathElement> {
        self.0.iter()
    }
}

impl Display for PathAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for element in &self.0 {
            write!(f, "/{element}")?;
        }
        Ok(())
    }
}

impl FromStr for PathAddress {
    type Err = AddressError;

    /// Parse `/key=value/key=value`; the leading slash is optional and `/`
    /// alone is the root
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix('/').unwrap_or(s);
        if body.is_empty() {
            return Ok(Self::root());
        }

        body.split('/')
            .map(|segment| {
                if segment.is_empty() {
                    Err(AddressError::EmptySegment)
                } else {
                    segment.parse::<PathElement>()
                }
            })
            .collect::<Result<SmallVec<_>, _>>()
            .map(Self)
    }
}

impl From<Vec<PathElement>> for PathAddress {
    fn from(elements: Vec<PathElement>) -> Self {
        Self::new(elements)
    }
}

impl FromIterator<PathElement> for PathAddress {
    fn from_iter<I: IntoIterator<Item = PathElement>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Child shape declared by a registration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChildPattern {
    /// Any number of dynamically named children under `key`
    Wildcard {
        /// Child key
        key: String,
    },

    /// Exactly one child with a fixed `(key, value)`
    Singleton(PathElement),
}

impl ChildPattern {
    /// Wildcard pattern for key
    #[inline]
    #[must_use]
    pub fn wildcard(key: impl Into<String>) -> Self {
        Self::Wildcard { key: key.into() }
    }

    /// Singleton pattern for `(key, value)`
    #[inline]
    #[must_use]
    pub fn singleton(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Singleton(PathElement::new(key, value))
    }

    /// Pattern key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Wildcard { key } => key,
            Self::Singleton(element) => element.key(),
        }
    }

    /// Check if this is a wildcard pattern
    #[inline]
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard { .. })
    }

    /// Check if a concrete child element fits this pattern
    #[inline]
    #[must_use]
    pub fn matches(&self, element: &PathElement) -> bool {
        match self {
            Self::Wildcard { key } => key == element.key(),
            Self::Singleton(fixed) => fixed == element,
        }
    }

    /// Element form (`key=*` for wildcards)
    #[must_use]
    pub fn to_element(&self) -> PathElement {
        match self {
            Self::Wildcard { key } => PathElement::wildcard(key.clone()),
            Self::Singleton(element) => element.clone(),
        }
    }
}

impl From<PathElement> for ChildPattern {
    fn from(element: PathElement) -> Self {
        if element.is_wildcard() {
            Self::Wildcard { key: element.key }
        } else {
            Self::Singleton(element)
        }
    }
}

impl Display for ChildPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_element())
    }
}

/// Errors related to addresses
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    /// Empty segment in address
    #[error("address contains empty segment")]
    EmptySegment,

    /// Segment is not `key=value`
    #[error("invalid address element: '{0}' (expected key=value)")]
    InvalidElement(String),

    /// Not a descendant address
    #[error("address '{address}' is not a descendant of '{ancestor}'")]
    NotDescendant { address: String, ancestor: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn addr(s: &str) -> PathAddress {
        s.parse().unwrap()
    }

    #[test]
    fn element_accessors() {
        let element = PathElement::new("subsystem", "web");
        assert_eq!(element.key(), "subsystem");
        assert_eq!(element.value(), "web");
        assert!(!element.is_wildcard());
        assert!(PathElement::wildcard("connector").is_wildcard());
    }

    #[test]
    fn element_matches_wildcard() {
        let wildcard = PathElement::wildcard("connector");
        let http = PathElement::new("connector", "http");
        assert!(wildcard.matches(&http));
        assert!(!http.matches(&wildcard));
        assert!(!wildcard.matches(&PathElement::new("other", "http")));
    }

    #[test]
    fn element_parse() {
        let element: PathElement = "subsystem=web".parse().unwrap();
        assert_eq!(element, PathElement::new("subsystem", "web"));

        assert!(matches!(
            "subsystem".parse::<PathElement>(),
            Err(AddressError::InvalidElement(_))
        ));
        assert!("=web".parse::<PathElement>().is_err());
        assert!("subsystem=".parse::<PathElement>().is_err());
        assert!("a=b=c".parse::<PathElement>().is_err());
    }

    #[test]
    fn address_root() {
        let root = PathAddress::root();
        assert!(root.is_empty());
        assert_eq!(root.to_string(), "/");
        assert!(root.parent().is_none());
        assert_eq!(addr("/"), root);
        assert_eq!(addr(""), root);
    }

    #[test]
    fn address_display_and_parse() {
        let address = addr("/subsystem=web/connector=http");
        assert_eq!(address.len(), 2);
        assert_eq!(address.to_string(), "/subsystem=web/connector=http");
        assert_eq!(addr("subsystem=web/connector=http"), address);
    }

    #[test]
    fn address_parse_errors() {
        assert!(matches!(
            "/subsystem=web//connector=http".parse::<PathAddress>(),
            Err(AddressError::EmptySegment)
        ));
        assert!(matches!(
            "/subsystem".parse::<PathAddress>(),
            Err(AddressError::InvalidElement(_))
        ));
    }

    #[test]
    fn address_parent_and_last() {
        let address = addr("/subsystem=web/connector=http");
        assert_eq!(address.parent(), Some(addr("/subsystem=web")));
        assert_eq!(address.last(), Some(&PathElement::new("connector", "http")));
    }

    #[test]
    fn address_append() {
        let address = PathAddress::single(PathElement::new("subsystem", "web"));
        let child = address.append(PathElement::new("connector", "ajp"));
        assert_eq!(child.to_string(), "/subsystem=web/connector=ajp");
        assert_eq!(address.len(), 1);
    }

    #[test]
    fn address_prefix() {
        let parent = addr("/subsystem=web");
        let child = addr("/subsystem=web/connector=http");
        assert!(parent.is_prefix_of(&child));
        assert!(!child.is_prefix_of(&parent));
        assert!(PathAddress::root().is_prefix_of(&parent));
    }

    #[test]
    fn address_relative_to() {
        let full = addr("/subsystem=web/connector=http/ssl=configuration");
        let relative = full.relative_to(&addr("/subsystem=web")).unwrap();
        assert_eq!(relative.to_string(), "/connector=http/ssl=configuration");

        let result = full.relative_to(&addr("/subsystem=ejb"));
        assert!(matches!(result, Err(AddressError::NotDescendant { .. })));
    }

    #[test]
    fn pattern_matches() {
        let wildcard = ChildPattern::wildcard("connector");
        let singleton = ChildPattern::singleton("ssl", "configuration");

        assert!(wildcard.matches(&PathElement::new("connector", "http")));
        assert!(singleton.matches(&PathElement::new("ssl", "configuration")));
        assert!(!singleton.matches(&PathElement::new("ssl", "other")));
        assert_eq!(wildcard.key(), "connector");
        assert!(wildcard.is_wildcard());
    }

    #[test]
    fn pattern_from_element() {
        assert_eq!(
            ChildPattern::from(PathElement::wildcard("connector")),
            ChildPattern::wildcard("connector")
        );
        assert_eq!(
            ChildPattern::from(PathElement::new("ssl", "configuration")),
            ChildPattern::singleton("ssl", "configuration")
        );
        assert_eq!(ChildPattern::wildcard("connector").to_string(), "connector=*");
    }

    fn arb_address() -> impl Strategy<Value = PathAddress> {
        proptest::collection::vec(("[a-z][a-z0-9-]{0,8}", "[a-z0-9*][a-z0-9.-]{0,8}"), 0..6)
            .prop_map(|pairs| pairs.into_iter().map(|(k, v)| PathElement::new(k, v)).collect::<PathAddress>())
    }

    proptest! {
        #[test]
        fn prop_display_parses_back(address in arb_address()) {
            prop_assert_eq!(addr(&address.to_string()), address);
        }

        #[test]
        fn prop_relative_to_prefix_rebuilds_address(address in arb_address(), split in 0usize..6) {
            let split = split.min(address.len());
            let prefix: PathAddress = address.iter().take(split).cloned().collect();

            prop_assert!(prefix.is_prefix_of(&address));
            let relative = address.relative_to(&prefix).unwrap();
            let rebuilt = relative.iter().cloned().fold(prefix, |acc, e| acc.append(e));
            prop_assert_eq!(rebuilt, address);
        }
    }
}
