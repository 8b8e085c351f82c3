//! Legacy subsystem definitions
//!
//! Snapshots of older subsystem resource descriptions, read from a
//! [`Catalog`] and kept in a bounded cache. The catalog is a bundled,
//! immutable artifact, so a parsed definition never goes stale.

use crate::catalog::Catalog;
use crate::error::CatalogError;
use compat_model::{ChildPattern, ModelValue, Registration, ResourceSchema};
use moka::sync::Cache;
use std::fmt;
use std::sync::Arc;

/// Catalog key of a legacy definition: `<subsystem>-<major>.<minor>.dmr`
///
/// Micro versions never change the schema, so they are not part of the key.
#[must_use]
pub fn catalog_key(subsystem: &str, major: u32, minor: u32) -> String {
    format!("{subsystem}-{major}.{minor}.dmr")
}

/// Registration of a subsystem as it was at an older model version
#[derive(Debug, Clone)]
pub struct LegacyRegistration {
    subsystem: String,
    major: u32,
    minor: u32,
    description: ModelValue,
    schema: ResourceSchema,
}

impl LegacyRegistration {
    /// Build from a raw description
    ///
    /// # Errors
    /// Returns `DescriptionError` if the description is malformed
    pub fn from_description(
        subsystem: impl Into<String>,
        major: u32,
        minor: u32,
        description: ModelValue,
    ) -> Result<Self, compat_model::DescriptionError> {
        let schema = ResourceSchema::from_description(&description)?;
        Ok(Self {
            subsystem: subsystem.into(),
            major,
            minor,
            description,
            schema,
        })
    }

    /// Subsystem name
    #[inline]
    #[must_use]
    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    /// Major version of the snapshot
    #[inline]
    #[must_use]
    pub fn major(&self) -> u32 {
        self.major
    }

    /// Minor version of the snapshot
    #[inline]
    #[must_use]
    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// Raw description as read from the catalog
    #[inline]
    #[must_use]
    pub fn description(&self) -> &ModelValue {
        &self.description
    }

    /// Parsed schema
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }
}

impl Registration for LegacyRegistration {
    fn attribute_names(&self) -> Vec<String> {
        self.schema.attribute_names()
    }

    fn child_patterns(&self) -> Vec<ChildPattern> {
        self.schema.child_patterns()
    }

    fn sub_registration(&self, pattern: &ChildPattern) -> Option<&dyn Registration> {
        self.schema.sub_registration(pattern)
    }
}

/// Loads legacy definitions from a catalog
///
/// # Example
/// ```rust
/// use compat_model::Registration;
/// use compat_transform::{LegacySchemaLoader, MemoryCatalog};
/// use std::sync::Arc;
///
/// let catalog = MemoryCatalog::new()
///     .with_entry("web-1.1.dmr", br#"{"attributes": {"default-host": {}}}"#.to_vec());
/// let loader = LegacySchemaLoader::new(Arc::new(catalog));
///
/// let web = loader.load("web", 1, 1).unwrap();
/// assert_eq!(web.schema().attribute_names(), vec!["default-host"]);
/// assert!(loader.load("web", 1, 0).is_none());
/// ```
#[derive(Clone)]
pub struct LegacySchemaLoader {
    catalog: Arc<dyn Catalog>,
    cache: Cache<String, Arc<LegacyRegistration>>,
}

impl LegacySchemaLoader {
    /// Default number of cached definitions
    pub const DEFAULT_CAPACITY: u64 = 256;

    /// Create loader over catalog
    #[inline]
    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self::with_capacity(catalog, Self::DEFAULT_CAPACITY)
    }

    /// Create loader with cache capacity
    #[must_use]
    pub fn with_capacity(catalog: Arc<dyn Catalog>, capacity: u64) -> Self {
        Self {
            catalog,
            cache: Cache::new(capacity),
        }
    }

    /// Catalog backing this loader
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Load a legacy definition
    ///
    /// # Returns
    /// `None` if the catalog has no entry, or if the entry cannot be read or
    /// parsed (logged at error level)
    #[must_use]
    pub fn load(&self, subsystem: &str, major: u32, minor: u32) -> Option<Arc<LegacyRegistration>> {
        match self.try_load(subsystem, major, minor) {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(
                    error_kind = "cannot_read_target_definition",
                    subsystem,
                    major,
                    minor,
                    error = %e,
                    "cannot read target definition"
                );
                None
            }
        }
    }

    /// Load a legacy definition, reporting failures
    ///
    /// # Errors
    /// - `CatalogError::Io` if the entry exists but cannot be read
    /// - `CatalogError::Malformed` if the entry is not a valid value stream
    /// - `CatalogError::Description` if the value is not a valid description
    pub fn try_load(
        &self,
        subsystem: &str,
        major: u32,
        minor: u32,
    ) -> Result<Option<Arc<LegacyRegistration>>, CatalogError> {
        let key = catalog_key(subsystem, major, minor);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(Some(cached));
        }

        let description = {
            let Some(reader) = self.catalog.open(&key)? else {
                tracing::debug!(%key, "no legacy definition in catalog");
                return Ok(None);
            };
            ModelValue::from_reader(reader).map_err(|e| CatalogError::from_value_error(&key, e))?
        };

        let registration = LegacyRegistration::from_description(subsystem, major, minor, description)
            .map_err(|e| CatalogError::description(&key, e))?;
        let registration = Arc::new(registration);

        tracing::debug!(%key, "loaded legacy definition");
        self.cache.insert(key, Arc::clone(&registration));
        Ok(Some(registration))
    }

    /// Drop every cached definition
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Number of cached definitions (approximate)
    #[inline]
    #[must_use]
    pub fn cached_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl fmt::Debug for LegacySchemaLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacySchemaLoader")
            .field("catalog", &self.catalog)
            .field("cached", &self.cache.entry_count())
            .finish()
    }
}
