//! Transformation layer configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a [`TransformerRegistry`](crate::TransformerRegistry)
///
/// # Example
/// ```rust
/// use compat_transform::TransformerConfig;
///
/// let config = TransformerConfig::from_toml_str(r#"
///     legacy-cache-capacity = 64
///     catalog-dir = "/opt/server/legacy-schemas"
/// "#).unwrap();
///
/// assert_eq!(config.legacy_cache_capacity, 64);
/// assert_eq!(config.subsystem_key, "subsystem");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct TransformerConfig {
    /// Child key that marks a subsystem boundary
    pub subsystem_key: String,
    /// Maximum number of parsed legacy definitions kept in memory
    pub legacy_cache_capacity: u64,
    /// Contain panics raised by transformers like ordinary failures
    pub isolate_panics: bool,
    /// Directory holding legacy schema snapshots, if any
    pub catalog_dir: Option<PathBuf>,
}

impl TransformerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML
    ///
    /// # Errors
    /// - `ConfigError::Parse` if the text is not valid TOML for this type
    /// - `ConfigError::Invalid` if a value is out of range
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subsystem_key.is_empty() || self.subsystem_key.contains(['=', '/']) {
            return Err(ConfigError::Invalid {
                field: "subsystem-key",
                reason: format!("'{}' is not a valid address key", self.subsystem_key),
            });
        }
        Ok(())
    }

    /// With subsystem boundary key
    #[inline]
    #[must_use]
    pub fn with_subsystem_key(mut self, key: impl Into<String>) -> Self {
        self.subsystem_key = key.into();
        self
    }

    /// With legacy definition cache capacity
    #[inline]
    #[must_use]
    pub fn with_legacy_cache_capacity(mut self, capacity: u64) -> Self {
        self.legacy_cache_capacity = capacity;
        self
    }

    /// With panic isolation on or off
    #[inline]
    #[must_use]
    pub fn with_isolate_panics(mut self, isolate: bool) -> Self {
        self.isolate_panics = isolate;
        self
    }

    /// With legacy snapshot directory
    #[inline]
    #[must_use]
    pub fn with_catalog_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.catalog_dir = Some(dir.into());
        self
    }
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            subsystem_key: compat_model::SUBSYSTEM.to_string(),
            legacy_cache_capacity: 256,
            isolate_panics: true,
            catalog_dir: None,
        }
    }
}
