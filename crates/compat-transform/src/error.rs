//! Error types for the transformation layer
//!
//! Provides error handling for:
//! - Transform operations (whole-tree and per-subsystem rewrites)
//! - Catalog operations (legacy schema snapshots)
//! - Configuration loading
//!
//! "Not found" outcomes (no transformer, no catalog entry) are `Option`s
//! and never appear here.

use compat_model::{DescriptionError, ModelVersion, ResourceError, ValueError, VersionError};

/// Errors during resource transformation
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Requested target version could not be parsed
    #[error("invalid version '{version}' requested for subsystem '{subsystem}': {source}")]
    InvalidVersion {
        subsystem: String,
        version: String,
        #[source]
        source: VersionError,
    },

    /// A subsystem transformer failed
    #[error("transformer for subsystem '{subsystem}' at {version} failed: {source}")]
    Subsystem {
        subsystem: String,
        version: ModelVersion,
        #[source]
        source: Box<TransformError>,
    },

    /// Transformer refused the input
    #[error("transformation rejected: {0}")]
    Rejected(String),

    /// Transformation panicked
    #[error("transformation panicked: {0}")]
    Panicked(String),

    /// Resource tree could not be assembled
    #[error("resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Payload could not be rewritten
    #[error("value error: {0}")]
    Value(#[from] ValueError),
}

impl TransformError {
    /// Create rejection error
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    /// Wrap an error raised by a subsystem transformer
    pub fn subsystem(subsystem: impl Into<String>, version: ModelVersion, source: Self) -> Self {
        Self::Subsystem {
            subsystem: subsystem.into(),
            version,
            source: Box::new(source),
        }
    }

    /// Create invalid version error
    pub fn invalid_version(
        subsystem: impl Into<String>,
        version: impl Into<String>,
        source: VersionError,
    ) -> Self {
        Self::InvalidVersion {
            subsystem: subsystem.into(),
            version: version.into(),
            source,
        }
    }
}

/// Errors reading legacy schema snapshots
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Key cannot name a catalog entry
    #[error("invalid catalog key: '{0}'")]
    InvalidKey(String),

    /// IO error reading an entry
    #[error("io error reading catalog entry '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Entry is not a valid value stream
    #[error("malformed catalog entry '{key}': {source}")]
    Malformed {
        key: String,
        #[source]
        source: ValueError,
    },

    /// Entry is not a valid resource description
    #[error("invalid description in catalog entry '{key}': {source}")]
    Description {
        key: String,
        #[source]
        source: DescriptionError,
    },
}

impl CatalogError {
    /// Create IO error for key
    pub fn io_error(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            key: key.into(),
            source,
        }
    }

    /// Classify a stream decoding error for key
    pub fn from_value_error(key: impl Into<String>, source: ValueError) -> Self {
        match source {
            ValueError::Io(source) => Self::io_error(key, source),
            source => Self::Malformed {
                key: key.into(),
                source,
            },
        }
    }

    /// Create description error for key
    pub fn description(key: impl Into<String>, source: DescriptionError) -> Self {
        Self::Description {
            key: key.into(),
            source,
        }
    }
}

/// Errors loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration text could not be parsed
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration value out of range
    #[error("invalid configuration value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Combined transformation layer error
///
/// Returned by the configured registry constructors; the narrower errors
/// convert into it with `?`.
#[derive(Debug, thiserror::Error)]
pub enum CompatError {
    /// Transformation failed
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    /// Legacy snapshot could not be read
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Configuration rejected
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for transformation layer operations
pub type CompatResult<T> = Result<T, CompatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_display() {
        let err = TransformError::rejected("attribute 'native' unknown to 1.1");
        assert_eq!(
            err.to_string(),
            "transformation rejected: attribute 'native' unknown to 1.1"
        );
    }

    #[test]
    fn subsystem_wraps_source() {
        let err = TransformError::subsystem(
            "web",
            ModelVersion::new(1, 1, 0),
            TransformError::rejected("boom"),
        );
        assert!(err.to_string().contains("subsystem 'web' at 1.1.0"));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "transformation rejected: boom");
    }

    #[test]
    fn value_error_classification() {
        let io = ValueError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(matches!(
            CatalogError::from_value_error("web-1.1.dmr", io),
            CatalogError::Io { .. }
        ));

        let malformed = compat_model::ModelValue::from_slice(b"{").unwrap_err();
        assert!(matches!(
            CatalogError::from_value_error("web-1.1.dmr", malformed),
            CatalogError::Malformed { .. }
        ));
    }

    #[test]
    fn error_conversions() {
        let err: CompatError = CatalogError::InvalidKey("../x".to_string()).into();
        assert!(matches!(err, CompatError::Catalog(_)));
        assert!(err.to_string().contains("invalid catalog key"));
    }

    #[test]
    fn config_error_converts() {
        fn check(key: &str) -> CompatResult<()> {
            crate::config::TransformerConfig::new().with_subsystem_key(key).validate()?;
            Ok(())
        }

        assert!(check("subsystem").is_ok());
        let err = check("").unwrap_err();
        assert!(matches!(err, CompatError::Config(ConfigError::Invalid { .. })));
        assert!(err.to_string().starts_with("config error: "));
    }
}
