//! Management model versions
//!
//! A [`ModelVersion`] identifies one generation of a subsystem's management
//! model. Versions are compared for exact equality only; no compatibility
//! ranges are evaluated anywhere in this workspace.

use std::fmt::{self, Display, Formatter};
use std::num::ParseIntError;
use std::str::FromStr;

/// `major.minor.micro` version triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ModelVersion {
    major: u32,
    minor: u32,
    micro: u32,
}

impl ModelVersion {
    /// Create version triple
    #[inline]
    #[must_use]
    pub const fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
        }
    }

    /// Major component
    #[inline]
    #[must_use]
    pub const fn major(&self) -> u32 {
        self.major
    }

    /// Minor component
    #[inline]
    #[must_use]
    pub const fn minor(&self) -> u32 {
        self.minor
    }

    /// Micro component
    #[inline]
    #[must_use]
    pub const fn micro(&self) -> u32 {
        self.micro
    }
}

impl Display for ModelVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
    }
}

impl FromStr for ModelVersion {
    type Err = VersionError;

    /// Parse `major.minor.micro`, or `major.minor` with micro 0
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let parts: Vec<&str> = trimmed.split('.').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(VersionError::InvalidFormat(s.to_string()));
        }

        let component = |index: usize| -> Result<u32, VersionError> {
            parts.get(index).map_or(Ok(0), |part| {
                part.parse().map_err(|source| VersionError::InvalidComponent {
                    version: s.to_string(),
                    source,
                })
            })
        };

        Ok(Self::new(component(0)?, component(1)?, component(2)?))
    }
}

impl From<(u32, u32, u32)> for ModelVersion {
    fn from((major, minor, micro): (u32, u32, u32)) -> Self {
        Self::new(major, minor, micro)
    }
}

/// Registry identity of a subsystem model generation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelVersionKey {
    subsystem: String,
    version: ModelVersion,
}

impl ModelVersionKey {
    /// Create key
    #[inline]
    #[must_use]
    pub fn new(subsystem: impl Into<String>, version: ModelVersion) -> Self {
        Self {
            subsystem: subsystem.into(),
            version,
        }
    }

    /// Subsystem name
    #[inline]
    #[must_use]
    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    /// Model version
    #[inline]
    #[must_use]
    pub fn version(&self) -> ModelVersion {
        self.version
    }
}

impl Display for ModelVersionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.subsystem, self.version)
    }
}

/// Errors parsing model versions
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    /// Empty version string
    #[error("empty model version")]
    Empty,

    /// Wrong number of components
    #[error("invalid model version '{0}' (expected major.minor[.micro])")]
    InvalidFormat(String),

    /// Component is not an unsigned integer
    #[error("invalid model version '{version}': {source}")]
    InvalidComponent {
        version: String,
        #[source]
        source: ParseIntError,
    },
}
