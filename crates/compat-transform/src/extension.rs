//! Extension registry
//!
//! Records which extension module owns each subsystem and the model version
//! the subsystem currently runs at. The transformation layer never reads
//! it; the registry only hands it to collaborators.

use compat_model::ModelVersion;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Subsystem as recorded by its extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsystemInfo {
    /// Owning extension module
    pub extension: String,
    /// Current model version
    pub version: ModelVersion,
}

/// Registry of subsystems contributed by extensions
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    subsystems: RwLock<BTreeMap<String, SubsystemInfo>>,
}

impl ExtensionRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a subsystem and its current version
    ///
    /// # Returns
    /// The previous record, if the subsystem was already known
    pub fn record_subsystem(
        &self,
        extension: impl Into<String>,
        subsystem: impl Into<String>,
        version: ModelVersion,
    ) -> Option<SubsystemInfo> {
        let info = SubsystemInfo {
            extension: extension.into(),
            version,
        };
        let subsystem = subsystem.into();
        tracing::debug!(%subsystem, extension = %info.extension, %version, "recording subsystem");

        let mut subsystems = self.subsystems.write();
        if let Some(existing) = subsystems.get(&subsystem) {
            if existing.extension != info.extension {
                tracing::warn!(%subsystem, old = %existing.extension, new = %info.extension, "subsystem moved to another extension");
            }
        }
        subsystems.insert(subsystem, info)
    }

    /// Current version of a subsystem
    #[must_use]
    pub fn subsystem_version(&self, subsystem: &str) -> Option<ModelVersion> {
        self.subsystems.read().get(subsystem).map(|info| info.version)
    }

    /// Full record of a subsystem
    #[must_use]
    pub fn subsystem_info(&self, subsystem: &str) -> Option<SubsystemInfo> {
        self.subsystems.read().get(subsystem).cloned()
    }

    /// Subsystems owned by an extension, sorted by name
    #[must_use]
    pub fn subsystems_of(&self, extension: &str) -> Vec<String> {
        self.subsystems
            .read()
            .iter()
            .filter(|(_, info)| info.extension == extension)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// All recorded subsystems, sorted by name
    #[must_use]
    pub fn subsystem_names(&self) -> Vec<String> {
        self.subsystems.read().keys().cloned().collect()
    }
}
