//! Domain-level transformers
//!
//! Keyed by exact `(subsystem, version)`. Kept separate from the
//! registry's per-subsystem lists so host-wide transformations can be
//! resolved through the same [`TransformerLookup`] seam.

use crate::transformer::{SubsystemTransformer, TransformerLookup};
use compat_model::{ModelVersion, ModelVersionKey};
use dashmap::DashMap;
use std::sync::Arc;

/// Registry of domain-model transformers
#[derive(Debug, Default)]
pub struct DomainModelTransformers {
    transformers: DashMap<ModelVersionKey, Arc<dyn SubsystemTransformer>>,
}

impl DomainModelTransformers {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register transformer for a subsystem version
    ///
    /// # Returns
    /// The transformer previously registered under the same key, if any
    pub fn register_subsystem_transformers(
        &self,
        subsystem: impl Into<String>,
        version: ModelVersion,
        transformer: Arc<dyn SubsystemTransformer>,
    ) -> Option<Arc<dyn SubsystemTransformer>> {
        let key = ModelVersionKey::new(subsystem, version);
        tracing::debug!(%key, "registering domain transformer");
        self.transformers.insert(key, transformer)
    }

    /// Get transformer for exact key
    #[must_use]
    pub fn get(&self, key: &ModelVersionKey) -> Option<Arc<dyn SubsystemTransformer>> {
        self.transformers
            .get(key)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Number of registered transformers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }
}

impl TransformerLookup for DomainModelTransformers {
    fn find_transformer(
        &self,
        subsystem: &str,
        version: &ModelVersion,
    ) -> Option<Arc<dyn SubsystemTransformer>> {
        self.get(&ModelVersionKey::new(subsystem, *version))
    }
}
