//! Transformer registry
//!
//! [`TransformerRegistry`] is the entry point of the transformation layer.
//! Subsystems register their transformers once at startup; request handlers
//! then ask for a resource tree in the shape a given client expects.
//!
//! Registration is append-only and safe from any thread. Lookups return
//! shared handles and never hold a lock across a transformation.

use crate::catalog::{Catalog, DirectoryCatalog, EmptyCatalog};
use crate::config::TransformerConfig;
use crate::domain::DomainModelTransformers;
use crate::error::{CompatResult, TransformError};
use crate::extension::ExtensionRegistry;
use crate::full_model::FullModelTransformer;
use crate::legacy::{LegacyRegistration, LegacySchemaLoader};
use crate::transformer::{SubsystemTransformer, TransformerLookup};
use compat_model::{ModelVersion, Registration, Resource};
use dashmap::DashMap;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Registry of subsystem transformers
///
/// # Example
/// ```rust
/// use compat_model::{ModelValue, ModelVersion, PathElement, Resource, ResourceSchema, SUBSYSTEM};
/// use compat_transform::{ExtensionRegistry, FnTransformer, TransformerRegistry};
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// let registry = TransformerRegistry::new(Arc::new(ExtensionRegistry::new()));
/// registry.register_subsystem_transformer(
///     "web",
///     Arc::new(FnTransformer::new(ModelVersion::new(1, 1, 0), |resource, _, _| {
///         let mut out = resource.clone();
///         out.model_mut().remove("native");
///         Ok(out)
///     })),
/// );
///
/// let schema = ResourceSchema::new()
///     .wildcard_child(SUBSYSTEM, ResourceSchema::new().attributes(["default-host", "native"]));
/// let mut root = Resource::new();
/// root.register_child(
///     PathElement::new(SUBSYSTEM, "web"),
///     Resource::with_model(ModelValue::object([("native", ModelValue::from(true))])),
/// ).unwrap();
///
/// let versions = HashMap::from([("web".to_string(), "1.1.0".to_string())]);
/// let legacy = registry.get_transformed_resource(&root, &schema, &versions);
/// let web = legacy.child(&PathElement::new(SUBSYSTEM, "web")).unwrap();
/// assert!(web.model().get("native").is_none());
/// ```
#[derive(Debug)]
pub struct TransformerRegistry {
    transformers: DashMap<String, Vec<Arc<dyn SubsystemTransformer>>>,
    full_model: FullModelTransformer,
    extension_registry: Arc<ExtensionRegistry>,
    domain_transformers: DomainModelTransformers,
    legacy: LegacySchemaLoader,
    config: TransformerConfig,
}

impl TransformerRegistry {
    /// Create registry with default configuration
    #[must_use]
    pub fn new(extension_registry: Arc<ExtensionRegistry>) -> Self {
        Self::assemble(extension_registry, TransformerConfig::default(), Arc::new(EmptyCatalog))
    }

    /// Create registry with configuration
    ///
    /// Legacy definitions are read from `config.catalog_dir` when set.
    ///
    /// # Errors
    /// `CompatError::Config` if `config` does not validate
    pub fn with_config(
        extension_registry: Arc<ExtensionRegistry>,
        config: TransformerConfig,
    ) -> CompatResult<Self> {
        let catalog: Arc<dyn Catalog> = match &config.catalog_dir {
            Some(dir) => Arc::new(DirectoryCatalog::new(dir)),
            None => Arc::new(EmptyCatalog),
        };
        Self::with_catalog(extension_registry, config, catalog)
    }

    /// Create registry reading legacy definitions from `catalog`
    ///
    /// # Errors
    /// `CompatError::Config` if `config` does not validate
    pub fn with_catalog(
        extension_registry: Arc<ExtensionRegistry>,
        config: TransformerConfig,
        catalog: Arc<dyn Catalog>,
    ) -> CompatResult<Self> {
        config.validate()?;
        Ok(Self::assemble(extension_registry, config, catalog))
    }

    fn assemble(
        extension_registry: Arc<ExtensionRegistry>,
        config: TransformerConfig,
        catalog: Arc<dyn Catalog>,
    ) -> Self {
        Self {
            transformers: DashMap::new(),
            full_model: FullModelTransformer::with_subsystem_key(config.subsystem_key.as_str()),
            extension_registry,
            domain_transformers: DomainModelTransformers::new(),
            legacy: LegacySchemaLoader::with_capacity(catalog, config.legacy_cache_capacity),
            config,
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    /// Register a transformer for a subsystem
    ///
    /// Registrations are kept in order and never deduplicated; when two
    /// transformers claim the same version, the first one wins lookups.
    pub fn register_subsystem_transformer(
        &self,
        subsystem: impl Into<String>,
        transformer: Arc<dyn SubsystemTransformer>,
    ) {
        let subsystem = subsystem.into();
        let version = transformer.model_version();

        let mut entry = self.transformers.entry(subsystem).or_default();
        if entry.iter().any(|t| t.model_version() == version) {
            tracing::debug!(subsystem = %entry.key(), %version, "version already registered, earlier transformer takes precedence");
        }
        entry.push(transformer);
        tracing::debug!(subsystem = %entry.key(), %version, "registered subsystem transformer");
    }

    /// Get the transformer registered for an exact version
    #[must_use]
    pub fn get_subsystem_transformer(
        &self,
        subsystem: &str,
        major: u32,
        minor: u32,
        micro: u32,
    ) -> Option<Arc<dyn SubsystemTransformer>> {
        let version = ModelVersion::new(major, minor, micro);
        let entry = self.transformers.get(subsystem)?;
        let found = entry
            .iter()
            .find(|t| t.model_version() == version)
            .map(Arc::clone);
        found
    }

    /// Transform a resource tree for the given subsystem versions
    ///
    /// Never fails: if the transformation errors or panics, the failure is
    /// logged and an unchanged copy of `resource` is returned.
    #[must_use]
    pub fn get_transformed_resource(
        &self,
        resource: &Resource,
        registration: &dyn Registration,
        subsystem_versions: &HashMap<String, String>,
    ) -> Resource {
        let outcome = if self.config.isolate_panics {
            panic::catch_unwind(AssertUnwindSafe(|| {
                self.try_transform_resource(resource, registration, subsystem_versions)
            }))
            .unwrap_or_else(|payload| Err(TransformError::Panicked(panic_message(payload.as_ref()))))
        } else {
            self.try_transform_resource(resource, registration, subsystem_versions)
        };

        match outcome {
            Ok(transformed) => transformed,
            Err(e) => {
                tracing::error!(
                    error_kind = "cannot_transform",
                    error = %e,
                    "cannot transform resource, returning it unchanged"
                );
                resource.clone()
            }
        }
    }

    /// Transform a resource tree, reporting failures
    ///
    /// # Errors
    /// - `TransformError::InvalidVersion` for an unparsable requested version
    /// - `TransformError::Subsystem` if a subsystem transformer fails
    pub fn try_transform_resource(
        &self,
        resource: &Resource,
        registration: &dyn Registration,
        subsystem_versions: &HashMap<String, String>,
    ) -> Result<Resource, TransformError> {
        self.full_model
            .transform_resource(self, resource, registration, subsystem_versions)
    }

    /// Transform a resource tree for a single subsystem version
    #[must_use]
    pub fn get_transformed_subsystem_resource(
        &self,
        resource: &Resource,
        registration: &dyn Registration,
        subsystem: &str,
        major: u32,
        minor: u32,
        micro: u32,
    ) -> Resource {
        let version = ModelVersion::new(major, minor, micro);
        let versions = HashMap::from([(subsystem.to_string(), version.to_string())]);
        self.get_transformed_resource(resource, registration, &versions)
    }

    /// Load the legacy definition of a subsystem
    #[must_use]
    pub fn load_subsystem_definition(
        &self,
        subsystem: &str,
        major: u32,
        minor: u32,
    ) -> Option<Arc<LegacyRegistration>> {
        self.legacy.load(subsystem, major, minor)
    }

    /// Extension registry handed over at construction
    #[inline]
    #[must_use]
    pub fn extension_registry(&self) -> &Arc<ExtensionRegistry> {
        &self.extension_registry
    }

    /// Domain-level transformers
    #[inline]
    #[must_use]
    pub fn domain_transformers(&self) -> &DomainModelTransformers {
        &self.domain_transformers
    }

    /// Legacy definition loader
    #[inline]
    #[must_use]
    pub fn legacy_loader(&self) -> &LegacySchemaLoader {
        &self.legacy
    }

    /// Transformers registered for a subsystem, in registration order
    #[must_use]
    pub fn transformers_for(&self, subsystem: &str) -> Vec<Arc<dyn SubsystemTransformer>> {
        self.transformers
            .get(subsystem)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Subsystems with at least one transformer, sorted
    #[must_use]
    pub fn subsystem_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.transformers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Versions registered for a subsystem, in registration order
    #[must_use]
    pub fn registered_versions(&self, subsystem: &str) -> Vec<ModelVersion> {
        self.transformers
            .get(subsystem)
            .map(|entry| entry.iter().map(|t| t.model_version()).collect())
            .unwrap_or_default()
    }
}

impl TransformerLookup for TransformerRegistry {
    fn find_transformer(
        &self,
        subsystem: &str,
        version: &ModelVersion,
    ) -> Option<Arc<dyn SubsystemTransformer>> {
        self.get_subsystem_transformer(subsystem, version.major(), version.minor(), version.micro())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
