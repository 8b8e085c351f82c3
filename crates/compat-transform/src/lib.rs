//! Compat Transform
//!
//! Serves a management model to clients pinned to older model versions.
//! Subsystems register one transformer per legacy version they still
//! support; the registry walks a resource tree and lets each requested
//! subsystem rewrite its own subtree.
//!
//! # Core Operations
//!
//! - **Materialize**: Build a [`Resource`](compat_model::Resource) tree from a
//!   flat value tree, guided by a registration
//! - **Register**: Record a [`SubsystemTransformer`] for an exact version
//! - **Transform**: Rewrite a tree for a map of subsystem versions, falling
//!   back to an unchanged copy on failure
//! - **Load**: Read the legacy schema of a subsystem from a [`Catalog`]
//!
//! # Architecture
//!
//! ```text
//! ModelValue ─ materialize ─→ Resource ─→ TransformerRegistry ─→ Resource'
//!                                              │
//!                                FullModelTransformer (walk)
//!                                              │
//!                              SubsystemTransformer (per subsystem)
//! ```
//!
//! # Example
//!
//! ```rust
//! use compat_model::{ModelValue, ResourceSchema, SUBSYSTEM};
//! use compat_transform::{model_to_resource, ExtensionRegistry, TransformerRegistry};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! let schema = ResourceSchema::new().wildcard_child(
//!     SUBSYSTEM,
//!     ResourceSchema::new().attribute("default-host"),
//! );
//! let model = ModelValue::from(serde_json::json!({
//!     "subsystem": {"web": {"default-host": "localhost"}}
//! }));
//! let resource = model_to_resource(&schema, &model);
//!
//! let registry = TransformerRegistry::new(Arc::new(ExtensionRegistry::new()));
//! let versions = HashMap::from([("web".to_string(), "1.1.0".to_string())]);
//!
//! // nothing registered for web 1.1.0, so the tree passes through
//! assert_eq!(registry.get_transformed_resource(&resource, &schema, &versions), resource);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod extension;
pub mod full_model;
pub mod legacy;
pub mod materialize;
pub mod registry;
pub mod transformer;

// Re-exports for convenience
pub use catalog::{Catalog, DirectoryCatalog, EmptyCatalog, MemoryCatalog};
pub use config::TransformerConfig;
pub use domain::DomainModelTransformers;
pub use error::{CatalogError, CompatError, CompatResult, ConfigError, TransformError};
pub use extension::{ExtensionRegistry, SubsystemInfo};
pub use full_model::FullModelTransformer;
pub use legacy::{catalog_key, LegacyRegistration, LegacySchemaLoader};
pub use materialize::{materialize, model_to_resource};
pub use registry::TransformerRegistry;
pub use transformer::{FnTransformer, SubsystemTransformer, TransformerLookup};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the transformation layer
    pub use crate::catalog::{Catalog, MemoryCatalog};
    pub use crate::error::{CompatError, CompatResult, TransformError};
    pub use crate::materialize::{materialize, model_to_resource};
    pub use crate::registry::TransformerRegistry;
    pub use crate::transformer::{FnTransformer, SubsystemTransformer};
    pub use compat_model::{ModelValue, ModelVersion, PathAddress, PathElement, Registration, Resource, ResourceSchema};
}
