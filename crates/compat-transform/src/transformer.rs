//! Subsystem transformer capability
//!
//! A [`SubsystemTransformer`] rewrites one subsystem's resource subtree into
//! the shape a client pinned to an older model version expects. This crate
//! never decides what the rewrite does; it only registers, finds and
//! dispatches transformers.

use crate::error::TransformError;
use compat_model::{ModelVersion, Registration, Resource};
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Rewrites a subsystem subtree for one target model version
///
/// Implementations must be pure, bounded-time tree rewrites: the input is
/// shared read-only and the output must be a fresh tree.
pub trait SubsystemTransformer: Send + Sync + Debug {
    /// Major version this transformer produces
    fn major_version(&self) -> u32;

    /// Minor version this transformer produces
    fn minor_version(&self) -> u32;

    /// Micro version this transformer produces
    fn micro_version(&self) -> u32;

    /// Version triple used as registry identity
    fn model_version(&self) -> ModelVersion {
        ModelVersion::new(
            self.major_version(),
            self.minor_version(),
            self.micro_version(),
        )
    }

    /// Transform a subsystem subtree
    ///
    /// # Arguments
    /// * `resource` - Subsystem subtree rooted at the subsystem resource
    /// * `registration` - Current registration of that subtree
    /// * `target` - Version the client expects
    ///
    /// # Errors
    /// Any error aborts the whole transformation it is part of
    fn transform(
        &self,
        resource: &Resource,
        registration: &dyn Registration,
        target: &ModelVersion,
    ) -> Result<Resource, TransformError>;
}

/// Source of transformers by exact `(subsystem, version)`
pub trait TransformerLookup: Send + Sync {
    /// Find the transformer registered for exactly this version
    fn find_transformer(
        &self,
        subsystem: &str,
        version: &ModelVersion,
    ) -> Option<Arc<dyn SubsystemTransformer>>;
}

/// Transformer backed by a closure
///
/// # Example
/// ```rust
/// use compat_model::ModelVersion;
/// use compat_transform::{FnTransformer, SubsystemTransformer};
///
/// let drop_native = FnTransformer::new(ModelVersion::new(1, 1, 0), |resource, _reg, _target| {
///     let mut out = resource.clone();
///     out.model_mut().remove("native");
///     Ok(out)
/// });
/// assert_eq!(drop_native.minor_version(), 1);
/// ```
pub struct FnTransformer<F> {
    version: ModelVersion,
    f: F,
}

impl<F> FnTransformer<F>
where
    F: Fn(&Resource, &dyn Registration, &ModelVersion) -> Result<Resource, TransformError>
        + Send
        + Sync,
{
    /// Create transformer for version
    #[inline]
    #[must_use]
    pub fn new(version: ModelVersion, f: F) -> Self {
        Self { version, f }
    }
}

impl<F> Debug for FnTransformer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransformer")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl<F> SubsystemTransformer for FnTransformer<F>
where
    F: Fn(&Resource, &dyn Registration, &ModelVersion) -> Result<Resource, TransformError>
        + Send
        + Sync,
{
    fn major_version(&self) -> u32 {
        self.version.major()
    }

    fn minor_version(&self) -> u32 {
        self.version.minor()
    }

    fn micro_version(&self) -> u32 {
        self.version.micro()
    }

    fn transform(
        &self,
        resource: &Resource,
        registration: &dyn Registration,
        target: &ModelVersion,
    ) -> Result<Resource, TransformError> {
        (self.f)(resource, registration, target)
    }
}
