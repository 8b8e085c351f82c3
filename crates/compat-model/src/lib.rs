//! Compat Model
//!
//! Data model shared by the model compatibility layer.
//!
//! # Core Concepts
//!
//! - [`ModelValue`]: Dynamically typed value tree with absent / undefined /
//!   defined members
//! - [`PathAddress`]: Hierarchical `(key, name)` addressing of resources
//! - [`Resource`]: Materialized tree node (payload + ordered children)
//! - [`Registration`]: Schema of one node (attributes + child patterns)
//! - [`ModelVersion`]: Exact-match `major.minor.micro` model generation
//!
//! # Example
//!
//! ```rust
//! use compat_model::{ModelValue, PathAddress, PathElement, Resource};
//!
//! let mut root = Resource::new();
//! let web = Resource::with_model(ModelValue::object([("default-host", "localhost".into())]));
//! root.register_child(PathElement::new("subsystem", "web"), web).unwrap();
//!
//! let address: PathAddress = "/subsystem=web".parse().unwrap();
//! assert!(root.navigate(&address).is_some());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod address;
mod registration;
mod resource;
mod value;
mod version;

// Re-exports
pub use address::{AddressError, ChildPattern, PathAddress, PathElement};
pub use registration::{DescriptionError, Registration, ResourceSchema};
pub use resource::{Resource, ResourceError};
pub use value::{ModelValue, ValueError, ValueState};
pub use version::{ModelVersion, ModelVersionKey, VersionError};

/// Name of the child key that marks a subsystem boundary
pub const SUBSYSTEM: &str = "subsystem";

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
