//! Whole-tree transformation
//!
//! [`FullModelTransformer`] walks a resource tree depth-first, parent to
//! child, and hands every requested subsystem subtree to the transformer
//! registered for the exact target version.

use crate::error::TransformError;
use crate::transformer::TransformerLookup;
use compat_model::{ModelVersion, PathAddress, Registration, Resource, ResourceSchema, SUBSYSTEM};
use std::collections::HashMap;

/// Dispatches subsystem subtrees to their transformers
///
/// # Semantics
/// - A subsystem boundary is a child under the subsystem key, named by the
///   subsystem. A boundary the parent registration does not describe is
///   still dispatched, with an empty schema as its registration.
/// - Requested subsystem with a matching transformer: subtree replaced by
///   the transformer output.
/// - Requested subsystem without one: subtree passes through.
/// - Subsystems not requested, and everything outside a boundary, pass
///   through; the walk still descends into non-subsystem children.
/// - The first error aborts the whole run. The input is never modified.
#[derive(Debug, Clone)]
pub struct FullModelTransformer {
    subsystem_key: String,
}

impl FullModelTransformer {
    /// Create transformer using the standard subsystem key
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_subsystem_key(SUBSYSTEM)
    }

    /// Create transformer with a custom subsystem key
    #[inline]
    #[must_use]
    pub fn with_subsystem_key(key: impl Into<String>) -> Self {
        Self {
            subsystem_key: key.into(),
        }
    }

    /// Subsystem boundary key
    #[inline]
    #[must_use]
    pub fn subsystem_key(&self) -> &str {
        &self.subsystem_key
    }

    /// Transform a whole resource tree
    ///
    /// # Arguments
    /// * `lookup` - Source of subsystem transformers
    /// * `resource` - Tree to transform (read-only)
    /// * `registration` - Registration of the tree root
    /// * `subsystem_versions` - Subsystem name to `major.minor.micro`
    ///
    /// # Errors
    /// - `TransformError::InvalidVersion` for an unparsable requested version
    ///   of a subsystem present in the tree
    /// - `TransformError::Subsystem` wrapping any transformer failure
    pub fn transform_resource(
        &self,
        lookup: &dyn TransformerLookup,
        resource: &Resource,
        registration: &dyn Registration,
        subsystem_versions: &HashMap<String, String>,
    ) -> Result<Resource, TransformError> {
        let walk = Walk {
            subsystem_key: &self.subsystem_key,
            lookup,
            versions: subsystem_versions,
        };
        walk.node(resource, registration, &PathAddress::root())
    }
}

impl Default for FullModelTransformer {
    fn default() -> Self {
        Self::new()
    }
}

struct Walk<'a> {
    subsystem_key: &'a str,
    lookup: &'a dyn TransformerLookup,
    versions: &'a HashMap<String, String>,
}

impl Walk<'_> {
    fn node(
        &self,
        resource: &Resource,
        registration: &dyn Registration,
        address: &PathAddress,
    ) -> Result<Resource, TransformError> {
        let mut out = Resource::with_model(resource.model().clone());

        for (element, child) in resource.iter_children() {
            let child_address = address.append(element.clone());
            let transformed = if element.key() == self.subsystem_key {
                // a boundary without a registration still reaches its transformer
                let undescribed = ResourceSchema::new();
                let child_registration: &dyn Registration =
                    registration.child_registration(element).unwrap_or(&undescribed);
                self.subsystem(element.value(), child, child_registration, &child_address)?
            } else if let Some(child_registration) = registration.child_registration(element) {
                self.node(child, child_registration, &child_address)?
            } else {
                tracing::debug!(address = %child_address, "no registration for child, copying unchanged");
                child.clone()
            };
            out.register_child(element.clone(), transformed)?;
        }

        Ok(out)
    }

    fn subsystem(
        &self,
        name: &str,
        resource: &Resource,
        registration: &dyn Registration,
        address: &PathAddress,
    ) -> Result<Resource, TransformError> {
        let Some(requested) = self.versions.get(name) else {
            return Ok(resource.clone());
        };

        let version: ModelVersion = requested
            .parse()
            .map_err(|source| TransformError::invalid_version(name, requested.as_str(), source))?;

        match self.lookup.find_transformer(name, &version) {
            Some(transformer) => {
                tracing::debug!(subsystem = name, %version, %address, "transforming subsystem");
                transformer
                    .transform(resource, registration, &version)
                    .map_err(|e| TransformError::subsystem(name, version, e))
            }
            None => {
                tracing::debug!(
                    subsystem = name,
                    %version,
                    "no transformer registered for version, passing through"
                );
                Ok(resource.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformer::{FnTransformer, SubsystemTransformer};
    use compat_model::{ModelValue, PathElement};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    /// Lookup over a fixed list, for exercising the walk in isolation
    #[derive(Default)]
    struct ListLookup(Vec<(String, Arc<dyn SubsystemTransformer>)>);

    impl TransformerLookup for ListLookup {
        fn find_transformer(
            &self,
            subsystem: &str,
            version: &ModelVersion,
        ) -> Option<Arc<dyn SubsystemTransformer>> {
            self.0
                .iter()
                .find(|(name, t)| name == subsystem && t.model_version() == *version)
                .map(|(_, t)| Arc::clone(t))
        }
    }

    fn schema() -> ResourceSchema {
        let web = ResourceSchema::new()
            .attributes(["default-host", "native"])
            .wildcard_child("connector", ResourceSchema::new().attribute("port"));
        ResourceSchema::new()
            .attribute("name")
            .wildcard_child(SUBSYSTEM, ResourceSchema::new())
            .singleton_child(SUBSYSTEM, "web", web.clone())
            .wildcard_child("profile", ResourceSchema::new().singleton_child(SUBSYSTEM, "web", web))
    }

    fn tree() -> Resource {
        let mut web = Resource::with_model(ModelValue::object([
            ("default-host", ModelValue::from("localhost")),
            ("native", ModelValue::from(true)),
        ]));
        web.register_child(
            PathElement::new("connector", "http"),
            Resource::with_model(ModelValue::object([("port", ModelValue::from(8080))])),
        )
        .unwrap();

        let mut profile = Resource::new();
        profile
            .register_child(PathElement::new(SUBSYSTEM, "web"), web.clone())
            .unwrap();

        let mut root = Resource::with_model(ModelValue::object([("name", ModelValue::from("dc"))]));
        root.register_child(PathElement::new(SUBSYSTEM, "web"), web)
            .unwrap();
        root.register_child(PathElement::new(SUBSYSTEM, "ejb"), Resource::with_model(ModelValue::empty_object()))
            .unwrap();
        root.register_child(PathElement::new("profile", "default"), profile)
            .unwrap();
        root
    }

    fn drop_native() -> Arc<dyn SubsystemTransformer> {
        Arc::new(FnTransformer::new(ModelVersion::new(1, 1, 0), |resource, _, _| {
            let mut out = resource.clone();
            out.model_mut().remove("native");
            Ok(out)
        }))
    }

    fn versions(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn empty_version_map_is_identity() {
        let lookup = ListLookup(vec![("web".into(), drop_native())]);
        let out = FullModelTransformer::new()
            .transform_resource(&lookup, &tree(), &schema(), &HashMap::new())
            .unwrap();
        assert_eq!(out, tree());
    }

    #[test]
    fn matching_transformer_rewrites_every_boundary() {
        let lookup = ListLookup(vec![("web".into(), drop_native())]);
        let out = FullModelTransformer::new()
            .transform_resource(&lookup, &tree(), &schema(), &versions(&[("web", "1.1.0")]))
            .unwrap();

        let direct = out.navigate(&"/subsystem=web".parse().unwrap()).unwrap();
        assert_eq!(direct.model().get("native"), None);

        let nested = out
            .navigate(&"/profile=default/subsystem=web".parse().unwrap())
            .unwrap();
        assert_eq!(nested.model().get("native"), None);

        // untouched parts survive
        assert_eq!(out.model(), tree().model());
        assert_eq!(
            out.navigate(&"/subsystem=ejb".parse().unwrap()),
            tree().navigate(&"/subsystem=ejb".parse().unwrap())
        );
    }

    #[test]
    fn version_mismatch_passes_through() {
        let lookup = ListLookup(vec![("web".into(), drop_native())]);
        let out = FullModelTransformer::new()
            .transform_resource(&lookup, &tree(), &schema(), &versions(&[("web", "1.1.1")]))
            .unwrap();
        assert_eq!(out, tree());
    }

    #[test]
    fn invalid_version_aborts() {
        let lookup = ListLookup::default();
        let result = FullModelTransformer::new().transform_resource(
            &lookup,
            &tree(),
            &schema(),
            &versions(&[("web", "one.two")]),
        );
        assert!(matches!(result, Err(TransformError::InvalidVersion { .. })));
    }

    #[test]
    fn invalid_version_for_absent_subsystem_is_ignored() {
        let lookup = ListLookup::default();
        let out = FullModelTransformer::new()
            .transform_resource(&lookup, &tree(), &schema(), &versions(&[("jca", "garbage")]))
            .unwrap();
        assert_eq!(out, tree());
    }

    #[test]
    fn transformer_error_is_wrapped() {
        let failing: Arc<dyn SubsystemTransformer> =
            Arc::new(FnTransformer::new(ModelVersion::new(1, 1, 0), |_, _, _| {
                Err(TransformError::rejected("cannot express connector"))
            }));
        let lookup = ListLookup(vec![("web".into(), failing)]);
        let result = FullModelTransformer::new().transform_resource(
            &lookup,
            &tree(),
            &schema(),
            &versions(&[("web", "1.1")]),
        );
        assert!(matches!(
            result,
            Err(TransformError::Subsystem { ref subsystem, .. }) if subsystem == "web"
        ));
    }

    #[test]
    fn transformer_receives_subsystem_registration() {
        let checking: Arc<dyn SubsystemTransformer> =
            Arc::new(FnTransformer::new(ModelVersion::new(1, 1, 0), |resource, registration, _| {
                if registration.attribute_names().contains(&"native".to_string()) {
                    Ok(resource.clone())
                } else {
                    Err(TransformError::rejected("wrong registration"))
                }
            }));
        let lookup = ListLookup(vec![("web".into(), checking)]);
        let result = FullModelTransformer::new().transform_resource(
            &lookup,
            &tree(),
            &schema(),
            &versions(&[("web", "1.1.0")]),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn custom_subsystem_key() {
        let transformer = FullModelTransformer::with_subsystem_key("module");
        assert_eq!(transformer.subsystem_key(), "module");

        let lookup = ListLookup(vec![("web".into(), drop_native())]);
        // "subsystem" children are ordinary nodes under this key
        let out = transformer
            .transform_resource(&lookup, &tree(), &schema(), &versions(&[("web", "1.1.0")]))
            .unwrap();
        assert_eq!(out, tree());
    }

    #[test]
    fn unregistered_child_is_copied() {
        let mut root = tree();
        root.register_child(
            PathElement::new("interface", "public"),
            Resource::with_model(ModelValue::object([("inet-address", ModelValue::from("0.0.0.0"))])),
        )
        .unwrap();

        let lookup = ListLookup::default();
        let out = FullModelTransformer::new()
            .transform_resource(&lookup, &root, &schema(), &HashMap::new())
            .unwrap();
        assert_eq!(out, root);
    }

    #[test]
    fn undescribed_subsystem_still_reaches_transformer() {
        let lookup = ListLookup(vec![("web".into(), drop_native())]);
        let out = FullModelTransformer::new()
            .transform_resource(&lookup, &tree(), &ResourceSchema::new(), &versions(&[("web", "1.1.0")]))
            .unwrap();

        let web = out.navigate(&"/subsystem=web".parse().unwrap()).unwrap();
        assert_eq!(web.model().get("native"), None);
        assert_eq!(web.model().get("default-host"), Some(&ModelValue::from("localhost")));

        // the profile is not described either, so nothing below it is visited
        let nested = out
            .navigate(&"/profile=default/subsystem=web".parse().unwrap())
            .unwrap();
        assert_eq!(nested.model().get("native"), Some(&ModelValue::from(true)));
    }

    #[test]
    fn undescribed_subsystem_gets_empty_registration() {
        let checking: Arc<dyn SubsystemTransformer> =
            Arc::new(FnTransformer::new(ModelVersion::new(2, 0, 0), |resource, registration, _| {
                if registration.attribute_names().is_empty() {
                    Ok(Resource::with_model(ModelValue::object([("seen", ModelValue::from(true))])))
                } else {
                    Ok(resource.clone())
                }
            }));
        let lookup = ListLookup(vec![("jca".into(), checking)]);
        let mut root = tree();
        root.register_child(PathElement::new(SUBSYSTEM, "jca"), Resource::with_model(ModelValue::empty_object()))
            .unwrap();

        let out = FullModelTransformer::new()
            .transform_resource(&lookup, &root, &ResourceSchema::new(), &versions(&[("jca", "2.0.0")]))
            .unwrap();
        let jca = out.navigate(&"/subsystem=jca".parse().unwrap()).unwrap();
        assert_eq!(jca.model().get("seen"), Some(&ModelValue::from(true)));
    }
}
