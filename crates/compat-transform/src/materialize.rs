//! Resource materialization
//!
//! Turns a flat value tree into a [`Resource`] tree, guided by a
//! [`Registration`]. Only the declared schema is visited, and undefined
//! branches of the source are never descended into.

use compat_model::{ChildPattern, ModelValue, PathElement, Registration, Resource, ResourceError};
use indexmap::IndexMap;

/// Materialize a resource tree, copying only defined attributes
#[inline]
#[must_use]
pub fn model_to_resource(registration: &dyn Registration, model: &ModelValue) -> Resource {
    materialize(registration, model, false)
}

/// Materialize a resource tree from a value tree
///
/// # Algorithm
/// 1. Each declared attribute is copied into the payload. With
///    `include_undefined` every declared attribute is copied (an absent one
///    as undefined); otherwise only defined values are copied.
/// 2. A leaf (no child patterns) whose source is defined but yields no
///    attributes gets a defined empty payload, so its existence stays
///    observable.
/// 3. Child patterns are visited in declaration order. A wildcard
///    `(key, *)` yields one child per defined member of `model[key]`, in
///    source order. A singleton `(key, value)` yields one child if
///    `model[key][value]` is defined; singletons are always materialized
///    with `include_undefined` off.
///
/// Missing data is never an error. A declared pattern without a
/// sub-registration is logged and skipped.
#[must_use]
pub fn materialize(
    registration: &dyn Registration,
    model: &ModelValue,
    include_undefined: bool,
) -> Resource {
    let patterns = registration.child_patterns();

    let mut payload: IndexMap<String, ModelValue> = IndexMap::new();
    for name in registration.attribute_names() {
        match model.get(&name) {
            Some(value) if include_undefined || value.is_defined() => {
                payload.insert(name, value.clone());
            }
            None if include_undefined => {
                payload.insert(name, ModelValue::Undefined);
            }
            _ => {}
        }
    }

    let payload = if !payload.is_empty() {
        ModelValue::Object(payload)
    } else if model.is_defined() && patterns.is_empty() {
        ModelValue::empty_object()
    } else {
        ModelValue::Undefined
    };
    let mut resource = Resource::with_model(payload);

    for pattern in &patterns {
        let Some(sub) = registration.sub_registration(pattern) else {
            tracing::warn!(%pattern, "no registration for declared child pattern, skipping");
            continue;
        };

        match pattern {
            ChildPattern::Wildcard { key } => {
                let Some(instances) = model.get(key).filter(|v| v.is_defined()) else {
                    continue;
                };
                for (name, value) in instances.properties() {
                    if value.is_defined() {
                        let child = materialize(sub, value, include_undefined);
                        attach(&mut resource, PathElement::new(key.as_str(), name), child);
                    }
                }
            }
            ChildPattern::Singleton(element) => {
                let source = model
                    .get_path(&[element.key(), element.value()])
                    .filter(|v| v.is_defined());
                if let Some(value) = source {
                    attach(&mut resource, element.clone(), materialize(sub, value, false));
                }
            }
        }
    }

    resource
}

fn attach(resource: &mut Resource, element: PathElement, child: Resource) {
    match resource.register_child(element, child) {
        Ok(()) => {}
        Err(ResourceError::DuplicateChild(element)) => {
            tracing::warn!(%element, "child declared by more than one pattern, keeping the first");
        }
        Err(ResourceError::WildcardChild(element)) => {
            tracing::warn!(%element, "source instance named '*' cannot be a child, skipping");
        }
    }
}
