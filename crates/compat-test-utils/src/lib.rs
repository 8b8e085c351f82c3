//! Testing utilities for the model compatibility workspace
//!
//! Shared schemas, sample trees, canned transformers, and log capture.

#![allow(missing_docs)]

use compat_model::{ModelValue, ModelVersion, Registration, Resource, ResourceSchema, SUBSYSTEM};
use compat_transform::{
    model_to_resource, ExtensionRegistry, MemoryCatalog, SubsystemTransformer, TransformError,
    TransformerRegistry,
};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

// ---------------------------------------------------------------------------
// Schemas and trees

pub fn web_schema() -> ResourceSchema {
    ResourceSchema::new()
        .description("The web subsystem")
        .attributes(["default-host", "native", "instance-id"])
        .wildcard_child("connector", ResourceSchema::new().attributes(["port", "secure", "scheme"]))
        .singleton_child(
            "configuration",
            "jsp",
            ResourceSchema::new().attributes(["development", "keep-generated"]),
        )
}

pub fn logging_schema() -> ResourceSchema {
    ResourceSchema::new()
        .attribute("add-logging-api-dependencies")
        .wildcard_child("logger", ResourceSchema::new().attribute("level"))
}

/// Host schema: a few attributes, two known subsystems, any other subsystem
/// as an empty leaf, and profiles nesting their own subsystems
pub fn host_schema() -> ResourceSchema {
    let subsystems = |schema: ResourceSchema| {
        schema
            .singleton_child(SUBSYSTEM, "web", web_schema())
            .singleton_child(SUBSYSTEM, "logging", logging_schema())
            .wildcard_child(SUBSYSTEM, ResourceSchema::new())
    };
    subsystems(ResourceSchema::new().attributes(["name", "release-version"]))
        .wildcard_child("profile", subsystems(ResourceSchema::new().attribute("name")))
}

pub fn host_model() -> ModelValue {
    ModelValue::from(json!({
        "name": "master",
        "release-version": "7.4.0",
        "subsystem": {
            "web": {
                "default-host": "default-host",
                "native": false,
                "instance-id": null,
                "connector": {
                    "http": {"port": 8080, "scheme": "http"},
                    "https": {"port": 8443, "secure": true, "scheme": "https"}
                },
                "configuration": {"jsp": {"development": false}}
            },
            "logging": {
                "add-logging-api-dependencies": true,
                "logger": {"org.example.server": {"level": "INFO"}}
            },
            "jmx": {}
        },
        "profile": {
            "full": {
                "name": "full",
                "subsystem": {"web": {"default-host": "full-host", "native": true}}
            }
        }
    }))
}

pub fn host_resource() -> Resource {
    model_to_resource(&host_schema(), &host_model())
}

pub fn registry() -> TransformerRegistry {
    TransformerRegistry::new(Arc::new(ExtensionRegistry::new()))
}

pub fn versions(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(name, version)| ((*name).to_string(), (*version).to_string()))
        .collect()
}

/// Catalog holding the 1.0 and 1.1 web snapshots
pub fn legacy_catalog() -> MemoryCatalog {
    MemoryCatalog::new()
        .with_entry(
            "web-1.0.dmr",
            json!({
                "description": "The web subsystem",
                "attributes": {"default-host": {"type": "STRING"}},
                "children": {
                    "connector": {"model-description": {"*": {"attributes": {"port": {}}}}}
                }
            })
            .to_string(),
        )
        .with_entry(
            "web-1.1.dmr",
            json!({
                "description": "The web subsystem",
                "attributes": {"default-host": {"type": "STRING"}, "native": {"type": "BOOLEAN"}},
                "children": {
                    "connector": {"model-description": {"*": {"attributes": {"port": {}, "secure": {}}}}}
                }
            })
            .to_string(),
        )
}

// ---------------------------------------------------------------------------
// Transformers

/// Returns its input unchanged and counts calls
#[derive(Debug, Default)]
pub struct CountingTransformer {
    version: ModelVersion,
    calls: AtomicUsize,
}

impl CountingTransformer {
    pub fn new(version: ModelVersion) -> Self {
        Self {
            version,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SubsystemTransformer for CountingTransformer {
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
        _registration: &dyn Registration,
        _target: &ModelVersion,
    ) -> Result<Resource, TransformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(resource.clone())
    }
}

/// Removes one attribute from the subsystem resource and every descendant
#[derive(Debug)]
pub struct AttributeDropper {
    version: ModelVersion,
    attribute: String,
}

impl AttributeDropper {
    pub fn new(version: ModelVersion, attribute: impl Into<String>) -> Self {
        Self {
            version,
            attribute: attribute.into(),
        }
    }

    fn strip(&self, resource: &Resource) -> Result<Resource, TransformError> {
        let mut model = resource.model().clone();
        model.remove(&self.attribute);
        let mut out = Resource::with_model(model);
        for (element, child) in resource.iter_children() {
            out.register_child(element.clone(), self.strip(child)?)?;
        }
        Ok(out)
    }
}

impl SubsystemTransformer for AttributeDropper {
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
        _registration: &dyn Registration,
        _target: &ModelVersion,
    ) -> Result<Resource, TransformError> {
        self.strip(resource)
    }
}

/// Always rejects its input
#[derive(Debug)]
pub struct FailingTransformer(pub ModelVersion);

impl SubsystemTransformer for FailingTransformer {
    fn major_version(&self) -> u32 {
        self.0.major()
    }

    fn minor_version(&self) -> u32 {
        self.0.minor()
    }

    fn micro_version(&self) -> u32 {
        self.0.micro()
    }

    fn transform(
        &self,
        _resource: &Resource,
        _registration: &dyn Registration,
        target: &ModelVersion,
    ) -> Result<Resource, TransformError> {
        Err(TransformError::rejected(format!("cannot express resource at {target}")))
    }
}

/// Panics on every call
#[derive(Debug)]
pub struct PanickingTransformer(pub ModelVersion);

impl SubsystemTransformer for PanickingTransformer {
    fn major_version(&self) -> u32 {
        self.0.major()
    }

    fn minor_version(&self) -> u32 {
        self.0.minor()
    }

    fn micro_version(&self) -> u32 {
        self.0.micro()
    }

    fn transform(
        &self,
        _resource: &Resource,
        _registration: &dyn Registration,
        _target: &ModelVersion,
    ) -> Result<Resource, TransformError> {
        panic!("transformer invariant violated")
    }
}

// ---------------------------------------------------------------------------
// Log capture

/// Shared buffer usable as a `tracing_subscriber` writer
#[derive(Debug, Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

pub struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter(Arc::clone(&self.0))
    }
}

/// Run `f` with a thread-local subscriber and return what it logged
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}

#[cfg(test)]
mod tests {
    use super::*;
    use compat_model::PathElement;

    #[test]
    fn host_resource_shape() {
        let host = host_resource();
        assert_eq!(host.children_names(SUBSYSTEM), vec!["web", "logging", "jmx"]);

        let web = host.child(&PathElement::new(SUBSYSTEM, "web")).unwrap();
        assert_eq!(web.children_names("connector"), vec!["http", "https"]);
        assert!(web.model().get("instance-id").is_none());
    }

    #[test]
    fn capture_collects_events() {
        let ((), logs) = capture_logs(|| tracing::warn!(error_kind = "sample", "something happened"));
        assert!(logs.contains("something happened"));
        assert!(logs.contains("error_kind=\"sample\""));
    }

    #[test]
    fn dropper_strips_descendants() {
        let web = host_resource()
            .child(&PathElement::new(SUBSYSTEM, "web"))
            .cloned()
            .unwrap();
        let out = AttributeDropper::new(ModelVersion::new(1, 1, 0), "port")
            .transform(&web, &web_schema(), &ModelVersion::new(1, 1, 0))
            .unwrap();
        let http = out.child(&PathElement::new("connector", "http")).unwrap();
        assert!(http.model().get("port").is_none());
        assert!(http.model().get("scheme").is_some());
    }
}
