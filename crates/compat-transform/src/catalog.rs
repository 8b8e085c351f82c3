//! Legacy schema catalogs
//!
//! A [`Catalog`] is a read-only store of byte streams keyed by name. The
//! transformation layer keeps one entry per `(subsystem, major, minor)`
//! snapshot of an older subsystem's resource description.
//!
//! Absence is normal: not every subsystem ships legacy snapshots, so
//! [`Catalog::open`] returns `Ok(None)` for a missing key and reserves
//! errors for entries that exist but cannot be read.

use crate::error::CatalogError;
use dashmap::DashMap;
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufReader, Cursor, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Read-only keyed store of legacy schema snapshots
pub trait Catalog: Send + Sync + Debug {
    /// Open the entry stored under `key`
    ///
    /// # Returns
    /// `Ok(None)` if no such entry exists
    ///
    /// # Errors
    /// - `CatalogError::InvalidKey` if the key cannot name an entry
    /// - `CatalogError::Io` if the entry exists but cannot be opened
    fn open(&self, key: &str) -> Result<Option<Box<dyn Read + '_>>, CatalogError>;

    /// Check whether an entry exists
    ///
    /// # Errors
    /// Same as [`Catalog::open`]
    fn contains(&self, key: &str) -> Result<bool, CatalogError> {
        Ok(self.open(key)?.is_some())
    }
}

/// Catalog backed by one file per entry in a directory
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    root: PathBuf,
}

impl DirectoryCatalog {
    /// Create catalog over directory
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory backing this catalog
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, CatalogError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.contains("..") {
            return Err(CatalogError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

impl Catalog for DirectoryCatalog {
    fn open(&self, key: &str) -> Result<Option<Box<dyn Read + '_>>, CatalogError> {
        let path = self.entry_path(key)?;
        match File::open(&path) {
            Ok(file) => Ok(Some(Box::new(BufReader::new(file)))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CatalogError::io_error(key, e)),
        }
    }
}

/// In-memory catalog
///
/// # Example
/// ```rust
/// use compat_transform::{Catalog, MemoryCatalog};
///
/// let catalog = MemoryCatalog::new().with_entry("web-1.1.dmr", br#"{"attributes": {}}"#.to_vec());
/// assert!(catalog.contains("web-1.1.dmr").unwrap());
/// assert!(!catalog.contains("web-1.0.dmr").unwrap());
/// ```
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    entries: DashMap<String, Arc<[u8]>>,
}

impl MemoryCatalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create catalog from `(key, bytes)` pairs
    pub fn from_entries<I, K, B>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, B)>,
        K: Into<String>,
        B: Into<Vec<u8>>,
    {
        let catalog = Self::new();
        for (key, bytes) in entries {
            catalog.insert(key, bytes);
        }
        catalog
    }

    /// With entry
    #[must_use]
    pub fn with_entry(self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(key, bytes);
        self
    }

    /// Store an entry, replacing any previous bytes
    pub fn insert(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(key.into(), Arc::from(bytes.into()));
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Catalog for MemoryCatalog {
    fn open(&self, key: &str) -> Result<Option<Box<dyn Read + '_>>, CatalogError> {
        // Clone the Arc so no map guard outlives this call
        let bytes = self.entries.get(key).map(|entry| Arc::clone(entry.value()));
        Ok(bytes.map(|b| Box::new(Cursor::new(b)) as Box<dyn Read + '_>))
    }
}

/// Catalog without entries
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyCatalog;

impl Catalog for EmptyCatalog {
    fn open(&self, _key: &str) -> Result<Option<Box<dyn Read + '_>>, CatalogError> {
        Ok(None)
    }
}
