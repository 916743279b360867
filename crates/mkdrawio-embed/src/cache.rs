//! Parsed diagram cache.
//!
//! A documentation site usually references the same diagram file from several
//! pages. [`DiagramCache`] reads and parses each file once per build and hands
//! out shared, read-only documents afterwards.
//!
//! Entries hold the *unextracted* document keyed by resolved path. Sheet
//! selection runs per reference on top of the cached document, so two pages
//! asking for different sheets of one file each get their own sheet.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::document::DiagramDocument;
use crate::error::EmbedError;

/// Source of diagram file contents.
///
/// [`FsDiagramSource`] reads from disk; tests substitute in-memory sources.
pub trait DiagramSource: Send + Sync {
    /// Read the diagram file at `path` as UTF-8 text.
    fn read(&self, path: &Path) -> io::Result<String>;
}

/// Reads diagram files from the filesystem.
#[derive(Debug, Default)]
pub struct FsDiagramSource;

impl DiagramSource for FsDiagramSource {
    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Build-scoped cache of parsed diagram files.
///
/// Safe to share between threads rendering pages in parallel. When two
/// threads miss on the same path at once, both parse and the first insert
/// wins. Failed loads are not cached. There is no eviction or invalidation:
/// file contents are assumed stable for the lifetime of the cache.
pub struct DiagramCache {
    source: Box<dyn DiagramSource>,
    entries: RwLock<HashMap<PathBuf, Arc<DiagramDocument>>>,
}

impl DiagramCache {
    /// Create an empty cache reading from the filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::with_source(FsDiagramSource)
    }

    /// Create an empty cache reading through `source`.
    #[must_use]
    pub fn with_source(source: impl DiagramSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the parsed document for `path`, loading it on first access.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::Read`] if the file cannot be read and
    /// [`EmbedError::Parse`] if it is not well-formed XML.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<DiagramDocument>, EmbedError> {
        if let Some(document) = self.entries.read().unwrap().get(path) {
            tracing::debug!(path = %path.display(), "diagram cache hit");
            return Ok(Arc::clone(document));
        }

        tracing::debug!(path = %path.display(), "diagram cache miss");
        let content = self.source.read(path).map_err(|source| EmbedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let document = DiagramDocument::parse(&content).map_err(|source| EmbedError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut entries = self.entries.write().unwrap();
        let entry = entries
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(document));
        Ok(Arc::clone(entry))
    }

    /// Number of cached documents.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Whether nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DiagramCache {
    fn default() -> Self {
        Self::new()
    }
}
