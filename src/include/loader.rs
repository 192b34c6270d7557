//! Content loaders for include resolution
//!
//! The parser never reads files itself; every source text comes through a
//! `Loader`. Provided implementations:
//! - `FsLoader`: reads from the filesystem, optionally under a root directory
//! - `MemoryLoader`: in-memory sources, keyed by normalized path
//! - `CachingLoader`: wraps another loader and shares loaded text across
//!   threads (DashMap)
//!
//! Closures `Fn(&Path) -> Result<String, LoadError>` are loaders too.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::trace;

use super::path::normalize;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("no such file")]
    NotFound { path: PathBuf },

    #[error("read failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{reason}")]
    Unavailable { path: PathBuf, reason: String },
}

impl LoadError {
    pub fn path(&self) -> &Path {
        match self {
            LoadError::NotFound { path }
            | LoadError::Io { path, .. }
            | LoadError::Unavailable { path, .. } => path,
        }
    }
}

/// Source of document text, addressed by normalized identity
pub trait Loader {
    fn load(&self, path: &Path) -> Result<String, LoadError>;
}

impl<F> Loader for F
where
    F: Fn(&Path) -> Result<String, LoadError>,
{
    fn load(&self, path: &Path) -> Result<String, LoadError> {
        self(path)
    }
}

/// Filesystem loader
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    root: Option<PathBuf>,
}

impl FsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative identities under `root` instead of the working directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn full_path(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl Loader for FsLoader {
    fn load(&self, path: &Path) -> Result<String, LoadError> {
        let full = self.full_path(path);
        trace!(path = %full.display(), "reading file");
        fs::read_to_string(&full).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound {
                path: path.to_path_buf(),
            },
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })
    }
}

/// In-memory loader
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    sources: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `insert`
    pub fn with_source(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.sources.insert(normalize(path.as_ref()), text.into());
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Loader for MemoryLoader {
    fn load(&self, path: &Path) -> Result<String, LoadError> {
        self.sources
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                path: path.to_path_buf(),
            })
    }
}

/// Loader that remembers successful loads of its inner loader
///
/// Safe to share between threads parsing unrelated workflows. Failures are
/// not cached, so a file that appears later is picked up.
pub struct CachingLoader<L> {
    inner: L,
    cache: DashMap<PathBuf, Arc<str>>,
}

impl<L: Loader> CachingLoader<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Number of cached sources
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

impl<L: Loader> Loader for CachingLoader<L> {
    fn load(&self, path: &Path) -> Result<String, LoadError> {
        let key = normalize(path);
        if let Some(cached) = self.cache.get(&key) {
            trace!(path = %key.display(), "cache hit");
            return Ok(cached.to_string());
        }

        let text = self.inner.load(&key)?;
        self.cache.insert(key, Arc::from(text.as_str()));
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_memory_loader_normalizes_keys() {
        let loader = MemoryLoader::new().with_source("./flows/../wf.yml", "id: w1\n");
        assert_eq!(loader.len(), 1);
        assert_eq!(loader.load(Path::new("wf.yml")).unwrap(), "id: w1\n");
        assert!(matches!(
            loader.load(Path::new("other.yml")),
            Err(LoadError::NotFound { .. })
        ));
    }

    #[test]
    fn test_closure_loader() {
        let loader = |path: &Path| -> Result<String, LoadError> {
            Err(LoadError::Unavailable {
                path: path.to_path_buf(),
                reason: "timed out".to_string(),
            })
        };
        let err = loader.load(Path::new("slow.yml")).unwrap_err();
        assert_eq!(err.to_string(), "timed out");
        assert_eq!(err.path(), Path::new("slow.yml"));
    }

    #[test]
    fn test_caching_loader_hits_inner_once() {
        let calls = AtomicUsize::new(0);
        let counting = |path: &Path| -> Result<String, LoadError> {
            calls.fetch_add(1, Ordering::SeqCst);
            if path == Path::new("g1.yml") {
                Ok("id: g1\n".to_string())
            } else {
                Err(LoadError::NotFound {
                    path: path.to_path_buf(),
                })
            }
        };
        let loader = CachingLoader::new(counting);

        assert_eq!(loader.load(Path::new("g1.yml")).unwrap(), "id: g1\n");
        assert_eq!(loader.load(Path::new("./g1.yml")).unwrap(), "id: g1\n");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(loader.cached_len(), 1);

        assert!(loader.load(Path::new("missing.yml")).is_err());
        assert!(loader.load(Path::new("missing.yml")).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(loader.cached_len(), 1);
    }

    #[test]
    fn test_fs_loader_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FsLoader::with_root(dir.path());
        assert!(matches!(
            loader.load(Path::new("nope.yml")),
            Err(LoadError::NotFound { .. })
        ));

        fs::write(dir.path().join("wf.yml"), "id: w1\n").unwrap();
        assert_eq!(loader.load(Path::new("wf.yml")).unwrap(), "id: w1\n");
    }
}
