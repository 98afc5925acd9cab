//! Persistent get-or-compute cache for provider responses.
//!
//! Every provider call goes through [`CacheService::get_or_compute`]. The cache stores the
//! provider's verbatim response text, one JSON object file per provider category:
//!
//! ```json
//! {
//!   "10.1038/nature14539": "{\"status\":\"ok\",\"message\":{...}}",
//!   "5d41402abc4b2a76b9719d911017c592...": "{\"status\":\"ok\",\"message\":{\"items\":[...]}}"
//! }
//! ```
//!
//! Entries are never expired within or across runs; a stale answer is an accepted price for not
//! hammering rate-limited services. Failed computations are never stored, so a transient provider
//! failure is retried on the next call with the same key.

use std::future::Future;

use sha2::{Digest, Sha256};

use super::*;

/// Provider categories, each persisted to its own cache file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CacheCategory {
  /// DOI registry responses (JSON)
  Registry,
  /// Preprint repository responses (BibTeX)
  Preprint,
  /// Scholarly full-text search responses (JSON)
  Scholarly,
}

impl CacheCategory {
  /// File name of this category's cache inside the cache directory.
  pub fn file_name(&self) -> &'static str {
    match self {
      CacheCategory::Registry => "registry.json",
      CacheCategory::Preprint => "preprint.json",
      CacheCategory::Scholarly => "scholarly.json",
    }
  }
}

/// How an input becomes a cache key.
#[derive(Debug, Clone, Copy)]
pub enum CacheKey<'a> {
  /// Short, stable inputs such as identifiers are used as-is.
  Verbatim(&'a str),
  /// Long or irregular inputs such as free-text queries are hashed with SHA-256.
  Hashed(&'a str),
}

impl CacheKey<'_> {
  /// The string actually stored in the cache file.
  pub fn resolve(&self) -> String {
    match self {
      CacheKey::Verbatim(key) => key.to_string(),
      CacheKey::Hashed(input) => format!("{:x}", Sha256::digest(input.as_bytes())),
    }
  }
}

/// A single key → response store, optionally backed by a JSON file.
#[derive(Debug, Default)]
pub struct ResponseCache {
  /// Backing file; `None` keeps the store in memory only
  path:    Option<PathBuf>,
  /// Cached responses
  entries: BTreeMap<String, String>,
}

impl ResponseCache {
  /// Opens the store at `path`, loading existing entries.
  ///
  /// An unreadable or corrupted file is logged and replaced on the next write rather than
  /// failing the run.
  pub fn open(path: impl AsRef<Path>) -> Self {
    let path = path.as_ref().to_path_buf();
    let entries = match std::fs::read_to_string(&path) {
      Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!("Ignoring corrupted cache file {}: {e}", path.display());
        BTreeMap::new()
      }),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
      Err(e) => {
        warn!("Could not read cache file {}: {e}", path.display());
        BTreeMap::new()
      },
    };
    debug!("Opened cache {} with {} entries", path.display(), entries.len());
    Self { path: Some(path), entries }
  }

  /// Creates a store that is never persisted.
  pub fn in_memory() -> Self { Self::default() }

  /// Looks up a cached response.
  pub fn get(&self, key: &str) -> Option<&str> { self.entries.get(key).map(String::as_str) }

  /// Number of cached responses.
  pub fn len(&self) -> usize { self.entries.len() }

  /// Whether the store holds no responses.
  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Stores a response and persists the store.
  pub fn insert(&mut self, key: String, value: String) -> Result<()> {
    self.entries.insert(key, value);
    if let Some(path) = &self.path {
      if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
      }
      std::fs::write(path, serde_json::to_string_pretty(&self.entries)?)?;
    }
    Ok(())
  }
}

/// Get-or-compute wrapper shared by every provider call of a run.
#[derive(Debug)]
pub struct CacheService {
  /// Directory holding one file per [`CacheCategory`]; `None` keeps everything in memory
  directory: Option<PathBuf>,
  /// Stores opened so far
  stores:    BTreeMap<CacheCategory, ResponseCache>,
}

impl CacheService {
  /// Creates a cache service persisting to `directory`.
  pub fn open(directory: impl AsRef<Path>) -> Self {
    Self { directory: Some(directory.as_ref().to_path_buf()), stores: BTreeMap::new() }
  }

  /// Creates a cache service that forgets everything at the end of the run.
  pub fn in_memory() -> Self { Self { directory: None, stores: BTreeMap::new() } }

  /// Returns the store for `category`, opening it on first use.
  pub fn store(&mut self, category: CacheCategory) -> &mut ResponseCache {
    let directory = self.directory.as_deref();
    self.stores.entry(category).or_insert_with(|| match directory {
      Some(directory) => ResponseCache::open(directory.join(category.file_name())),
      None => ResponseCache::in_memory(),
    })
  }

  /// Returns the cached response for `key`, or computes, stores and returns it.
  ///
  /// `compute` is not invoked on a hit. When it fails, nothing is stored and the error is
  /// returned unchanged. A failure to persist a freshly computed value is only logged.
  pub async fn get_or_compute<F, Fut>(
    &mut self,
    category: CacheCategory,
    key: CacheKey<'_>,
    compute: F,
  ) -> Result<String>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String>>,
  {
    let key = key.resolve();
    if let Some(value) = self.store(category).get(&key) {
      debug!("Cache hit in {:?} for {key}", category);
      return Ok(value.to_string());
    }

    debug!("Cache miss in {:?} for {key}", category);
    let value = compute().await?;
    if let Err(e) = self.store(category).insert(key, value.clone()) {
      warn!("Could not persist {:?} cache: {e}", category);
    }
    Ok(value)
  }
}
