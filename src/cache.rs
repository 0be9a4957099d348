//! Content-addressed artifact cache
//!
//! Expensive artifacts (filtrations, rank-function sets) are stored under a
//! [`CacheKey`] derived from everything that determines them: the artifact
//! kind, the input points, and the parameters. Two runs with identical
//! inputs hit the same entry no matter where they run from.
//!
//! Caches are plain values handed to the pipelines that use them; values go
//! through bincode on the way in and out.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::topology::FiltrationParams;
use crate::trajectory::Trajectory;

#[derive(Serialize)]
struct Fingerprint<'a, P> {
    kind: &'a str,
    crate_version: &'a str,
    payload: &'a P,
}

/// blake3 digest of a JSON fingerprint, hex encoded
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new<P: Serialize>(kind: &str, payload: &P) -> Result<Self> {
        let fp = Fingerprint {
            kind,
            crate_version: env!("CARGO_PKG_VERSION"),
            payload,
        };
        let bytes = serde_json::to_vec(&fp)?;
        Ok(Self(blake3::hash(&bytes).to_hex().to_string()))
    }

    /// Key of the filtration built from `trajectory` under `params`, with
    /// persistence from the reducer tagged `reducer`
    pub fn filtration(
        trajectory: &Trajectory,
        params: &FiltrationParams,
        reducer: &str,
    ) -> Result<Self> {
        Self::new("filtration", &(trajectory.points(), params, reducer))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Byte store addressed by [`CacheKey`]
pub trait ArtifactCache: Send + Sync {
    fn load(&self, key: &CacheKey) -> Result<Option<Vec<u8>>>;
    fn store(&self, key: &CacheKey, bytes: &[u8]) -> Result<()>;
}

/// One file per key under a root directory
#[derive(Debug, Clone)]
pub struct DirCache {
    root: PathBuf,
}

impl DirCache {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{}.bin", key))
    }
}

impl ArtifactCache for DirCache {
    fn load(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_of(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, key: &CacheKey, bytes: &[u8]) -> Result<()> {
        // entries appear atomically
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.persist(self.path_of(key)).map_err(|e| e.error)?;
        Ok(())
    }
}

/// In-process cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactCache for MemoryCache {
    fn load(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &CacheKey, bytes: &[u8]) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.clone(), bytes.to_vec());
        Ok(())
    }
}

/// Decode a cached value; unreadable entries count as misses
pub fn load_value<T: DeserializeOwned>(
    cache: &dyn ArtifactCache,
    key: &CacheKey,
) -> Result<Option<T>> {
    let Some(bytes) = cache.load(key)? else {
        debug!("cache miss {}", key);
        return Ok(None);
    };
    match bincode::deserialize(&bytes) {
        Ok(value) => {
            debug!("cache hit {}", key);
            Ok(Some(value))
        }
        Err(e) => {
            warn!("discarding unreadable cache entry {}: {}", key, e);
            Ok(None)
        }
    }
}

pub fn store_value<T: Serialize>(
    cache: &dyn ArtifactCache,
    key: &CacheKey,
    value: &T,
) -> Result<()> {
    let bytes = bincode::serialize(value)?;
    cache.store(key, &bytes)
}
