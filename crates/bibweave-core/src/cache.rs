//! Response cache: one JSON file per (url, params) key, memory layer in front.
//!
//! No TTL and no eviction — re-runs of a crawl are expected to replay from
//! disk instead of re-fetching. Only successful GET payloads are stored;
//! 404s and retry exhaustion are never cached.

use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use rustc_hash::FxHashMap;
use serde_json::Value;

pub struct RequestCache {
    dir: PathBuf,
    memory: Mutex<FxHashMap<String, Value>>,
}

/// Stable cache key: blake3 over the URL and the query parameters sorted
/// by name, so parameter order at the call site does not split the cache.
pub fn cache_key(url: &str, params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();
    let mut hasher = blake3::Hasher::new();
    hasher.update(url.as_bytes());
    for (k, v) in sorted {
        hasher.update(b"\n");
        hasher.update(k.as_bytes());
        hasher.update(b"=");
        hasher.update(v.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

impl RequestCache {
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            memory: Mutex::new(FxHashMap::default()),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn get(&self, url: &str, params: &[(String, String)]) -> Option<Value> {
        let key = cache_key(url, params);
        if let Some(v) = self
            .memory
            .lock()
            .expect("cache lock poisoned")
            .get(&key)
            .cloned()
        {
            return Some(v);
        }
        let raw = std::fs::read_to_string(self.path_for(&key)).ok()?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(v) => {
                self.memory
                    .lock()
                    .expect("cache lock poisoned")
                    .insert(key, v.clone());
                Some(v)
            }
            Err(e) => {
                log::warn!("discarding corrupt cache entry {key}: {e}");
                None
            }
        }
    }

    pub fn put(&self, url: &str, params: &[(String, String)], value: &Value) {
        let key = cache_key(url, params);
        self.memory
            .lock()
            .expect("cache lock poisoned")
            .insert(key.clone(), value.clone());
        let path = self.path_for(&key);
        if let Err(e) = std::fs::write(&path, value.to_string()) {
            // A failed cache write costs a refetch later, nothing else.
            log::warn!("cannot write cache entry {}: {e}", path.display());
        }
    }
}
