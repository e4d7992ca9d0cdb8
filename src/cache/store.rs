//! Cache Store Module
//!
//! Main cache engine combining the value tree, the key index and the TTL
//! expiry timers behind a single lock.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::cache::tree::{dismantle, Node, ValueTree};
use crate::cache::{key, CacheStats, KeyIndex, KEY_SEPARATOR};
use crate::config::{ttl_duration, Config};
use crate::error::{CacheError, Result};
use crate::tasks::{runtime_handle, ExpiryTimers};

// == Cache State ==
/// Everything guarded by the cache lock.
///
/// The value tree and the key index are only ever mutated together, so no
/// caller can observe them out of sync.
#[derive(Debug, Default)]
pub struct CacheState {
    /// Stored values, nested by key segment
    tree: ValueTree,
    /// Every present key path and its prefixes
    index: KeyIndex,
    /// Armed TTL timers by key
    timers: ExpiryTimers,
    /// Activity counters
    stats: CacheStats,
    /// TTL applied when `set` is called without one
    default_ttl: Option<Duration>,
    /// Trace every operation
    debug: bool,
}

impl CacheState {
    fn new(config: &Config) -> Self {
        Self {
            default_ttl: config.default_ttl_duration(),
            debug: config.debug,
            ..Self::default()
        }
    }

    // == Store ==
    /// Writes `value` at `key`, keeping index and timers in step with the tree.
    ///
    /// Any timer armed for `key` is cancelled, as are timers of keys that
    /// the write makes disappear.
    fn store(&mut self, key: &str, value: Value) {
        let segments = key::segments(key);
        let insertion = self.tree.insert(&segments, value);

        // Intermediate leaves became branches; their values are gone
        if !insertion.shadowed.is_empty() {
            let prefixes: Vec<&str> = key::prefixes(key).collect();
            for depth in insertion.shadowed {
                if let Some(prefix) = prefixes.get(depth) {
                    self.timers.cancel(prefix);
                }
            }
        }

        // A whole sub-tree was overwritten by a leaf
        if let Some(replaced) = insertion.replaced {
            if let Node::Branch(_) = replaced {
                for path in self.index.remove_descendants(key) {
                    self.timers.cancel(&path);
                }
            }
            dismantle(replaced);
        }

        self.index.insert_path(key);
        self.timers.cancel(key);
        self.stats.record_set();
    }

    // == Lookup ==
    /// Copies out the node at `key`.
    fn lookup(&mut self, key: &str) -> Option<Value> {
        if !self.index.contains(key) {
            self.stats.record_miss();
            return None;
        }

        let segments = key::segments(key);
        let node = self.tree.get(&segments);
        debug_assert!(node.is_some(), "indexed key {key:?} missing from value tree");

        match node {
            Some(node) => {
                let value = node.to_value();
                self.stats.record_hit();
                Some(value)
            }
            None => {
                error!("Key index and value tree disagree on key={}", key);
                self.stats.record_miss();
                None
            }
        }
    }

    // == Remove ==
    /// Removes `key` and all of its descendants from index, tree and timers.
    ///
    /// Returns true if anything was indexed under `key`.
    fn remove(&mut self, key: &str) -> bool {
        let removed = self.index.remove_subtree(key);
        for path in &removed {
            self.timers.cancel(path);
        }

        let segments = key::segments(key);
        if let Some(node) = self.tree.remove(&segments) {
            dismantle(node);
        }

        debug_assert!(
            self.is_consistent(),
            "key index and value tree diverged after removing {key:?}"
        );
        !removed.is_empty()
    }

    // == Expire ==
    /// Called by the timer armed for `key` once its deadline has passed.
    pub(crate) fn expire(&mut self, key: &str, id: u64) {
        if !self.timers.claim(key, id) {
            return;
        }

        if self.debug {
            debug!("Expiring key={} (TTL elapsed)", key);
        }
        self.stats.record_expiration();
        self.remove(key);
    }

    // == Clear ==
    fn clear(&mut self) {
        self.timers.clear();
        self.index.clear();
        self.tree.clear();
    }

    // == Consistency Check ==
    /// Checks that the index holds exactly the reachable tree paths and that
    /// every armed timer belongs to an indexed key.
    pub(crate) fn is_consistent(&self) -> bool {
        let paths = self.tree.paths(KEY_SEPARATOR);
        self.tree.is_empty() == self.index.is_empty()
            && paths.len() == self.index.len()
            && paths.iter().all(|path| self.index.contains(path))
            && self.timers.keys().all(|path| self.index.contains(path))
    }
}

// == Tree Cache ==
/// Hierarchical cache with colon-delimited keys and TTL expiration.
///
/// Cloning yields another handle to the same cache. Every operation takes
/// the internal lock once and runs to completion.
///
/// # Example
/// ```rust
/// use serde_json::json;
/// use tree_cache::{Config, TreeCache};
///
/// let cache = TreeCache::new(Config::default());
/// cache.set("user:1:name", "ada", None);
/// cache.set("user:1:age", 36, None);
///
/// assert_eq!(cache.get("user:1"), Some(json!({"name": "ada", "age": 36})));
///
/// cache.delete("user:1");
/// assert!(!cache.has("user:1:name"));
/// assert!(cache.has("user"));
/// ```
#[derive(Debug, Clone)]
pub struct TreeCache {
    state: Arc<Mutex<CacheState>>,
}

impl TreeCache {
    // == Constructor ==
    /// Creates a new cache from its configuration.
    pub fn new(config: Config) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::new(&config))),
        }
    }

    // == Set ==
    /// Stores a value at `key`, creating every intermediate branch.
    ///
    /// Any previous leaf or sub-tree at `key` is overwritten, and leaves
    /// along the path are turned into branches.
    ///
    /// # Arguments
    /// * `key` - Colon-delimited key path
    /// * `value` - The value to store
    /// * `ttl` - TTL in seconds; `None` uses the default TTL, `Some(0)` disables expiry.
    ///   TTLs above `MAX_TTL_SECONDS` are capped.
    ///
    /// # Panics
    /// Panics if a TTL applies and no Tokio runtime is available. The cache
    /// is left unchanged in that case.
    pub fn set(&self, key: &str, value: impl Into<Value>, ttl: Option<u64>) {
        let value = value.into();
        let mut state = self.state.lock();

        let effective_ttl = match ttl {
            Some(seconds) => ttl_duration(seconds),
            None => state.default_ttl,
        };
        // Resolved before any mutation so a missing runtime leaves no trace
        let runtime = effective_ttl.map(|_| runtime_handle());

        state.store(key, value);

        if state.debug {
            debug!("Set key={} ttl={:?}", key, effective_ttl);
        }

        if let (Some(runtime), Some(ttl)) = (runtime, effective_ttl) {
            state
                .timers
                .arm(&runtime, Arc::downgrade(&self.state), key, ttl);
        }
    }

    // == Set Serialized ==
    /// Serializes `value` and stores it at `key`.
    ///
    /// The serialized value is stored as a single leaf; its fields never
    /// become sub-keys.
    pub fn set_serialized<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<u64>,
    ) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|source| CacheError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.set(key, value, ttl);
        Ok(())
    }

    // == Get ==
    /// Retrieves a copy of the value at `key`.
    ///
    /// A key naming a branch returns an object holding its whole sub-tree.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut state = self.state.lock();
        let value = state.lookup(key);
        if state.debug {
            debug!("Get key={} found={}", key, value.is_some());
        }
        value
    }

    // == Get As ==
    /// Retrieves the value at `key` decoded as `T`.
    ///
    /// Returns `Ok(None)` when the key is absent and an error when the stored
    /// value does not fit `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get(key)
            .map(|value| {
                serde_json::from_value(value).map_err(|source| CacheError::Decode {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    // == Has ==
    /// Checks if `key` is present, either as a stored value or as a branch.
    pub fn has(&self, key: &str) -> bool {
        let state = self.state.lock();
        let present = state.index.contains(key);
        if state.debug {
            debug!("Has key={} present={}", key, present);
        }
        present
    }

    // == Delete ==
    /// Removes `key` and every key below it.
    ///
    /// Deleting an absent key does nothing.
    pub fn delete(&self, key: &str) {
        let mut state = self.state.lock();
        let removed = state.remove(key);
        if removed {
            state.stats.record_delete();
        }
        if state.debug {
            debug!("Delete key={} removed={}", key, removed);
        }
    }

    // == Clear ==
    /// Removes every key and cancels every pending expiration.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.clear();
        if state.debug {
            debug!("Cleared cache");
        }
    }

    // == TTL ==
    /// Returns the time left before `key` expires, if a TTL is armed for it.
    ///
    /// Timers run on the Tokio runtime that was current when the key was set;
    /// if that runtime shuts down first, the key stays pending and reports zero.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.state.lock().timers.remaining(key)
    }

    // == Keys ==
    /// Returns every present key path, prefixes included, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state.lock().index.iter().cloned().collect();
        keys.sort();
        keys
    }

    // == Length ==
    /// Returns the number of present key paths, prefixes included.
    pub fn len(&self) -> usize {
        self.state.lock().index.len()
    }

    // == Is Empty ==
    /// Returns true if no key is present.
    pub fn is_empty(&self) -> bool {
        self.state.lock().index.is_empty()
    }

    // == Pending Expirations ==
    /// Returns the number of armed TTL timers, including any whose runtime
    /// has shut down before they fired.
    pub fn pending_expirations(&self) -> usize {
        self.state.lock().timers.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let mut stats = state.stats.clone();
        stats.total_keys = state.index.len();
        stats.pending_expirations = state.timers.len();
        stats
    }

    /// Checks index, tree and timers against each other.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        self.state.lock().is_consistent()
    }
}

impl Default for TreeCache {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
