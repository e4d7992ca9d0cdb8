//! Key Index Module
//!
//! Tracks every key path present in the cache, including all prefixes of
//! each path that was set.

use std::collections::HashSet;

use crate::cache::key;

// == Key Index ==
/// Set of every present key path.
///
/// Setting `"a:b:c"` indexes `"a"`, `"a:b"` and `"a:b:c"`, so existence
/// checks never need to walk the value tree.
#[derive(Debug, Default)]
pub struct KeyIndex {
    /// Indexed key paths
    paths: HashSet<String>,
}

impl KeyIndex {
    // == Constructor ==
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self {
            paths: HashSet::new(),
        }
    }

    // == Insert ==
    /// Indexes `key` and every one of its prefixes.
    ///
    /// Already indexed prefixes are left untouched.
    pub fn insert_path(&mut self, key: &str) {
        for prefix in key::prefixes(key) {
            if !self.paths.contains(prefix) {
                self.paths.insert(prefix.to_string());
            }
        }
    }

    // == Contains ==
    /// Checks if a key path is indexed.
    pub fn contains(&self, key: &str) -> bool {
        self.paths.contains(key)
    }

    // == Remove Subtree ==
    /// Removes `key` and all of its descendants.
    ///
    /// Returns the removed paths.
    pub fn remove_subtree(&mut self, key: &str) -> Vec<String> {
        let mut removed = self.remove_descendants(key);
        if let Some(path) = self.paths.take(key) {
            removed.push(path);
        }
        removed
    }

    // == Remove Descendants ==
    /// Removes every path strictly below `key`, keeping `key` itself.
    ///
    /// Returns the removed paths.
    pub fn remove_descendants(&mut self, key: &str) -> Vec<String> {
        let removed: Vec<String> = self
            .paths
            .iter()
            .filter(|path| key::is_descendant(path, key))
            .cloned()
            .collect();

        for path in &removed {
            self.paths.remove(path);
        }
        removed
    }

    // == Clear ==
    /// Removes every indexed path.
    pub fn clear(&mut self) {
        self.paths.clear();
    }

    // == Length ==
    /// Returns the number of indexed paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    // == Is Empty ==
    /// Returns true if no path is indexed.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    // == Iter ==
    /// Iterates over indexed paths in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.paths.iter()
    }
}
