//! Concurrency-safe name → value registry.
//!
//! Backs the `Segments` template namespace. Producers insert values as they
//! complete while any number of renders read from it.
//!
//! # Sharding
//!
//! Entries live in a [`DashMap`] split into a fixed number of shards, each
//! behind its own lock. Operations on names that land on different shards
//! never contend. A `set` that has returned is visible to every later `get`,
//! `contains`, or `must_get`.
//!
//! # Example
//!
//! ```
//! use segtext::registry::Registry;
//!
//! let segments: Registry<String> = Registry::new();
//! segments.set("Git", "main".to_string());
//!
//! assert!(segments.contains("Git"));
//! assert_eq!(segments.get("Git"), Some("main".to_string()));
//! assert!(segments.must_get("Path").is_err());
//! ```


use dashmap::DashMap;
use thiserror::Error;

/// Number of shards in a registry.
const SHARD_COUNT: usize = 16;

/// Error returned by [`Registry::must_get`] for a name that was never set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("segment not found: {name}")]
pub struct SegmentNotFound {
    /// The name that was looked up.
    pub name: String,
}

/// A sharded concurrent map keyed by name.
pub struct Registry<V> {
    entries: DashMap<String, V>,
}

impl<V: Clone> Registry<V> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_shard_amount(SHARD_COUNT),
        }
    }

    /// Insert or overwrite the value stored under `name`.
    pub fn set(&self, name: impl Into<String>, value: V) {
        self.entries.insert(name.into(), value);
    }

    /// Get a clone of the value stored under `name`.
    pub fn get(&self, name: &str) -> Option<V> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    /// Check whether `name` has been set.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Get the value stored under `name`, failing immediately if absent.
    pub fn must_get(&self, name: &str) -> Result<V, SegmentNotFound> {
        self.get(name).ok_or_else(|| SegmentNotFound {
            name: name.to_string(),
        })
    }

    /// Number of entries across all shards.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All names currently set, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }
}

impl<V: Clone> Default for Registry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> std::fmt::Debug for Registry<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.names())
            .finish()
    }
}
