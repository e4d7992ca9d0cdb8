//! Cache Module
//!
//! Provides the hierarchical cache: a value tree addressed by colon-delimited
//! key paths, an index of every present path, and TTL expiration.

pub mod key;

mod index;
mod stats;
mod store;
mod tree;


// Re-export public types
pub use stats::CacheStats;
pub use store::TreeCache;

pub(crate) use index::KeyIndex;
pub(crate) use store::CacheState;

// == Public Constants ==
/// Separator between the segments of a key path
pub const KEY_SEPARATOR: char = ':';

/// Longest TTL honoured, in seconds (~100 years); longer TTLs are capped
pub const MAX_TTL_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;
