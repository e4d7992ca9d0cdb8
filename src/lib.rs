//! Tree Cache - An in-process hierarchical cache
//!
//! Stores values under colon-delimited key paths such as `"user:1:name"`,
//! with per-entry or cache-wide TTL expiration and deletion of whole
//! sub-trees.

pub mod cache;
pub mod config;
pub mod error;

mod tasks;

pub use cache::{CacheStats, TreeCache};
pub use config::Config;
pub use error::{CacheError, Result};
