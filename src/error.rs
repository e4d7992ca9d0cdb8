//! Error types for the cache
//!
//! Provides unified error handling using thiserror. Cache operations
//! themselves never fail; only conversions between typed values and the
//! stored JSON representation can.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Value could not be converted into its stored representation
    #[error("Failed to encode value for key {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Stored value does not have the shape of the requested type
    #[error("Failed to decode value for key {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CacheError {
    /// Returns the key the failed conversion was made for.
    pub fn key(&self) -> &str {
        match self {
            CacheError::Encode { key, .. } | CacheError::Decode { key, .. } => key,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
