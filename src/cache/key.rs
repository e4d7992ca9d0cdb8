//! Key Path Module
//!
//! Helpers for splitting colon-delimited key paths into segments and prefixes.

use crate::cache::KEY_SEPARATOR;

// == Segments ==
/// Splits a key path into its segments.
///
/// Empty segments are kept verbatim, so `"a::b"` yields `["a", "", "b"]`
/// and `""` yields `[""]`. The result is never empty.
pub fn segments(key: &str) -> Vec<&str> {
    key.split(KEY_SEPARATOR).collect()
}

// == Prefixes ==
/// Yields every prefix of a key path, shortest first, ending with the key itself.
///
/// `"a:b:c"` yields `"a"`, `"a:b"`, `"a:b:c"`.
pub fn prefixes(key: &str) -> impl Iterator<Item = &str> {
    key.match_indices(KEY_SEPARATOR)
        .map(move |(idx, _)| &key[..idx])
        .chain(std::iter::once(key))
}

// == Descendant Check ==
/// Returns true if `candidate` lies strictly below `key` in the hierarchy.
pub fn is_descendant(candidate: &str, key: &str) -> bool {
    candidate.len() > key.len()
        && candidate.starts_with(key)
        && candidate[key.len()..].starts_with(KEY_SEPARATOR)
}
