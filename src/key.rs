//! Logical cache key construction.
//!
//! Keys are opaque strings built from an entity tag and an identifier, joined
//! with `_`, optionally followed by a sub-filter: `group_1`, `schedule_42`,
//! `marks_42_2024-09`. A bare tag such as `all_documents` is also a valid key.
//! The store never checks for collisions; two operations that must not share
//! an entry must build different keys.

use std::fmt::Display;

/// Separator between key parts.
pub const KEY_SEPARATOR: char = '_';

/// Well-known entity tags.
pub mod tags {
    pub const GROUP: &str = "group";
    pub const SCHEDULE: &str = "schedule";
    pub const MARKS: &str = "marks";
    pub const DOCUMENT: &str = "document";
    pub const ALL_DOCUMENTS: &str = "all_documents";
    pub const PROFILE: &str = "profile";
    pub const ATTENDANCE: &str = "attendance";
}

/// Builder for logical cache keys.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Build a key from an entity tag and id.
    pub fn build(tag: &str, id: &dyn Display) -> String {
        format!("{}{}{}", tag, KEY_SEPARATOR, id)
    }

    /// Build a key narrowed by a sub-filter.
    pub fn build_with_filter(tag: &str, id: &dyn Display, filter: &dyn Display) -> String {
        format!("{}{}{}{}{}", tag, KEY_SEPARATOR, id, KEY_SEPARATOR, filter)
    }

    /// Build a composite key from arbitrary parts.
    pub fn build_composite(parts: &[&str]) -> String {
        parts.join(KEY_SEPARATOR.to_string().as_str())
    }

    /// Prefix matching every key of a tag, for invalidation cascades.
    pub fn tag_prefix(tag: &str) -> String {
        format!("{}{}", tag, KEY_SEPARATOR)
    }

    /// Storage key for a logical key under a namespace prefix.
    pub fn storage_key(prefix: &str, key: &str) -> String {
        format!("{}{}", prefix, key)
    }

    /// Logical key for a storage key, if it lives under `prefix`.
    pub fn logical_key<'a>(prefix: &str, storage_key: &'a str) -> Option<&'a str> {
        storage_key.strip_prefix(prefix)
    }
}
