//! Content fingerprints for change detection.
//!
//! The hash folds the JSON text of a value into a 32-bit signed accumulator
//! (`h = h * 31 + unit`, wrapping), over UTF-16 code units, and renders the
//! absolute value in base 36. It is a cheap equality oracle for payloads that
//! went through the same serialization path, nothing more: key order matters
//! and collisions are possible.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Base-36 fingerprint of a value's JSON text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint any serializable value.
///
/// # Example
///
/// ```
/// use portal_cache::hash::content_hash;
/// use serde_json::json;
///
/// let a = content_hash(&json!({"numberGroup": 2991})).unwrap();
/// let b = content_hash(&json!({"numberGroup": 2991})).unwrap();
/// assert_eq!(a, b);
/// ```
///
/// # Errors
///
/// Returns `Error::SerializationError` if the value cannot be rendered as JSON.
pub fn content_hash<T: Serialize + ?Sized>(value: &T) -> Result<ContentHash> {
    let text =
        serde_json::to_string(value).map_err(|e| Error::SerializationError(e.to_string()))?;
    Ok(hash_str(&text))
}

/// Fingerprint an already-built JSON value. Never fails.
pub fn hash_json(value: &serde_json::Value) -> ContentHash {
    hash_str(&value.to_string())
}

/// Fingerprint raw text.
pub fn hash_str(text: &str) -> ContentHash {
    let folded = text
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
    ContentHash(to_base36(i64::from(folded).unsigned_abs()))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_hash_empty_string() {
        assert_eq!(hash_str("").as_str(), "0");
    }

    #[test]
    fn test_hash_known_values() {
        // "a" = 97 = 2p in base 36
        assert_eq!(hash_str("a").as_str(), "2p");
        // "ab" = 97 * 31 + 98 = 3105
        assert_eq!(hash_str("ab").as_str(), "2e9");
    }

    #[test]
    fn test_hash_wraps_to_32_bits() {
        let long = "z".repeat(1_000);
        let hash = hash_str(&long);
        let value = u64::from_str_radix(hash.as_str(), 36).expect("valid base36");
        assert!(value <= 2_147_483_648);
    }

    #[test]
    fn test_hash_uses_utf16_units() {
        // U+1F600 is a surrogate pair: two units, not one char
        let a = hash_str("😀");
        let expected = (0xD83Di32).wrapping_mul(31).wrapping_add(0xDE00);
        assert_eq!(a.as_str(), to_base36(i64::from(expected).unsigned_abs()));
    }

    #[test]
    fn test_content_hash_is_stable() {
        let payload = json!([{"subject": "Math", "value": 5}, {"subject": "Physics", "value": 4}]);
        assert_eq!(
            content_hash(&payload).expect("hash"),
            content_hash(&payload).expect("hash")
        );
        assert_eq!(content_hash(&payload).expect("hash"), hash_json(&payload));
    }

    #[test]
    fn test_content_hash_detects_change() {
        let before = json!({"lessons": [{"room": "101"}]});
        let after = json!({"lessons": [{"room": "102"}]});
        assert_ne!(
            content_hash(&before).expect("hash"),
            content_hash(&after).expect("hash")
        );
    }

    #[test]
    fn test_content_hash_is_key_order_sensitive() {
        #[derive(Serialize)]
        struct Ab {
            a: u8,
            b: u8,
        }
        #[derive(Serialize)]
        struct Ba {
            b: u8,
            a: u8,
        }
        assert_ne!(
            content_hash(&Ab { a: 1, b: 2 }).expect("hash"),
            content_hash(&Ba { b: 2, a: 1 }).expect("hash")
        );
    }

    #[test]
    fn test_content_hash_unserializable_is_error() {
        let mut map = HashMap::new();
        map.insert(vec![1u8], 1u8);
        assert!(matches!(
            content_hash(&map),
            Err(Error::SerializationError(_))
        ));
    }
}
