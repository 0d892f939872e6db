//! Property-based tests for content hashing and the store contract.
//!
//! # Properties Tested
//!
//! 1. **Determinism**: equal payloads always fingerprint equally
//! 2. **Reference fold**: the fingerprint matches a 32-bit wrapping fold
//!    computed independently in 64-bit arithmetic
//! 3. **Alphabet**: fingerprints are non-empty lowercase base 36
//! 4. **Store roundtrip**: live entries read back unchanged

use portal_cache::backend::InMemoryBackend;
use portal_cache::clock::ManualClock;
use portal_cache::hash::{content_hash, hash_json, hash_str};
use portal_cache::{CacheOptions, CacheStore};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Mark {
    id: u64,
    subject: String,
    value: u8,
}

fn arb_mark() -> impl Strategy<Value = Mark> {
    (any::<u64>(), "[A-Za-zА-Яа-я ]{0,24}", 1u8..=5).prop_map(|(id, subject, value)| Mark {
        id,
        subject,
        value,
    })
}

/// Independent fold: accumulate modulo 2^32, then reinterpret as signed.
fn reference_hash(text: &str) -> String {
    let mut h: i64 = 0;
    for unit in text.encode_utf16() {
        h = (h * 31 + i64::from(unit)).rem_euclid(1 << 32);
    }
    let signed = if h >= 1 << 31 { h - (1 << 32) } else { h };
    let mut n = signed.unsigned_abs();
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(std::char::from_digit((n % 36) as u32, 36).expect("digit < 36"));
        n /= 36;
    }
    digits.iter().rev().collect()
}

proptest! {
    #[test]
    fn prop_hash_is_deterministic(marks in prop::collection::vec(arb_mark(), 0..20)) {
        let copy = marks.clone();
        prop_assert_eq!(
            content_hash(&marks).expect("serializable"),
            content_hash(&copy).expect("serializable")
        );
    }

    #[test]
    fn prop_hash_matches_reference_fold(text in any::<String>()) {
        let hash = hash_str(&text);
        prop_assert_eq!(hash.as_str(), reference_hash(&text));
    }

    #[test]
    fn prop_hash_alphabet(text in any::<String>()) {
        let hash = hash_str(&text);
        prop_assert!(!hash.as_str().is_empty());
        prop_assert!(hash.as_str().chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn prop_content_hash_is_hash_of_json(marks in prop::collection::vec(arb_mark(), 0..10)) {
        let json = serde_json::to_value(&marks).expect("serializable");
        prop_assert_eq!(content_hash(&marks).expect("serializable"), hash_json(&json));
    }

    #[test]
    fn prop_store_roundtrip_within_ttl(
        marks in prop::collection::vec(arb_mark(), 0..10),
        age in 0u64..=1_000,
    ) {
        let clock = ManualClock::new(10_000);
        let store = CacheStore::new(InMemoryBackend::new()).with_clock(Arc::new(clock.clone()));
        let options = CacheOptions::ttl(Duration::from_millis(1_000));

        store.set("marks_1", &marks, &options);
        clock.advance(age);

        prop_assert_eq!(store.get::<Vec<Mark>>("marks_1", &options), Some(marks));
    }
}
