//! Property-Based Tests for the Volatile Cache
//!
//! Uses proptest with a manual clock so time moves without sleeping.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{unit_key, VolatileCache};
use crate::clock::ManualClock;

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,31}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,64}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Invalidate { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Invalidate { key }),
    ]
}

fn new_cache() -> (Arc<ManualClock>, VolatileCache) {
    let clock = Arc::new(ManualClock::new(1_000_000));
    let cache = VolatileCache::new(clock.clone());
    (clock, cache)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // A value is readable for exactly `ttl` after it is written and gone after.
    #[test]
    fn prop_ttl_respected(
        key in key_strategy(),
        value in value_strategy(),
        ttl_ms in 0u64..100_000,
    ) {
        let (clock, cache) = new_cache();
        let ttl = Duration::from_millis(ttl_ms);

        cache.set(key.clone(), value.clone());
        prop_assert_eq!(cache.get_with_ttl::<String>(&key, ttl), Some(value.clone()));

        clock.advance(ttl);
        prop_assert_eq!(cache.get_with_ttl::<String>(&key, ttl), Some(value));

        clock.advance(Duration::from_millis(1));
        prop_assert_eq!(cache.get_with_ttl::<String>(&key, ttl), None);
        prop_assert!(!cache.has_with_ttl(&key, Duration::MAX));
    }

    // Once a short-ttl read evicts an entry, no longer ttl can bring it back.
    #[test]
    fn prop_stale_read_is_final(
        key in key_strategy(),
        short_ms in 0u64..1_000,
        elapsed_extra in 1u64..1_000,
    ) {
        let (clock, cache) = new_cache();

        cache.set(key.clone(), 1u8);
        clock.advance(Duration::from_millis(short_ms + elapsed_extra));

        prop_assert_eq!(cache.get_with_ttl::<u8>(&key, Duration::from_millis(short_ms)), None);
        prop_assert_eq!(cache.get_with_ttl::<u8>(&key, Duration::from_secs(1_000_000)), None);
    }

    // The cache behaves like a map under any sequence of fresh operations.
    #[test]
    fn prop_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let (_, cache) = new_cache();
        let mut model: HashMap<String, String> = HashMap::new();
        let mut expected_hits = 0u64;
        let mut expected_misses = 0u64;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    cache.set(key.clone(), value.clone());
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    let got = cache.get::<String>(&key);
                    prop_assert_eq!(got.as_ref(), model.get(&key));
                    if got.is_some() {
                        expected_hits += 1;
                    } else {
                        expected_misses += 1;
                    }
                }
                CacheOp::Invalidate { key } => {
                    prop_assert_eq!(cache.invalidate(&key), model.remove(&key).is_some());
                }
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.misses, expected_misses);
        prop_assert_eq!(stats.total_entries, model.len());
    }

    // Unit invalidation removes the unit's keys and nothing of other units.
    #[test]
    fn prop_invalidate_unit_scoping(
        names in prop::collection::hash_set("[a-z]{1,8}", 1..10),
        target in 1u64..9,
        other in 1u64..9,
    ) {
        // Both ids are single digits, so neither is a prefix of the other
        prop_assume!(target != other);
        let (_, cache) = new_cache();

        for name in &names {
            cache.set(unit_key(target, name), ());
            cache.set(unit_key(other, name), ());
        }

        prop_assert_eq!(cache.invalidate_unit(target), names.len());
        for name in &names {
            prop_assert!(!cache.has(&unit_key(target, name)));
            prop_assert!(cache.has(&unit_key(other, name)));
        }
    }
}
