//! Integration tests for routing and offline caching through the public API

use chrono::{Duration, Utc};
use serde_json::{json, Value};

use vitalvision::cache::{
    CacheConfig, FetchMetadata, KeyValueStorage, MemoryStorage, OfflineCache, RetrieveOptions,
    DEFAULT_STORAGE_KEY,
};
use vitalvision::data::{all_categories, sources_for_category, RouterError, SourceDescriptor};
use vitalvision::fetch::{fetch_category, FetchError, ProviderError, SourceProvider};

/// Provider that is always down
struct OfflineProvider;

impl SourceProvider for OfflineProvider {
    fn fetch(&self, descriptor: &SourceDescriptor) -> Result<Value, ProviderError> {
        Err(ProviderError::Unavailable(descriptor.source.to_string()))
    }
}

/// Writes a one-record blob whose record was stored `days_ago`
fn seed_aged_record(storage: &MemoryStorage, category: &str, days_ago: i64) {
    let stored_at = (Utc::now() - Duration::days(days_ago)).to_rfc3339();
    let blob = json!({
        category: [{
            "category": category,
            "data": {"v": "aged"},
            "metadata": {"storedAt": stored_at, "sources": ["archive"]}
        }]
    });
    storage
        .set(DEFAULT_STORAGE_KEY, &blob.to_string())
        .expect("Seeding should succeed");
}

#[test]
fn test_router_properties_hold_for_every_category() {
    for mapping in all_categories() {
        let normal = sources_for_category(mapping.category, false).unwrap();
        assert_eq!(normal.primary_sources, mapping.primary);
        assert_eq!(normal.secondary_sources, mapping.secondary);

        let compromised = sources_for_category(mapping.category, true).unwrap();
        let expected: Vec<SourceDescriptor> = mapping
            .secondary
            .iter()
            .chain(mapping.primary)
            .copied()
            .collect();
        assert_eq!(compromised.primary_sources, expected);
        assert!(compromised.secondary_sources.is_empty());
    }
}

#[test]
fn test_router_rejects_unknown_category() {
    assert_eq!(
        sources_for_category("not-a-real-category", false),
        Err(RouterError::CategoryNotFound("not-a-real-category".to_string()))
    );
}

#[test]
fn test_bound_keeps_most_recent_records() {
    let cache = OfflineCache::new(
        MemoryStorage::new(),
        CacheConfig {
            max_items: 4,
            ..Default::default()
        },
    );

    for v in 0..7 {
        assert!(cache.store_data("mental-health", json!(v), FetchMetadata::default()));
    }

    let snapshot = cache.get_storage();
    let values: Vec<&Value> = snapshot["mental-health"].iter().map(|r| &r.data).collect();
    assert_eq!(values, vec![&json!(6), &json!(5), &json!(4), &json!(3)]);
}

#[test]
fn test_aged_record_only_returned_when_age_ignored() {
    let cache = OfflineCache::with_defaults(MemoryStorage::new());
    seed_aged_record(cache.storage(), "obesity", 45);

    assert!(cache
        .retrieve_data("obesity", &RetrieveOptions::default())
        .is_none());
    let record = cache
        .retrieve_data("obesity", &RetrieveOptions::default().ignoring_age())
        .expect("Age-exempt read should return the record");
    assert_eq!(record.data["v"], "aged");
}

#[test]
fn test_record_within_max_age_is_returned() {
    let cache = OfflineCache::with_defaults(MemoryStorage::new());
    seed_aged_record(cache.storage(), "obesity", 29);

    assert!(cache
        .retrieve_data("obesity", &RetrieveOptions::default())
        .is_some());
}

#[test]
fn test_clear_storage_then_get_storage_is_empty() {
    let cache = OfflineCache::with_defaults(MemoryStorage::new());
    cache.store_data("obesity", json!(1), FetchMetadata::default());
    cache.store_data("lgbtq-health", json!(2), FetchMetadata::default());

    cache.clear_storage();

    assert!(cache.get_storage().is_empty());
}

#[test]
fn test_offline_fetch_serves_fresh_cache() {
    let cache = OfflineCache::with_defaults(MemoryStorage::new());
    cache.store_data(
        "lgbtq-health",
        json!({"respondents": 1200}),
        FetchMetadata::from_sources(["fenway"]),
    );

    let outcome = fetch_category(&cache, &OfflineProvider, "lgbtq-health", true).unwrap();

    assert!(!outcome.is_live());
    assert_eq!(outcome.data()["respondents"], 1200);
}

#[test]
fn test_offline_fetch_with_only_stale_cache_is_unavailable() {
    let cache = OfflineCache::with_defaults(MemoryStorage::new());
    seed_aged_record(cache.storage(), "obesity", 90);

    let err = fetch_category(&cache, &OfflineProvider, "obesity", false).unwrap_err();

    match err {
        FetchError::Unavailable { attempts, .. } => assert_eq!(attempts.len(), 4),
        other => panic!("Expected Unavailable, got {:?}", other),
    }
}
