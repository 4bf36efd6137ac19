#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Filtered listing tests.
//!
//! Covers the cache miss and hit paths, exclusion of the current item,
//! query failures and the shared cache key.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use site_counts::block::{FilterSettings, FilteredListProvider};
use site_counts::cache::{CACHE_GROUP, CacheKeyStrategy, FILTERED_POSTS_KEY};
use site_counts::query::FilterQuery;
use site_counts_test_utils::{RecordingCache, ScriptedQuery, items};

fn provider(query: &Arc<ScriptedQuery>, cache: &Arc<RecordingCache>) -> FilteredListProvider {
    FilteredListProvider::new(query.clone(), cache.clone())
}

fn provider_with(
    query: &Arc<ScriptedQuery>,
    cache: &Arc<RecordingCache>,
    settings: FilterSettings,
) -> FilteredListProvider {
    FilteredListProvider::with_settings(query.clone(), cache.clone(), &settings)
}

fn cached_ids(cache: &RecordingCache, key: &str) -> Vec<u64> {
    cache
        .peek(CACHE_GROUP, key)
        .and_then(|v| v.as_array().cloned())
        .unwrap_or_default()
        .iter()
        .filter_map(|item| item.get("id").and_then(Value::as_u64))
        .collect()
}

#[test]
fn excluded_item_is_dropped_before_caching() {
    let query = Arc::new(ScriptedQuery::returning(3, items(&[10, 11, 12])));
    let cache = Arc::new(RecordingCache::new());

    let html = provider(&query, &cache).filtered_list_markup(Some(11), "foo", "baz");

    assert_eq!(
        html,
        "<h2>1 posts with the tag of foo and the category of baz</h2>\
         <ul><li>10</li><li>12</li></ul>"
    );
    assert!(!html.contains("<li>11</li>"));
    assert_eq!(cached_ids(&cache, FILTERED_POSTS_KEY), vec![10, 12]);
}

#[test]
fn zero_found_returns_empty_and_skips_cache_write() {
    let query = Arc::new(ScriptedQuery::returning(0, Vec::new()));
    let cache = Arc::new(RecordingCache::new());

    let html = provider(&query, &cache).filtered_list_markup(Some(1), "foo", "baz");

    assert_eq!(html, "");
    assert_eq!(cache.sets(), 0);
    assert_eq!(cache.peek(CACHE_GROUP, FILTERED_POSTS_KEY), None);
}

#[test]
fn zero_found_count_wins_over_returned_items() {
    let query = Arc::new(ScriptedQuery::returning(0, items(&[1, 2])));
    let cache = Arc::new(RecordingCache::new());

    assert_eq!(provider(&query, &cache).default_markup(None), "");
    assert_eq!(cache.sets(), 0);
}

#[test]
fn second_call_is_served_from_cache() {
    let query = Arc::new(ScriptedQuery::returning(2, items(&[4, 5])));
    let cache = Arc::new(RecordingCache::new());
    let p = provider(&query, &cache);

    let first = p.filtered_list_markup(Some(9), "foo", "baz");
    let second = p.filtered_list_markup(Some(9), "foo", "baz");
    let third = p.filtered_list_markup(Some(9), "foo", "baz");

    assert_eq!(query.calls(), 1);
    assert_eq!(cache.sets(), 1);
    assert_eq!(first, second);
    assert_eq!(second, third);
}

#[test]
fn miss_path_reads_cache_back_after_writing() {
    let query = Arc::new(ScriptedQuery::returning(1, items(&[4])));
    let cache = Arc::new(RecordingCache::new());

    provider(&query, &cache).filtered_list_markup(None, "foo", "baz");

    assert_eq!(cache.gets(), 2);
    assert_eq!(cache.sets(), 1);
}

#[test]
fn shared_key_serves_stale_listing_for_other_parameters() {
    let query = Arc::new(ScriptedQuery::returning(2, items(&[2, 3])));
    let cache = Arc::new(RecordingCache::new());
    let p = provider(&query, &cache);

    p.filtered_list_markup(Some(1), "foo", "baz");
    query.set_response(1, items(&[99]));

    let html = p.filtered_list_markup(Some(2), "news", "local");

    assert_eq!(query.calls(), 1);
    assert!(html.contains("<ul><li>2</li><li>3</li></ul>"));
    assert!(!html.contains("<li>99</li>"));
    assert!(html.contains("tag of news and the category of local"));
}

#[test]
fn per_query_keys_keep_requests_apart() {
    let query = Arc::new(ScriptedQuery::returning(2, items(&[2, 3])));
    let cache = Arc::new(RecordingCache::new());
    let p = provider_with(
        &query,
        &cache,
        FilterSettings {
            key_strategy: CacheKeyStrategy::PerQuery,
            ..FilterSettings::default()
        },
    );

    p.filtered_list_markup(Some(1), "foo", "baz");
    query.set_response(1, items(&[99]));
    let other = p.filtered_list_markup(Some(2), "news", "local");
    let again = p.filtered_list_markup(Some(1), "foo", "baz");

    assert_eq!(query.calls(), 2);
    assert!(other.contains("<ul><li>99</li></ul>"));
    assert!(again.contains("<ul><li>2</li><li>3</li></ul>"));
    assert_eq!(cache.peek(CACHE_GROUP, FILTERED_POSTS_KEY), None);
}

#[test]
fn flagged_query_error_behaves_like_no_results() {
    let query = Arc::new(ScriptedQuery::flagged_error());
    let cache = Arc::new(RecordingCache::new());
    let p = provider(&query, &cache);

    assert_eq!(p.filtered_list_markup(Some(1), "foo", "baz"), "");
    assert_eq!(cache.sets(), 0);
}

#[test]
fn failed_query_is_swallowed_and_retried_next_call() {
    let query = Arc::new(ScriptedQuery::failing());
    let cache = Arc::new(RecordingCache::new());
    let p = provider(&query, &cache);

    assert_eq!(p.filtered_list_markup(Some(1), "foo", "baz"), "");
    assert_eq!(p.filtered_list_markup(Some(1), "foo", "baz"), "");
    assert_eq!(query.calls(), 2);
    assert_eq!(cache.sets(), 0);
}

#[test]
fn listing_of_only_the_excluded_item_caches_empty_value() {
    let query = Arc::new(ScriptedQuery::returning(1, items(&[5])));
    let cache = Arc::new(RecordingCache::new());
    let p = provider(&query, &cache);

    assert_eq!(p.filtered_list_markup(Some(5), "foo", "baz"), "");
    assert_eq!(cache.peek(CACHE_GROUP, FILTERED_POSTS_KEY), Some(json!([])));

    // An empty stored listing is still a cache hit.
    assert_eq!(p.filtered_list_markup(Some(5), "foo", "baz"), "");
    assert_eq!(query.calls(), 1);
}

#[test]
fn missing_current_item_excludes_nothing() {
    let query = Arc::new(ScriptedQuery::returning(2, items(&[7, 8])));
    let cache = Arc::new(RecordingCache::new());

    let html = provider(&query, &cache).filtered_list_markup(None, "foo", "baz");

    assert!(html.ends_with("<ul><li>7</li><li>8</li></ul>"));
}

#[test]
fn issues_listing_query() {
    let query = Arc::new(ScriptedQuery::returning(0, Vec::new()));
    let cache = Arc::new(RecordingCache::new());

    provider(&query, &cache).default_markup(Some(3));

    assert_eq!(
        query.last_query(),
        Some(FilterQuery::filtered_listing("foo", "baz", 6))
    );
}

#[test]
fn page_size_setting_reaches_query() {
    let query = Arc::new(ScriptedQuery::returning(0, Vec::new()));
    let cache = Arc::new(RecordingCache::new());
    let p = provider_with(
        &query,
        &cache,
        FilterSettings {
            page_size: 11,
            ..FilterSettings::default()
        },
    );

    p.filtered_list_markup(None, "a", "b");

    assert_eq!(query.last_query().unwrap().page_size, 11);
}

#[test]
fn expired_listing_is_queried_again() {
    let query = Arc::new(ScriptedQuery::returning(1, items(&[4])));
    let cache = Arc::new(RecordingCache::new());
    let p = provider_with(
        &query,
        &cache,
        FilterSettings {
            ttl: Duration::from_millis(50),
            ..FilterSettings::default()
        },
    );

    p.default_markup(None);
    std::thread::sleep(Duration::from_millis(120));
    p.default_markup(None);

    assert_eq!(query.calls(), 2);
}

#[test]
fn falsy_cached_values_render_nothing_without_querying() {
    let query = Arc::new(ScriptedQuery::returning(1, items(&[4])));
    let cache = Arc::new(RecordingCache::new());
    cache.seed(CACHE_GROUP, FILTERED_POSTS_KEY, json!(0));

    assert_eq!(provider(&query, &cache).default_markup(None), "");
    assert_eq!(query.calls(), 0);
}

#[test]
fn stored_false_is_treated_as_missing() {
    let query = Arc::new(ScriptedQuery::returning(1, items(&[4])));
    let cache = Arc::new(RecordingCache::new());
    cache.seed(CACHE_GROUP, FILTERED_POSTS_KEY, json!(false));

    let html = provider(&query, &cache).default_markup(None);

    assert_eq!(query.calls(), 1);
    assert!(html.contains("<ul><li>4</li></ul>"));
    assert_eq!(cached_ids(&cache, FILTERED_POSTS_KEY), vec![4]);
}

#[test]
fn scalar_cached_value_renders_heading_only() {
    let query = Arc::new(ScriptedQuery::returning(1, items(&[4])));
    let cache = Arc::new(RecordingCache::new());
    cache.seed(CACHE_GROUP, FILTERED_POSTS_KEY, json!("3"));

    assert_eq!(
        provider(&query, &cache).default_markup(None),
        "<h2>3 posts with the tag of foo and the category of baz</h2><ul></ul>"
    );
}
