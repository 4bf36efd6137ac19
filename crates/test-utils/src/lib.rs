//! Site Counts test utilities.
//!
//! Fixture builders for content items and content types, plus host service
//! doubles that record how the block uses them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use site_counts::HostServices;
use site_counts::cache::{MemoryCache, ObjectCache};
use site_counts::error::{HostError, HostResult};
use site_counts::host::{
    ContentItem, ContentTypeDirectory, ContentTypeInfo, ItemId, ItemStatus, QueryService,
};
use site_counts::query::{FilterQuery, QueryResult};

/// Create a test item with default values: a published post at 10:00,
/// tagged `foo` in category `baz`.
pub fn test_item(id: ItemId) -> TestItem {
    TestItem {
        id,
        item_type: "post".to_string(),
        title: format!("Item {id}"),
        status: ItemStatus::Publish,
        hour: 10,
        tags: vec!["foo".to_string()],
        categories: vec!["baz".to_string()],
    }
}

/// A test item builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestItem {
    pub id: ItemId,
    pub item_type: String,
    pub title: String,
    pub status: ItemStatus,
    pub hour: u32,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

impl TestItem {
    /// Set the content type.
    pub fn of_type(mut self, item_type: &str) -> Self {
        self.item_type = item_type.to_string();
        self
    }

    /// Set the status.
    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the publication hour.
    pub fn at_hour(mut self, hour: u32) -> Self {
        self.hour = hour;
        self
    }

    /// Replace the tags.
    pub fn tagged(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| (*t).to_string()).collect();
        self
    }

    /// Replace the categories.
    pub fn in_categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Build the content item. Items are dated 2024-05-01 plus `id` minutes.
    pub fn build(self) -> ContentItem {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(self.hour.min(23), (self.id % 60) as u32, 0))
            .unwrap_or(NaiveDateTime::MIN);
        ContentItem {
            id: self.id,
            item_type: self.item_type,
            title: self.title,
            status: self.status,
            date,
            tags: self.tags,
            categories: self.categories,
        }
    }
}

/// Build plain items for the given ids.
pub fn items(ids: &[ItemId]) -> Vec<ContentItem> {
    ids.iter().map(|id| test_item(*id).build()).collect()
}

/// Create a public content type.
pub fn test_content_type(slug: &str, label: &str) -> ContentTypeInfo {
    ContentTypeInfo {
        slug: slug.to_string(),
        label: label.to_string(),
        public: true,
    }
}

/// Content-type directory with fixed published counts.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    types: Vec<(ContentTypeInfo, u64)>,
    count_calls: AtomicUsize,
}

impl StaticDirectory {
    pub fn new(types: &[(&str, &str, u64)]) -> Self {
        Self {
            types: types
                .iter()
                .map(|(slug, label, count)| (test_content_type(slug, label), *count))
                .collect(),
            count_calls: AtomicUsize::new(0),
        }
    }

    /// Add a content type that is not public.
    pub fn with_private(mut self, slug: &str, label: &str, count: u64) -> Self {
        let mut info = test_content_type(slug, label);
        info.public = false;
        self.types.push((info, count));
        self
    }

    /// Number of `count_published` calls so far.
    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }
}

impl ContentTypeDirectory for StaticDirectory {
    fn public_content_types(&self) -> Vec<ContentTypeInfo> {
        self.types
            .iter()
            .filter(|(info, _)| info.public)
            .map(|(info, _)| info.clone())
            .collect()
    }

    fn count_published(&self, slug: &str) -> u64 {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.types
            .iter()
            .find(|(info, _)| info.slug == slug)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

/// Query service that answers every query with a scripted response and
/// records the queries it received.
#[derive(Debug)]
pub struct ScriptedQuery {
    response: Mutex<Option<QueryResult>>,
    calls: AtomicUsize,
    received: Mutex<Vec<FilterQuery>>,
}

impl ScriptedQuery {
    /// Respond with `found_count` and `items`.
    pub fn returning(found_count: u64, items: Vec<ContentItem>) -> Self {
        Self::with_response(Some(QueryResult::found(found_count, items)))
    }

    /// Respond with a result flagged as an error.
    pub fn flagged_error() -> Self {
        Self::with_response(Some(QueryResult::error()))
    }

    /// Fail every call with a host error.
    pub fn failing() -> Self {
        Self::with_response(None)
    }

    fn with_response(response: Option<QueryResult>) -> Self {
        Self {
            response: Mutex::new(response),
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Change the response for subsequent calls.
    pub fn set_response(&self, found_count: u64, items: Vec<ContentItem>) {
        *self.response.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(QueryResult::found(found_count, items));
    }

    /// Number of queries executed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent query, if any.
    pub fn last_query(&self) -> Option<FilterQuery> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl QueryService for ScriptedQuery {
    fn query(&self, query: &FilterQuery) -> HostResult<QueryResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.clone());
        self.response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| HostError::Query("scripted failure".to_string()))
    }
}

/// Memory cache that counts reads and writes.
#[derive(Debug, Default)]
pub struct RecordingCache {
    inner: MemoryCache,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Store a value directly, bypassing the counters.
    pub fn seed(&self, group: &str, key: &str, value: Value) {
        self.inner.set(group, key, value, Duration::from_secs(300));
    }

    /// Read a value directly, bypassing the counters.
    pub fn peek(&self, group: &str, key: &str) -> Option<Value> {
        self.inner.get(group, key)
    }
}

impl ObjectCache for RecordingCache {
    fn get(&self, group: &str, key: &str) -> Option<Value> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(group, key)
    }

    fn set(&self, group: &str, key: &str, value: Value, ttl: Duration) {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(group, key, value, ttl);
    }
}

/// Bundle service doubles into [`HostServices`].
pub fn services(
    directory: Arc<StaticDirectory>,
    query: Arc<ScriptedQuery>,
    cache: Arc<RecordingCache>,
) -> HostServices {
    HostServices {
        directory,
        query,
        cache,
    }
}
