//! Cached listing of items matching a tag and category.
//!
//! The listing is read from the object cache first. On a miss the host query
//! runs, the current item is removed from the results, the remainder is
//! stored for the configured TTL and then read back from the cache; the value
//! read back is what gets rendered.
//!
//! With [`CacheKeyStrategy::Shared`] (the default) every request uses the same
//! key, so a cached listing is served for any tag, category or excluded id
//! until it expires.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{CACHE_GROUP, CacheKeyStrategy, DEFAULT_TTL_SECS, ObjectCache};
use crate::host::{ContentItem, ItemId, QueryService};
use crate::markup::{display_scalar, html_escape, is_truthy, loose_int};
use crate::query::{DEFAULT_PAGE_SIZE, FilterQuery};

/// Tag the block lists by default.
pub const DEFAULT_TAG: &str = "foo";

/// Category the block lists by default.
pub const DEFAULT_CATEGORY: &str = "baz";

/// Tunables for the filtered listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSettings {
    pub tag: String,
    pub category: String,
    pub page_size: u32,
    pub ttl: Duration,
    pub key_strategy: CacheKeyStrategy,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            tag: DEFAULT_TAG.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            key_strategy: CacheKeyStrategy::Shared,
        }
    }
}

/// Produces the filtered listing fragment.
#[derive(Clone)]
pub struct FilteredListProvider {
    query: Arc<dyn QueryService>,
    cache: Arc<dyn ObjectCache>,
    page_size: u32,
    ttl: Duration,
    key_strategy: CacheKeyStrategy,
}

impl FilteredListProvider {
    pub fn new(query: Arc<dyn QueryService>, cache: Arc<dyn ObjectCache>) -> Self {
        Self::with_settings(query, cache, &FilterSettings::default())
    }

    pub fn with_settings(
        query: Arc<dyn QueryService>,
        cache: Arc<dyn ObjectCache>,
        settings: &FilterSettings,
    ) -> Self {
        Self {
            query,
            cache,
            page_size: settings.page_size,
            ttl: settings.ttl,
            key_strategy: settings.key_strategy,
        }
    }

    /// Listing for the default tag and category.
    pub fn default_markup(&self, exclude_id: Option<ItemId>) -> String {
        self.filtered_list_markup(exclude_id, DEFAULT_TAG, DEFAULT_CATEGORY)
    }

    /// Render items tagged `tag` in `category`, leaving out `exclude_id`.
    ///
    /// Returns an empty string when nothing is cached and the query finds
    /// nothing or fails, or when the cached value is empty.
    pub fn filtered_list_markup(
        &self,
        exclude_id: Option<ItemId>,
        tag: &str,
        category: &str,
    ) -> String {
        let key = self.key_strategy.key_for(tag, category, exclude_id);
        let mut cached = self.read_cached(&key);

        if cached.is_none() {
            debug!(key = %key, "filtered listing cache miss");
            if let Some(items) = self.fetch(exclude_id, tag, category) {
                match serde_json::to_value(&items) {
                    Ok(payload) => {
                        self.cache.set(CACHE_GROUP, &key, payload, self.ttl);
                        debug!(key = %key, count = items.len(), "filtered listing cached");
                        cached = self.read_cached(&key);
                    }
                    Err(e) => warn!(error = %e, "failed to encode filtered listing"),
                }
            }
        } else {
            debug!(key = %key, "filtered listing cache hit");
        }

        match cached {
            Some(value) if is_truthy(&value) => render_listing(&value, tag, category),
            _ => String::new(),
        }
    }

    /// Read the listing entry; a stored `false` counts as absent.
    fn read_cached(&self, key: &str) -> Option<Value> {
        self.cache
            .get(CACHE_GROUP, key)
            .filter(|value| *value != Value::Bool(false))
    }

    /// Run the listing query and drop the excluded item.
    ///
    /// `None` covers both "nothing found" and query failure.
    fn fetch(
        &self,
        exclude_id: Option<ItemId>,
        tag: &str,
        category: &str,
    ) -> Option<Vec<ContentItem>> {
        let query = FilterQuery::filtered_listing(tag, category, self.page_size);
        let result = self.query.query(&query).ok()?;
        if !result.has_results() {
            return None;
        }

        Some(
            result
                .items
                .into_iter()
                .filter(|item| Some(item.id) != exclude_id)
                .collect(),
        )
    }
}

impl std::fmt::Debug for FilteredListProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredListProvider")
            .field("page_size", &self.page_size)
            .field("ttl", &self.ttl)
            .field("key_strategy", &self.key_strategy)
            .finish()
    }
}

/// Heading plus one `<li>` per stored item id.
///
/// The heading number is the stored value coerced to an integer, so any
/// non-empty listing shows `1`.
fn render_listing(value: &Value, tag: &str, category: &str) -> String {
    let mut html = format!(
        "<h2>{} posts with the tag of {} and the category of {}</h2>",
        loose_int(value),
        html_escape(tag),
        html_escape(category)
    );

    html.push_str("<ul>");
    for item in listed_items(value) {
        let id = item.get("id").map(display_scalar).unwrap_or_default();
        html.push_str(&format!("<li>{}</li>", html_escape(&id)));
    }
    html.push_str("</ul>");

    html
}

/// Entries of a stored listing; scalars have none.
fn listed_items(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    }
}
