//! Interfaces to the services the host platform provides.
//!
//! The block never touches storage directly: content-type metadata, item
//! queries, the object cache and the current-request context all arrive as
//! trait objects bundled in [`HostServices`].

pub mod memory;

use std::sync::Arc;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::cache::ObjectCache;
use crate::error::HostResult;
use crate::query::{FilterQuery, QueryResult};

/// Identifier of a content item.
pub type ItemId = u64;

/// Publication status of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemStatus {
    Publish,
    Draft,
    Pending,
    Private,
    Future,
    Trash,
    AutoDraft,
}

/// A content item as returned by the query service.
///
/// Only `id` is read by the block; the remaining fields let a host evaluate
/// filter queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ItemId,

    /// Content type slug (e.g. "post", "page").
    #[serde(rename = "type")]
    pub item_type: String,

    #[serde(default)]
    pub title: String,

    pub status: ItemStatus,

    /// Publication date in site-local time.
    pub date: NaiveDateTime,

    /// Tag slugs.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Category slugs.
    #[serde(default)]
    pub categories: Vec<String>,
}

impl ContentItem {
    /// Hour of day (0-23) of the publication date.
    pub fn hour(&self) -> u32 {
        self.date.hour()
    }
}

/// A registered content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeInfo {
    /// Machine name.
    pub slug: String,

    /// Plural display label (e.g. "Posts").
    pub label: String,

    /// Whether the type is publicly visible.
    #[serde(default = "default_public")]
    pub public: bool,
}

fn default_public() -> bool {
    true
}

/// A public content type together with its published count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeDescriptor {
    pub slug: String,
    pub display_label: String,
    pub published_count: u64,
}

/// Content-type metadata provided by the host.
pub trait ContentTypeDirectory: Send + Sync {
    /// All publicly visible content types, in registration order.
    fn public_content_types(&self) -> Vec<ContentTypeInfo>;

    /// Number of published items of the given type.
    fn count_published(&self, slug: &str) -> u64;

    /// Public types with their counts, computed fresh on every call.
    fn describe_public_types(&self) -> Vec<ContentTypeDescriptor> {
        self.public_content_types()
            .into_iter()
            .map(|info| {
                let published_count = self.count_published(&info.slug);
                ContentTypeDescriptor {
                    slug: info.slug,
                    display_label: info.label,
                    published_count,
                }
            })
            .collect()
    }
}

/// Item query execution provided by the host.
pub trait QueryService: Send + Sync {
    fn query(&self, query: &FilterQuery) -> HostResult<QueryResult>;
}

/// Access to the item currently being displayed.
pub trait CurrentContext {
    fn current_item_id(&self) -> Option<ItemId>;
}

/// Bundle of host services injected into the plugin at startup.
#[derive(Clone)]
pub struct HostServices {
    pub directory: Arc<dyn ContentTypeDirectory>,
    pub query: Arc<dyn QueryService>,
    pub cache: Arc<dyn ObjectCache>,
}

impl std::fmt::Debug for HostServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostServices").finish()
    }
}
