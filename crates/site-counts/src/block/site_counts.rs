//! The Site Counts block renderer.
//!
//! Lists the published count of every public content type, prints the id of
//! the item the block sits on and appends the cached tag/category listing.

use std::sync::Arc;

use crate::block::filtered::{FilterSettings, FilteredListProvider};
use crate::block::{BlockAttributes, BlockInstance, BlockType};
use crate::host::{ContentTypeDirectory, CurrentContext, HostServices, ItemId};
use crate::markup::html_escape;

/// Name the block is registered under when no manifest overrides it.
pub const BLOCK_NAME: &str = "site-counts/site-counts";

/// Server-side renderer for the Site Counts block.
#[derive(Clone)]
pub struct SiteCountsBlock {
    name: String,
    directory: Arc<dyn ContentTypeDirectory>,
    listing: FilteredListProvider,
    tag: String,
    category: String,
}

impl SiteCountsBlock {
    pub fn new(services: &HostServices, settings: &FilterSettings) -> Self {
        Self {
            name: BLOCK_NAME.to_string(),
            directory: Arc::clone(&services.directory),
            listing: FilteredListProvider::with_settings(
                Arc::clone(&services.query),
                Arc::clone(&services.cache),
                settings,
            ),
            tag: settings.tag.clone(),
            category: settings.category.clone(),
        }
    }

    /// Register under a different block name (taken from `block.json`).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Render the block for the item `current_item_id`.
    pub fn render(&self, attributes: &BlockAttributes, current_item_id: Option<ItemId>) -> String {
        let class_attr = attributes
            .sanitized_class()
            .map(|class| format!("class='{class}'"))
            .unwrap_or_default();

        let mut markup = format!("<div {class_attr}>");
        markup.push_str("<h2>Post Counts</h2>");

        markup.push_str("<ul>");
        for content_type in self.directory.describe_public_types() {
            markup.push_str(&format!(
                "<li> There are {} {}.</li>",
                content_type.published_count,
                html_escape(&content_type.display_label)
            ));
        }
        markup.push_str("</ul>");

        let current = current_item_id.map(|id| id.to_string()).unwrap_or_default();
        markup.push_str(&format!("<p>The current post ID is {current}.</p>"));

        markup.push_str(&self.listing.filtered_list_markup(
            current_item_id,
            &self.tag,
            &self.category,
        ));

        // Matches the markup earlier releases produced.
        markup.push_str("<div>");

        markup
    }
}

impl BlockType for SiteCountsBlock {
    fn name(&self) -> &str {
        &self.name
    }

    fn render_callback(
        &self,
        attributes: &BlockAttributes,
        _content: &str,
        block: &BlockInstance,
    ) -> String {
        self.render(attributes, block.current_item_id())
    }
}

impl std::fmt::Debug for SiteCountsBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteCountsBlock")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("category", &self.category)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::host::memory::InMemorySite;

    const SITE: &str = r#"
content_types:
  - slug: post
    label: Posts
  - slug: page
    label: Pages
items:
  - { id: 1, type: post, status: publish, date: "2024-05-01T10:00:00", tags: [foo], categories: [baz] }
  - { id: 2, type: post, status: draft, date: "2024-05-01T11:00:00", tags: [foo], categories: [baz] }
  - { id: 3, type: page, status: publish, date: "2024-05-01T12:00:00" }
"#;

    fn block() -> SiteCountsBlock {
        let site = Arc::new(InMemorySite::from_yaml_str(SITE).unwrap());
        let services = HostServices {
            directory: site.clone(),
            query: site,
            cache: Arc::new(MemoryCache::new()),
        };
        SiteCountsBlock::new(&services, &FilterSettings::default())
    }

    #[test]
    fn renders_full_block() {
        let html = block().render(&BlockAttributes::with_class_name("wide"), Some(1));
        assert_eq!(
            html,
            "<div class='wide'><h2>Post Counts</h2><ul>\
             <li> There are 1 Posts.</li><li> There are 1 Pages.</li></ul>\
             <p>The current post ID is 1.</p>\
             <h2>1 posts with the tag of foo and the category of baz</h2>\
             <ul><li>2</li></ul><div>"
        );
    }

    #[test]
    fn renders_without_class_or_current_item() {
        let html = block().render(&BlockAttributes::default(), None);
        assert!(html.starts_with("<div ><h2>Post Counts</h2>"));
        assert!(html.contains("<p>The current post ID is .</p>"));
        assert!(html.contains("<ul><li>2</li><li>1</li></ul>"));
    }

    #[test]
    fn render_callback_reads_post_id_from_instance() {
        let b = block();
        let html = b.render_callback(
            &BlockAttributes::default(),
            "",
            &BlockInstance::new(BLOCK_NAME).with_post_id(2),
        );
        assert!(html.contains("The current post ID is 2."));
        assert_eq!(b.name(), BLOCK_NAME);
    }
}
