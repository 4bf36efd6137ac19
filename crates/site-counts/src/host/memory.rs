//! In-memory host backed by a YAML site fixture.
//!
//! Implements [`ContentTypeDirectory`] and [`QueryService`] over a fixed set
//! of content types and items. Used by the `site-counts` binary and tests.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{ContentItem, ContentTypeDirectory, ContentTypeInfo, ItemStatus, QueryService};
use crate::error::HostResult;
use crate::query::{FilterQuery, QueryResult};

/// Maximum fixture file size (1 MB).
const MAX_FIXTURE_SIZE: u64 = 1024 * 1024;

/// A site whose content lives entirely in memory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InMemorySite {
    #[serde(default)]
    content_types: Vec<ContentTypeInfo>,
    #[serde(default)]
    items: Vec<ContentItem>,
}

impl InMemorySite {
    pub fn new(content_types: Vec<ContentTypeInfo>, items: Vec<ContentItem>) -> Self {
        Self {
            content_types,
            items,
        }
    }

    /// Parse a site fixture from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yml::from_str(yaml).context("failed to parse site fixture")
    }

    /// Load a site fixture from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("failed to stat site fixture {}", path.display()))?;
        if meta.len() > MAX_FIXTURE_SIZE {
            anyhow::bail!(
                "site fixture {} is {} bytes, limit is {MAX_FIXTURE_SIZE}",
                path.display(),
                meta.len()
            );
        }
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read site fixture {}", path.display()))?;
        Self::from_yaml_str(&yaml)
            .with_context(|| format!("invalid site fixture {}", path.display()))
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    fn matches(query: &FilterQuery, item: &ContentItem) -> bool {
        query.content_types.iter().any(|t| *t == item.item_type)
            && query.status.accepts(item.status)
            && query.hour_clauses.iter().all(|c| c.accepts(item.hour()))
            && TermFilter::parse(&query.tag).accepts(&item.tags)
            && TermFilter::parse(&query.category).accepts(&item.categories)
    }
}

impl ContentTypeDirectory for InMemorySite {
    fn public_content_types(&self) -> Vec<ContentTypeInfo> {
        self.content_types
            .iter()
            .filter(|t| t.public)
            .cloned()
            .collect()
    }

    fn count_published(&self, slug: &str) -> u64 {
        self.items
            .iter()
            .filter(|i| i.item_type == slug && i.status == ItemStatus::Publish)
            .count() as u64
    }
}

impl QueryService for InMemorySite {
    fn query(&self, query: &FilterQuery) -> HostResult<QueryResult> {
        let mut matched: Vec<&ContentItem> = self
            .items
            .iter()
            .filter(|item| Self::matches(query, item))
            .collect();

        // Newest first; ties broken by id so paging is stable.
        matched.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

        let found_count = matched.len() as u64;
        let limit = match query.page_size {
            0 => matched.len(),
            n => n as usize,
        };
        let items = matched.into_iter().take(limit).cloned().collect();

        Ok(QueryResult::found(found_count, items))
    }
}

/// Term slug constraint: `a,b` matches any listed term, `a+b` requires all.
#[derive(Debug, PartialEq, Eq)]
enum TermFilter<'a> {
    Unconstrained,
    Any(Vec<&'a str>),
    All(Vec<&'a str>),
}

impl<'a> TermFilter<'a> {
    fn parse(terms: &'a str) -> Self {
        let list = terms.trim();
        if list.is_empty() {
            return TermFilter::Unconstrained;
        }
        let split = |sep: char| {
            list.split(sep)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        };
        if list.contains('+') {
            TermFilter::All(split('+'))
        } else {
            TermFilter::Any(split(','))
        }
    }

    fn accepts(&self, terms: &[String]) -> bool {
        let has = |slug: &&str| terms.iter().any(|t| t.as_str() == *slug);
        match self {
            TermFilter::Unconstrained => true,
            TermFilter::Any(slugs) => slugs.iter().any(has),
            TermFilter::All(slugs) => slugs.iter().all(has),
        }
    }
}
