//! Filter query description passed to the host's query service.
//!
//! The query is a plain value: the host decides how to execute it. Date
//! constraints are kept as a list of independent hour clauses rather than a
//! single window.

use serde::{Deserialize, Serialize};

use crate::host::{ContentItem, ItemStatus};

/// Content types the filtered listing searches.
pub const FILTERED_CONTENT_TYPES: &[&str] = &["post", "page"];

/// Default number of items requested per query.
///
/// Five matching items plus one slot for the excluded current item.
pub const DEFAULT_PAGE_SIZE: u32 = 6;

/// Comparison operator for an hour clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compare {
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    LessOrEqual,
}

impl Compare {
    /// Apply the operator as `lhs <op> rhs`.
    pub fn matches(self, lhs: u32, rhs: u32) -> bool {
        match self {
            Compare::Equal => lhs == rhs,
            Compare::NotEqual => lhs != rhs,
            Compare::Greater => lhs > rhs,
            Compare::GreaterOrEqual => lhs >= rhs,
            Compare::Less => lhs < rhs,
            Compare::LessOrEqual => lhs <= rhs,
        }
    }
}

/// A single constraint on the hour of an item's publication date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourClause {
    pub hour: u32,
    pub compare: Compare,
}

impl HourClause {
    pub fn new(hour: u32, compare: Compare) -> Self {
        Self { hour, compare }
    }

    /// Whether an item published at `item_hour` satisfies this clause.
    pub fn accepts(&self, item_hour: u32) -> bool {
        self.compare.matches(item_hour, self.hour)
    }
}

/// Status selector for a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    /// Every status except `trash` and `auto-draft`.
    Any,
}

impl StatusFilter {
    pub fn accepts(&self, status: ItemStatus) -> bool {
        match self {
            StatusFilter::Any => !matches!(status, ItemStatus::Trash | ItemStatus::AutoDraft),
        }
    }
}

/// Query for content items matching a tag and category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterQuery {
    pub content_types: Vec<String>,
    pub status: StatusFilter,
    pub hour_clauses: Vec<HourClause>,
    pub tag: String,
    pub category: String,
    pub page_size: u32,
}

impl FilterQuery {
    /// The listing query: posts and pages of any status published between
    /// 09:00 and 17:59, with the given tag and category.
    pub fn filtered_listing(tag: &str, category: &str, page_size: u32) -> Self {
        Self {
            content_types: FILTERED_CONTENT_TYPES
                .iter()
                .map(|t| (*t).to_string())
                .collect(),
            status: StatusFilter::Any,
            hour_clauses: vec![
                HourClause::new(9, Compare::GreaterOrEqual),
                HourClause::new(17, Compare::LessOrEqual),
            ],
            tag: tag.to_string(),
            category: category.to_string(),
            page_size,
        }
    }
}

/// Outcome of a query as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Total matches before paging.
    pub found_count: u64,
    /// The requested page of items.
    pub items: Vec<ContentItem>,
    /// Set when the host reports the query itself as failed.
    #[serde(default)]
    pub is_error: bool,
}

impl QueryResult {
    pub fn found(found_count: u64, items: Vec<ContentItem>) -> Self {
        Self {
            found_count,
            items,
            is_error: false,
        }
    }

    pub fn error() -> Self {
        Self {
            is_error: true,
            ..Self::default()
        }
    }

    /// Whether the result is usable: something matched and no error was flagged.
    pub fn has_results(&self) -> bool {
        self.found_count > 0 && !self.is_error
    }
}
