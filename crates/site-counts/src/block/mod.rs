//! Dynamic block plumbing: attributes, block instances and the registry the
//! host's rendering pipeline dispatches through.

pub mod filtered;
pub mod manifest;
pub mod site_counts;

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::BlockError;
use crate::host::{CurrentContext, ItemId};
use crate::markup::{is_blank, sanitize_html_class};

pub use filtered::{FilterSettings, FilteredListProvider};
pub use manifest::BlockManifest;
pub use site_counts::SiteCountsBlock;

/// Attributes saved with a block instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAttributes {
    /// Extra CSS class entered in the editor.
    #[serde(
        rename = "className",
        default,
        deserialize_with = "coerce_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub class_name: Option<String>,
}

impl BlockAttributes {
    pub fn with_class_name(class_name: impl Into<String>) -> Self {
        Self {
            class_name: Some(class_name.into()),
        }
    }

    /// Read attributes from the raw JSON the host passes in.
    ///
    /// Anything that is not an attribute object yields empty attributes.
    pub fn from_json(raw: &Value) -> Self {
        serde_json::from_value(raw.clone()).unwrap_or_default()
    }

    /// The class name reduced to a single safe token, if one remains.
    pub fn sanitized_class(&self) -> Option<String> {
        self.class_name
            .as_deref()
            .filter(|c| !is_blank(c))
            .and_then(sanitize_html_class)
    }
}

/// Accept strings, numbers and `true` as text; everything else is absent.
fn coerce_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(true)) => Some("1".to_string()),
        _ => None,
    })
}

/// A block occurrence being rendered, with the context the host provides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockInstance {
    pub name: String,

    #[serde(default)]
    pub context: serde_json::Map<String, Value>,
}

impl BlockInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            context: serde_json::Map::new(),
        }
    }

    /// Attach the id of the item the block is displayed on.
    pub fn with_post_id(mut self, id: ItemId) -> Self {
        self.context.insert("postId".into(), Value::from(id));
        self
    }
}

impl CurrentContext for BlockInstance {
    fn current_item_id(&self) -> Option<ItemId> {
        match self.context.get("postId")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// A block type the host can render server-side.
pub trait BlockType: Send + Sync {
    /// Registered block name (`namespace/name`).
    fn name(&self) -> &str;

    /// Produce the block's HTML.
    fn render_callback(
        &self,
        attributes: &BlockAttributes,
        content: &str,
        block: &BlockInstance,
    ) -> String;
}

/// Registry of server-rendered block types, keyed by block name.
#[derive(Clone, Default)]
pub struct BlockRegistry {
    blocks: Arc<DashMap<String, Arc<dyn BlockType>>>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a block type, replacing any previous one with the same name.
    pub fn register(&self, block: Arc<dyn BlockType>) {
        let name = block.name().to_string();
        info!(block = %name, "registering block type");
        self.blocks.insert(name, block);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn BlockType>> {
        self.blocks.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Render a block by name from the host's raw attribute JSON.
    pub fn render(
        &self,
        name: &str,
        raw_attributes: &Value,
        content: &str,
        block: &BlockInstance,
    ) -> Result<String, BlockError> {
        let block_type = self.get(name).ok_or_else(|| BlockError::UnknownBlock {
            name: name.to_string(),
        })?;
        let attributes = BlockAttributes::from_json(raw_attributes);
        Ok(block_type.render_callback(&attributes, content, block))
    }

    /// Registered block names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.blocks.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl std::fmt::Debug for BlockRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockRegistry")
            .field("blocks", &self.names())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoBlock;

    impl BlockType for EchoBlock {
        fn name(&self) -> &str {
            "test/echo"
        }

        fn render_callback(
            &self,
            attributes: &BlockAttributes,
            content: &str,
            block: &BlockInstance,
        ) -> String {
            format!(
                "{}|{content}|{:?}",
                attributes.class_name.clone().unwrap_or_default(),
                block.current_item_id()
            )
        }
    }

    #[test]
    fn attributes_accept_string_class_name() {
        let attrs = BlockAttributes::from_json(&json!({"className": "wide"}));
        assert_eq!(attrs.class_name.as_deref(), Some("wide"));
        assert_eq!(attrs.sanitized_class().as_deref(), Some("wide"));
    }

    #[test]
    fn attributes_coerce_scalar_class_name() {
        let attrs = BlockAttributes::from_json(&json!({"className": 42}));
        assert_eq!(attrs.class_name.as_deref(), Some("42"));
        let attrs = BlockAttributes::from_json(&json!({"className": true}));
        assert_eq!(attrs.class_name.as_deref(), Some("1"));
    }

    #[test]
    fn attributes_drop_non_scalar_class_name() {
        let attrs = BlockAttributes::from_json(&json!({"className": ["a", "b"]}));
        assert_eq!(attrs.class_name, None);
        let attrs = BlockAttributes::from_json(&json!({"className": false}));
        assert_eq!(attrs.class_name, None);
    }

    #[test]
    fn attributes_tolerate_non_object_input() {
        assert_eq!(
            BlockAttributes::from_json(&json!("nonsense")),
            BlockAttributes::default()
        );
        assert_eq!(
            BlockAttributes::from_json(&json!({"align": "wide"})),
            BlockAttributes::default()
        );
    }

    #[test]
    fn blank_class_names_are_ignored() {
        assert_eq!(BlockAttributes::with_class_name("").sanitized_class(), None);
        assert_eq!(BlockAttributes::with_class_name("0").sanitized_class(), None);
        assert_eq!(BlockAttributes::with_class_name("%%").sanitized_class(), None);
    }

    #[test]
    fn instance_reads_post_id_context() {
        assert_eq!(BlockInstance::new("x").current_item_id(), None);
        assert_eq!(
            BlockInstance::new("x").with_post_id(7).current_item_id(),
            Some(7)
        );

        let mut instance = BlockInstance::new("x");
        instance.context.insert("postId".into(), json!(" 12 "));
        assert_eq!(instance.current_item_id(), Some(12));
    }

    #[test]
    fn registry_dispatches_by_name() {
        let registry = BlockRegistry::new();
        registry.register(Arc::new(EchoBlock));
        assert_eq!(registry.names(), vec!["test/echo"]);

        let html = registry
            .render(
                "test/echo",
                &json!({"className": "c"}),
                "inner",
                &BlockInstance::new("test/echo").with_post_id(3),
            )
            .unwrap();
        assert_eq!(html, "c|inner|Some(3)");
    }

    #[test]
    fn registry_rejects_unknown_block() {
        let registry = BlockRegistry::new();
        let err = registry
            .render("missing/block", &json!({}), "", &BlockInstance::default())
            .unwrap_err();
        assert!(matches!(err, BlockError::UnknownBlock { name } if name == "missing/block"));
    }

    #[test]
    fn registry_replaces_same_name() {
        let registry = BlockRegistry::new();
        registry.register(Arc::new(EchoBlock));
        registry.register(Arc::new(EchoBlock));
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }
}
