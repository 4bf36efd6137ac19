//! Parser for the `block.json` metadata file.
//!
//! The manifest declares the block's registered name, its editor-facing
//! metadata and the attribute schema. Only the fields the server side needs
//! are read; everything else in the file is ignored.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::BlockError;

/// File name of the manifest inside a plugin directory.
pub const MANIFEST_FILE: &str = "block.json";

/// Block metadata parsed from `block.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockManifest {
    /// Registered name (`namespace/name`).
    pub name: String,

    pub title: String,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub api_version: Option<u32>,

    /// Attribute schema keyed by attribute name.
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeSchema>,
}

/// Schema for one block attribute.
#[derive(Debug, Clone, Deserialize)]
pub struct AttributeSchema {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub default: Option<Value>,
}

impl BlockManifest {
    /// Load `block.json` from a plugin directory.
    pub fn load(dir: &Path) -> Result<Self, BlockError> {
        let path = dir.join(MANIFEST_FILE);
        let raw = std::fs::read_to_string(&path).map_err(|_| BlockError::MissingManifest {
            path: path.display().to_string(),
        })?;
        Self::parse(&raw, &path.display().to_string())
    }

    /// Parse manifest JSON; `origin` is only used in error messages.
    pub fn parse(raw: &str, origin: &str) -> Result<Self, BlockError> {
        let manifest: Self =
            serde_json::from_str(raw).map_err(|e| BlockError::InvalidManifest {
                path: origin.to_string(),
                details: e.to_string(),
            })?;

        if !is_valid_block_name(&manifest.name) {
            return Err(BlockError::InvalidManifest {
                path: origin.to_string(),
                details: format!(
                    "block name '{}' must look like 'namespace/name'",
                    manifest.name
                ),
            });
        }

        Ok(manifest)
    }
}

/// Block names are `namespace/name`, lowercase alphanumerics and dashes.
fn is_valid_block_name(name: &str) -> bool {
    let valid_part = |part: &str| {
        !part.is_empty()
            && part.starts_with(|c: char| c.is_ascii_lowercase())
            && part
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    };
    match name.split_once('/') {
        Some((namespace, block)) => valid_part(namespace) && valid_part(block),
        None => false,
    }
}
