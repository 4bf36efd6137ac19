//! Plugin entry point: wires host services into the block and registers it.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::block::{BlockManifest, BlockRegistry, FilterSettings, SiteCountsBlock};
use crate::error::BlockError;
use crate::host::HostServices;

/// The Site Counts plugin.
#[derive(Debug, Clone)]
pub struct Plugin {
    dir: PathBuf,
    services: HostServices,
    settings: FilterSettings,
}

impl Plugin {
    /// `dir` is the plugin directory holding `block.json`.
    pub fn new(dir: impl Into<PathBuf>, services: HostServices, settings: FilterSettings) -> Self {
        Self {
            dir: dir.into(),
            services,
            settings,
        }
    }

    /// Register the block described by the plugin's manifest.
    pub fn init(&self, registry: &BlockRegistry) -> Result<Arc<SiteCountsBlock>, BlockError> {
        let manifest = BlockManifest::load(&self.dir)?;
        let block = Arc::new(
            SiteCountsBlock::new(&self.services, &self.settings).with_name(manifest.name.clone()),
        );
        registry.register(block.clone());

        info!(
            block = %manifest.name,
            title = %manifest.title,
            attributes = manifest.attributes.len(),
            "site counts block registered"
        );
        Ok(block)
    }
}
