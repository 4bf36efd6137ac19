//! Site Counts block.
//!
//! A server-rendered dashboard block that lists published counts per public
//! content type and a cached listing of items with a given tag and category.
//! All storage, querying and caching is delegated to host services.

pub mod block;
pub mod cache;
pub mod config;
pub mod error;
pub mod host;
pub mod markup;
pub mod plugin;
pub mod query;

pub use block::{BlockAttributes, BlockInstance, BlockRegistry, SiteCountsBlock};
pub use config::Config;
pub use error::{BlockError, HostError};
pub use host::HostServices;
pub use plugin::Plugin;
