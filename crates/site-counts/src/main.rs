//! Site Counts command-line renderer.
//!
//! Renders the block against a YAML site fixture, using the same services a
//! host would inject.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use site_counts::block::BlockType;
use site_counts::host::ContentTypeDirectory;
use site_counts::host::memory::InMemorySite;
use site_counts::{BlockInstance, BlockRegistry, Config, HostServices, Plugin};

#[derive(Debug, Parser)]
#[command(name = "site-counts", about = "Render the Site Counts block against a site fixture")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render the block HTML.
    Render {
        /// YAML site fixture.
        #[arg(long)]
        site: PathBuf,

        /// Directory containing block.json.
        #[arg(long, default_value = env!("CARGO_MANIFEST_DIR"))]
        plugin_dir: PathBuf,

        /// Value of the block's className attribute.
        #[arg(long)]
        class_name: Option<String>,

        /// Id of the item the block is displayed on.
        #[arg(long)]
        current_id: Option<u64>,

        /// Render this many times, sharing one cache.
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },

    /// Print published counts per public content type.
    Types {
        /// YAML site fixture.
        #[arg(long)]
        site: PathBuf,
    },
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    match cli.command {
        Command::Render {
            site,
            plugin_dir,
            class_name,
            current_id,
            repeat,
        } => {
            let site = Arc::new(InMemorySite::load(&site)?);
            let services = HostServices {
                directory: site.clone(),
                query: site,
                cache: config.build_cache()?,
            };
            info!(backend = ?config.cache_backend, "cache backend ready");

            let registry = BlockRegistry::new();
            let plugin = Plugin::new(plugin_dir, services, config.filter_settings());
            let block = plugin.init(&registry).context("failed to register block")?;

            let attributes = match class_name {
                Some(class_name) => serde_json::json!({ "className": class_name }),
                None => serde_json::json!({}),
            };
            let mut instance = BlockInstance::new(block.name());
            if let Some(id) = current_id {
                instance = instance.with_post_id(id);
            }

            for _ in 0..repeat.max(1) {
                let html = registry.render(&instance.name, &attributes, "", &instance)?;
                println!("{html}");
            }
        }
        Command::Types { site } => {
            let site = InMemorySite::load(&site)?;
            for t in site.describe_public_types() {
                println!("{}\t{}\t{}", t.slug, t.display_label, t.published_count);
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
