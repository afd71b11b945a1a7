//! colle CLI
//!
//! Runs ingestion, listings and maintenance against the configured store.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colle::{
    AppContext,
    error::{AppError, Result},
    models::{Config, DictionaryFile, Item, ItemId},
    pipeline::{self, Page, Paginator},
    services::{ExistenceIndex, ItemStore, StoreDictionary, TimeIndex},
};

/// colle - Feed ingestion and ranked retrieval
#[derive(Parser, Debug)]
#[command(name = "colle", version, about = "Feed ingestion and ranked retrieval")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "colle.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Use a process-local store instead of Redis
    #[arg(long)]
    memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch all configured channels and store new items
    Ingest,

    /// List the newest items
    Latest {
        #[arg(long, default_value = "")]
        category: String,

        #[arg(long)]
        page: Option<String>,
    },

    /// List the most-clicked items
    Ranked {
        #[arg(long, default_value = "")]
        category: String,

        #[arg(long)]
        page: Option<String>,
    },

    /// Record an outbound click on an item
    Click { id: u64 },

    /// Record an inbound view of an item
    View { id: u64 },

    /// Import dictionary entries from a TOML file
    DictImport { file: PathBuf },

    /// Remove index entries past retention
    Cleanup,

    /// Validate the configuration file
    Validate,

    /// Show store statistics
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, default_level: &str) {
    let level = if verbose { "debug" } else { default_level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[cfg(feature = "redis")]
async fn open_context(config: Config, memory: bool) -> Result<AppContext> {
    if memory {
        log::info!("Using in-memory store");
        return Ok(AppContext::in_memory(config));
    }
    AppContext::connect(config).await
}

#[cfg(not(feature = "redis"))]
async fn open_context(config: Config, memory: bool) -> Result<AppContext> {
    if !memory {
        return Err(AppError::config(
            "built without the redis feature; pass --memory",
        ));
    }
    log::info!("Using in-memory store");
    Ok(AppContext::in_memory(config))
}

fn print_items(items: &[Item]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(items)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = Config::load(&cli.config);
    let level = loaded
        .as_ref()
        .map_or("info", |config| config.logging.level.as_str());
    init_logging(cli.verbose, level);

    let config = loaded.inspect_err(|e| {
        log::error!("Cannot load config from {}: {}", cli.config.display(), e);
    })?;
    log::debug!("Loaded configuration from {}", cli.config.display());

    if let Command::Validate = cli.command {
        log::info!("Validating configuration...");
        if let Err(e) = config.validate() {
            log::error!("Config validation failed: {}", e);
            return Err(e);
        }
        log::info!(
            "✓ Config OK ({} channels, {} categories)",
            config.feed.channels.len(),
            config.category_names().len()
        );
        return Ok(());
    }

    config.validate()?;
    let context = open_context(config, cli.memory).await?;

    match cli.command {
        Command::Ingest => {
            let report = pipeline::run_ingest(&context).await?;
            for channel in report.channels.iter().filter(|c| c.fetch_error.is_some()) {
                log::warn!(
                    "{}: {}",
                    channel.url,
                    channel.fetch_error.as_deref().unwrap_or_default()
                );
            }
            log::info!("Ingest complete: {} new items", report.stored());
        }

        Command::Latest { category, page } => {
            let page = Page::from_query(page.as_deref());
            let items = Paginator::new(&context).latest(page, &category).await;
            print_items(&items)?;
        }

        Command::Ranked { category, page } => {
            let page = Page::from_query(page.as_deref());
            let items = Paginator::new(&context).ranked(page, &category).await;
            print_items(&items)?;
        }

        Command::Click { id } => {
            let items = ItemStore::new(&context);
            if items.record_outbound_click(ItemId(id)).await? {
                log::info!("Recorded click on item {}", id);
            } else {
                log::warn!("Item {} does not exist", id);
            }
        }

        Command::View { id } => {
            let items = ItemStore::new(&context);
            if items.record_inbound_view(ItemId(id)).await? {
                log::info!("Recorded view of item {}", id);
            } else {
                log::warn!("Item {} does not exist", id);
            }
        }

        Command::DictImport { file } => {
            let dictionary = DictionaryFile::load(&file)?;
            if dictionary.entries.is_empty() {
                return Err(AppError::validation(format!(
                    "{} contains no entries",
                    file.display()
                )));
            }
            let written = StoreDictionary::new(&context)
                .import(&dictionary.entries)
                .await?;
            log::info!("Imported {} keywords from {}", written, file.display());
        }

        Command::Cleanup => {
            pipeline::run_cleanup(&context).await?;
        }

        Command::Info => {
            let links = ExistenceIndex::new(&context).cardinality().await?;
            let last_id = ItemStore::new(&context).last_id().await?;
            let indexed = TimeIndex::new(&context).len("").await?;
            log::info!("Known links: {}", links);
            log::info!("Last item id: {}", last_id);
            log::info!("Indexed items: {}", indexed);
            for category in context.config.category_names() {
                let count = TimeIndex::new(&context).len(&category).await?;
                log::info!("  {}: {}", category, count);
            }
        }

        Command::Validate => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use colle::storage::KvStore;

    #[tokio::test]
    async fn memory_flag_opens_in_memory_store() {
        let mut config = Config::default();
        config.site.item_days = 3;
        let context = open_context(config, true).await.unwrap();
        assert_eq!(context.config.site.item_days, 3);
        assert!(context.store.ping().await.is_ok());
    }

    #[cfg(not(feature = "redis"))]
    #[tokio::test]
    async fn redis_needs_the_feature() {
        let err = open_context(Config::default(), false).await.err().unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }
}
