//! CLI for the feedpull feed downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use feedpull_core::config::{self, FeedConfig};
use std::path::PathBuf;

use commands::{
    run_checksum, run_download, run_feed_types, run_files, run_filter_item, run_filter_items,
    run_filter_seller,
};

/// Top-level CLI for the feedpull feed downloader.
#[derive(Debug, Parser)]
#[command(name = "feedpull")]
#[command(about = "feedpull: parallel ranged downloads and record filtering for marketplace feeds", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// List the feed types available to the application.
    FeedTypes {
        /// Marketplace ID (e.g. EBAY_US); defaults to the configured one.
        #[arg(long)]
        marketplace: Option<String>,
    },

    /// List available files for a feed type and category.
    Files {
        /// Feed type identifier (e.g. CURATED_ITEM_FEED).
        #[arg(long)]
        feed_type: String,
        /// Category ID the feed is scoped to.
        #[arg(long)]
        category: String,
        #[arg(long)]
        marketplace: Option<String>,
    },

    /// Download the latest feed file for a feed type and category.
    Download {
        #[arg(long)]
        feed_type: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        marketplace: Option<String>,
        /// Output path for the gzip archive.
        #[arg(long, short = 'o', default_value = "feed.gz")]
        output: PathBuf,
    },

    /// Download the latest feed file and find one item in it.
    FilterItem {
        #[arg(long)]
        feed_type: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        marketplace: Option<String>,
        /// Item ID to search for.
        #[arg(long)]
        item_id: String,
        /// Working directory for the archive, records, and filtered output.
        #[arg(long, default_value = ".")]
        work_dir: PathBuf,
    },

    /// Download the latest feed file and find every record matching a set
    /// of item IDs.
    FilterItems {
        #[arg(long)]
        feed_type: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        marketplace: Option<String>,
        /// Item ID to search for; repeat the flag for each ID.
        #[arg(long = "item-id", required = true)]
        item_ids: Vec<String>,
        #[arg(long, default_value = ".")]
        work_dir: PathBuf,
    },

    /// Download the latest feed file and collect every record of one seller.
    FilterSeller {
        #[arg(long)]
        feed_type: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        marketplace: Option<String>,
        /// Seller username to search for.
        #[arg(long)]
        seller: String,
        #[arg(long, default_value = ".")]
        work_dir: PathBuf,
    },

    /// Compute SHA-256 of a file (e.g. after download).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },
}

/// Marketplace from the flag, falling back to the configured default.
fn resolve_marketplace(cfg: &FeedConfig, flag: Option<String>) -> Result<String> {
    flag.or_else(|| cfg.marketplace.clone()).ok_or_else(|| {
        anyhow::anyhow!("no marketplace given; pass --marketplace or set it in config.toml")
    })
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::FeedTypes { marketplace } => {
                let marketplace = marketplace.or_else(|| cfg.marketplace.clone());
                run_feed_types(&cfg, marketplace).await?;
            }
            CliCommand::Files {
                feed_type,
                category,
                marketplace,
            } => {
                let marketplace = resolve_marketplace(&cfg, marketplace)?;
                run_files(&cfg, feed_type, category, marketplace).await?;
            }
            CliCommand::Download {
                feed_type,
                category,
                marketplace,
                output,
            } => {
                let marketplace = resolve_marketplace(&cfg, marketplace)?;
                run_download(&cfg, feed_type, category, marketplace, output).await?;
            }
            CliCommand::FilterItem {
                feed_type,
                category,
                marketplace,
                item_id,
                work_dir,
            } => {
                let marketplace = resolve_marketplace(&cfg, marketplace)?;
                run_filter_item(&cfg, feed_type, category, marketplace, item_id, work_dir).await?;
            }
            CliCommand::FilterItems {
                feed_type,
                category,
                marketplace,
                item_ids,
                work_dir,
            } => {
                let marketplace = resolve_marketplace(&cfg, marketplace)?;
                run_filter_items(&cfg, feed_type, category, marketplace, item_ids, work_dir)
                    .await?;
            }
            CliCommand::FilterSeller {
                feed_type,
                category,
                marketplace,
                seller,
                work_dir,
            } => {
                let marketplace = resolve_marketplace(&cfg, marketplace)?;
                run_filter_seller(&cfg, feed_type, category, marketplace, seller, work_dir)
                    .await?;
            }
            CliCommand::Checksum { path } => run_checksum(&path).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
