//! Metadata commands: list feed types and available files.

use anyhow::Result;
use feedpull_core::config::FeedConfig;

use super::feed_client;

/// Print the feed types available to the application.
pub async fn run_feed_types(cfg: &FeedConfig, marketplace: Option<String>) -> Result<()> {
    let cfg = cfg.clone();
    let body = tokio::task::spawn_blocking(move || {
        feed_client(&cfg).get_feed_types(marketplace.as_deref())
    })
    .await??;
    println!("{body}");
    Ok(())
}

/// Print the files listing for a feed type and category.
pub async fn run_files(
    cfg: &FeedConfig,
    feed_type: String,
    category: String,
    marketplace: String,
) -> Result<()> {
    let cfg = cfg.clone();
    let body = tokio::task::spawn_blocking(move || {
        feed_client(&cfg).get_files(&feed_type, &category, &marketplace)
    })
    .await??;
    println!("{body}");
    Ok(())
}
