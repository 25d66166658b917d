//! `feedpull download` – fetch the latest feed file for a feed type and
//! category via parallel range requests.

use anyhow::Result;
use feedpull_core::config::FeedConfig;
use std::path::PathBuf;

use super::feed_client;

pub async fn run_download(
    cfg: &FeedConfig,
    feed_type: String,
    category: String,
    marketplace: String,
    output: PathBuf,
) -> Result<()> {
    let cfg = cfg.clone();
    let out = output.clone();
    let file_id = tokio::task::spawn_blocking(move || {
        feed_client(&cfg).download_latest(&feed_type, &category, &marketplace, &out)
    })
    .await??;
    println!("Downloaded {} to {}", file_id, output.display());
    Ok(())
}
