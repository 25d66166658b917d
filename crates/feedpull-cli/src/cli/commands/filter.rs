//! Filter commands: download the latest feed file, decompress it, and
//! filter the records by item ID(s) or seller.

use anyhow::{Context, Result};
use feedpull_core::config::FeedConfig;
use feedpull_core::filter::ScanSummary;
use feedpull_core::ops::FilterPaths;
use std::path::PathBuf;

use super::feed_client;

fn prepare_paths(work_dir: &PathBuf) -> Result<FilterPaths> {
    std::fs::create_dir_all(work_dir)
        .with_context(|| format!("create work dir {}", work_dir.display()))?;
    Ok(FilterPaths::in_dir(work_dir))
}

fn print_summary(summary: &ScanSummary, paths: &FilterPaths) {
    println!(
        "{} matching records appended to {}",
        summary.matches,
        paths.filtered.display()
    );
    if summary.short_lines > 0 {
        println!("Skipped {} records with too few fields", summary.short_lines);
    }
}

pub async fn run_filter_item(
    cfg: &FeedConfig,
    feed_type: String,
    category: String,
    marketplace: String,
    item_id: String,
    work_dir: PathBuf,
) -> Result<()> {
    let paths = prepare_paths(&work_dir)?;
    let cfg = cfg.clone();
    let task_paths = paths.clone();
    let id = item_id.clone();
    let found = tokio::task::spawn_blocking(move || {
        feed_client(&cfg).filter_by_item(&feed_type, &category, &marketplace, &id, &task_paths)
    })
    .await??;
    if found {
        println!("Found {} in feed; appended to {}", item_id, paths.filtered.display());
    } else {
        println!("Item {item_id} not found in feed");
    }
    Ok(())
}

pub async fn run_filter_items(
    cfg: &FeedConfig,
    feed_type: String,
    category: String,
    marketplace: String,
    item_ids: Vec<String>,
    work_dir: PathBuf,
) -> Result<()> {
    let paths = prepare_paths(&work_dir)?;
    let cfg = cfg.clone();
    let task_paths = paths.clone();
    let summary = tokio::task::spawn_blocking(move || {
        feed_client(&cfg).filter_by_items(
            &feed_type,
            &category,
            &marketplace,
            &item_ids,
            &task_paths,
        )
    })
    .await??;
    print_summary(&summary, &paths);
    Ok(())
}

pub async fn run_filter_seller(
    cfg: &FeedConfig,
    feed_type: String,
    category: String,
    marketplace: String,
    seller: String,
    work_dir: PathBuf,
) -> Result<()> {
    let paths = prepare_paths(&work_dir)?;
    let cfg = cfg.clone();
    let task_paths = paths.clone();
    let summary = tokio::task::spawn_blocking(move || {
        feed_client(&cfg).filter_by_seller(
            &feed_type,
            &category,
            &marketplace,
            &seller,
            &task_paths,
        )
    })
    .await??;
    print_summary(&summary, &paths);
    Ok(())
}
