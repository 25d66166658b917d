//! High-level feed operations: pick the latest file, download and
//! decompress it, resolve the filter column from the feed schema, and run
//! the record filter. These compose the lower modules and carry the
//! request validation the pipelines need before touching the network.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::auth::TokenProvider;
use crate::client::FeedClient;
use crate::decompress;
use crate::error::ProtocolError;
use crate::filter::{self, ScanSummary};
use crate::schema::{FeedSchema, FileListDoc};
use crate::validate;

/// Schema field holding the item identifier.
pub const ITEM_ID_FIELD: &str = "itemId";
/// Schema field holding the seller username.
pub const SELLER_USERNAME_FIELD: &str = "sellerUsername";

/// Output paths of one download-and-filter pipeline.
#[derive(Debug, Clone)]
pub struct FilterPaths {
    /// Downloaded gzip archive.
    pub archive: PathBuf,
    /// Decompressed tab-separated record file.
    pub records: PathBuf,
    /// Append-only filtered output.
    pub filtered: PathBuf,
}

impl FilterPaths {
    /// Conventional file names inside one working directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            archive: dir.join("feed.gz"),
            records: dir.join("feed.tsv"),
            filtered: dir.join("filtered.tsv"),
        }
    }
}

impl<P: TokenProvider> FeedClient<P> {
    /// Downloads the latest file for a feed type and category to `out`.
    /// Returns the file id that was downloaded.
    pub fn download_latest(
        &self,
        feed_type: &str,
        category_id: &str,
        marketplace_id: &str,
        out: &Path,
    ) -> Result<String> {
        let files = self.get_files(feed_type, category_id, marketplace_id)?;
        let listing: FileListDoc =
            serde_json::from_str(&files).context("parse files listing")?;
        let latest = listing
            .file_metadata
            .first()
            .ok_or(ProtocolError::NoFiles)?;
        tracing::info!(file_id = %latest.file_id, size = ?latest.size, "latest file selected");
        let metadata = self.get_file_metadata(&latest.file_id, marketplace_id)?;
        tracing::debug!(%metadata, "file metadata");
        self.download_file(&latest.file_id, marketplace_id, out)?;
        Ok(latest.file_id.clone())
    }

    /// Column index of `field` in the feed's declared schema.
    pub fn resolve_field_index(
        &self,
        field: &str,
        feed_type: &str,
        marketplace_id: &str,
    ) -> Result<usize> {
        let metadata = self.get_feed_type(feed_type, marketplace_id)?;
        let schema = FeedSchema::from_feed_type_json(&metadata)?;
        let index = schema.field_index(field)?;
        tracing::debug!(field, index, "resolved schema column");
        Ok(index)
    }

    /// Finds one item in the latest feed file. Downloads and decompresses
    /// into `paths`, then appends the first matching record to
    /// `paths.filtered`. Returns whether the item was found.
    pub fn filter_by_item(
        &self,
        feed_type: &str,
        category_id: &str,
        marketplace_id: &str,
        item_id: &str,
        paths: &FilterPaths,
    ) -> Result<bool> {
        validate::require("searchText", item_id)?;
        self.fetch_and_extract(feed_type, category_id, marketplace_id, paths)?;
        let index = self.resolve_field_index(ITEM_ID_FIELD, feed_type, marketplace_id)?;
        let found = filter::find_first(&paths.records, index, item_id, &paths.filtered)?;
        tracing::info!(item_id, found, "item filter finished");
        Ok(found)
    }

    /// Finds every record matching any of `item_ids` in the latest feed file.
    pub fn filter_by_items(
        &self,
        feed_type: &str,
        category_id: &str,
        marketplace_id: &str,
        item_ids: &[String],
        paths: &FilterPaths,
    ) -> Result<ScanSummary> {
        validate::require_values("itemIds", item_ids)?;
        self.fetch_and_extract(feed_type, category_id, marketplace_id, paths)?;
        let index = self.resolve_field_index(ITEM_ID_FIELD, feed_type, marketplace_id)?;
        let summary = filter::find_many(&paths.records, index, item_ids, &paths.filtered)?;
        tracing::info!(matches = summary.matches, "item set filter finished");
        Ok(summary)
    }

    /// Finds every record of one seller in the latest feed file.
    pub fn filter_by_seller(
        &self,
        feed_type: &str,
        category_id: &str,
        marketplace_id: &str,
        seller_username: &str,
        paths: &FilterPaths,
    ) -> Result<ScanSummary> {
        validate::require("searchText", seller_username)?;
        self.fetch_and_extract(feed_type, category_id, marketplace_id, paths)?;
        let index =
            self.resolve_field_index(SELLER_USERNAME_FIELD, feed_type, marketplace_id)?;
        let summary = filter::find_all(&paths.records, index, seller_username, &paths.filtered)?;
        tracing::info!(
            seller_username,
            matches = summary.matches,
            "seller filter finished"
        );
        Ok(summary)
    }

    fn fetch_and_extract(
        &self,
        feed_type: &str,
        category_id: &str,
        marketplace_id: &str,
        paths: &FilterPaths,
    ) -> Result<()> {
        self.download_latest(feed_type, category_id, marketplace_id, &paths.archive)?;
        let bytes = decompress::gunzip(&paths.archive, &paths.records)?;
        tracing::info!(bytes, records = %paths.records.display(), "archive decompressed");
        Ok(())
    }
}
