//! Feed API client: metadata endpoints and the ranged file download.
//!
//! Every call assembles a fresh immutable `RequestConfig` from the cached
//! token provider; nothing client-wide is mutated between requests. Required
//! identifiers are validated before any network traffic.

mod http;

use anyhow::{Context, Result};
use std::path::Path;
use url::Url;

use crate::auth::{CachedTokenProvider, TokenProvider};
use crate::config::FeedConfig;
use crate::error::ProtocolError;
use crate::fetcher::{self, looks_like_error_payload, FetchOptions};
use crate::planner::plan_ranges;
use crate::probe;
use crate::request::RequestConfig;
use crate::validate;
use crate::writer::FeedWriter;

/// Client over one feed API base URL and one token source.
pub struct FeedClient<P> {
    base_url: String,
    chunk_size: u64,
    options: FetchOptions,
    tokens: CachedTokenProvider<P>,
}

impl<P: TokenProvider> FeedClient<P> {
    pub fn new(cfg: &FeedConfig, provider: P) -> Self {
        Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            chunk_size: cfg.chunk_size,
            options: cfg.fetch_options(),
            tokens: CachedTokenProvider::new(provider),
        }
    }

    fn request_config(&self, marketplace_id: Option<&str>) -> Result<RequestConfig> {
        let mut config = RequestConfig::new(self.tokens.token()?);
        if let Some(id) = marketplace_id {
            config = config.with_marketplace(id);
        }
        Ok(config)
    }

    /// GET returning the JSON body as a string, after status and
    /// error-payload validation.
    fn get_json(&self, url: &str, marketplace_id: Option<&str>) -> Result<String> {
        let config = self.request_config(marketplace_id)?;
        let resp = http::http_get(url, &config)?;
        if !(200..300).contains(&resp.status) {
            return Err(ProtocolError::Status(resp.status, url.to_string()).into());
        }
        if looks_like_error_payload(&resp.body) {
            tracing::warn!(url, "API response carries an error payload");
            return Err(ProtocolError::ErrorPayload.into());
        }
        String::from_utf8(resp.body).context("response body is not UTF-8")
    }

    /// Metadata for one feed type, including its schema definitions.
    pub fn get_feed_type(&self, feed_type: &str, marketplace_id: &str) -> Result<String> {
        validate::require("feedType", feed_type)?;
        validate::require("marketplaceId", marketplace_id)?;
        let url = format!("{}/feed_type/{}", self.base_url, feed_type);
        self.get_json(&url, Some(marketplace_id))
    }

    /// All feed types available to the caller.
    pub fn get_feed_types(&self, marketplace_id: Option<&str>) -> Result<String> {
        let url = format!("{}/feed_type", self.base_url);
        self.get_json(&url, marketplace_id)
    }

    /// Access information for the current application.
    pub fn get_access(&self) -> Result<String> {
        let url = format!("{}/access", self.base_url);
        self.get_json(&url, None)
    }

    /// Files listing for a feed type and category; first entry is latest.
    pub fn get_files(
        &self,
        feed_type: &str,
        category_id: &str,
        marketplace_id: &str,
    ) -> Result<String> {
        validate::require("feedType", feed_type)?;
        validate::require("categoryId", category_id)?;
        validate::require("marketplaceId", marketplace_id)?;
        let url = self.files_url(feed_type, category_id)?;
        self.get_json(url.as_str(), Some(marketplace_id))
    }

    /// Metadata for one file.
    pub fn get_file_metadata(&self, file_id: &str, marketplace_id: &str) -> Result<String> {
        validate::require("fileId", file_id)?;
        validate::require("marketplaceId", marketplace_id)?;
        let url = format!("{}/file/{}", self.base_url, file_id);
        self.get_json(&url, Some(marketplace_id))
    }

    /// Download endpoint for a file.
    pub fn download_url(&self, file_id: &str) -> String {
        format!("{}/file/{}/download", self.base_url, file_id)
    }

    /// Total size in bytes of a file, via the range probe.
    pub fn probe_file_size(&self, file_id: &str, marketplace_id: &str) -> Result<u64> {
        validate::require("fileId", file_id)?;
        validate::require("marketplaceId", marketplace_id)?;
        let config = self.request_config(Some(marketplace_id))?;
        probe::probe_total_size(&self.download_url(file_id), &config)
    }

    /// Downloads the file to `out_path`, byte-identical to the remote
    /// resource: probe, plan, batched parallel fetch, ordered append.
    /// Returns the number of bytes written.
    pub fn download_file(
        &self,
        file_id: &str,
        marketplace_id: &str,
        out_path: &Path,
    ) -> Result<u64> {
        validate::require("fileId", file_id)?;
        validate::require("marketplaceId", marketplace_id)?;
        let url = self.download_url(file_id);
        let total = {
            let config = self.request_config(Some(marketplace_id))?;
            probe::probe_total_size(&url, &config)?
        };
        let plan = plan_ranges(total, self.chunk_size);
        tracing::info!(file_id, total, ranges = plan.len(), "starting ranged download");
        let mut writer = FeedWriter::create(out_path)?;
        let written = fetcher::download_plan(
            &url,
            &self.tokens,
            Some(marketplace_id),
            &plan,
            &mut writer,
            &self.options,
        )?;
        writer.sync()?;
        writer.finalize()?;
        tracing::info!(file_id, written, out = %out_path.display(), "download complete");
        Ok(written)
    }

    fn files_url(&self, feed_type: &str, category_id: &str) -> Result<Url> {
        Url::parse_with_params(
            &format!("{}/file", self.base_url),
            &[("feed_type_id", feed_type), ("category_ids", category_id)],
        )
        .context("build files listing URL")
    }
}
