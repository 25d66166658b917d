//! Parallel ranged fetch engine.
//!
//! Splits a download plan into ordered batches, runs each batch's range GETs
//! concurrently through one curl multi handle, and hands every fully joined
//! batch to the sequential writer in plan order. Concurrency and buffered
//! response memory are both capped by the batch size.

mod handler;
mod run;

use anyhow::Result;
use std::time::Duration;
use thiserror::Error;

use crate::auth::{CachedTokenProvider, TokenProvider};
use crate::planner::{ChunkRange, DEFAULT_BATCH_SIZE};
use crate::request::RequestConfig;
use crate::retry::{classify_curl_error, classify_http_status, ErrorKind, RetryPolicy};
use crate::writer::FeedWriter;

use handler::ChunkHandler;

/// Failure of a single range fetch, classified before retry decisions.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("{0}")]
    Curl(curl::Error),
    #[error("HTTP {0}")]
    Http(u32),
    /// 2xx response that is not 206: the server ignored the range header.
    #[error("expected 206 Partial Content, got HTTP {0}")]
    InvalidRangeResponse(u32),
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
    /// The body carried an API error document instead of resource bytes.
    #[error("API error payload in chunk body")]
    ErrorPayload,
}

/// Classify a chunk error into a retry error kind.
pub fn classify_chunk(e: &ChunkError) -> ErrorKind {
    match e {
        ChunkError::Curl(ce) => classify_curl_error(ce),
        ChunkError::Http(code) => classify_http_status(*code),
        // A truncated body usually means the server closed early; retryable.
        ChunkError::PartialTransfer { .. } => ErrorKind::Connection,
        ChunkError::InvalidRangeResponse(_) | ChunkError::ErrorPayload => ErrorKind::Other,
    }
}

/// Tuning for one download: batch sizing, deadline, and retry policy.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// Number of ranges fetched concurrently per batch.
    pub batch_size: usize,
    /// Wall-clock bound for one batch, retries included.
    pub batch_deadline: Duration,
    /// Backoff policy for retryable chunk failures.
    pub retry: RetryPolicy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_deadline: Duration::from_secs(600),
            retry: RetryPolicy::default(),
        }
    }
}

/// Evaluate one completed transfer: status, payload shape, and body length.
fn chunk_body(
    code: u32,
    range: &ChunkRange,
    handler: &mut ChunkHandler,
) -> Result<Vec<u8>, ChunkError> {
    if !(200..300).contains(&code) {
        return Err(ChunkError::Http(code));
    }
    if code != 206 {
        return Err(ChunkError::InvalidRangeResponse(code));
    }
    let body = handler.take_body();
    if looks_like_error_payload(&body) {
        return Err(ChunkError::ErrorPayload);
    }
    let expected = range.len();
    let received = body.len() as u64;
    if received != expected {
        return Err(ChunkError::PartialTransfer { expected, received });
    }
    Ok(body)
}

/// True when a 2xx body is an API error document rather than resource bytes.
/// Gzip chunks start with magic bytes, never `{`, so this cannot false-match
/// real feed content.
pub fn looks_like_error_payload(body: &[u8]) -> bool {
    let trimmed = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map(|i| &body[i..])
        .unwrap_or(&[]);
    trimmed.starts_with(b"{") && memfind(trimmed, b"\"errors\"")
}

fn memfind(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Fetches one batch of ranges and returns `(range, body)` pairs in batch
/// order. Exposed for callers that manage their own writing.
pub fn fetch_batch(
    url: &str,
    config: &RequestConfig,
    batch: &[ChunkRange],
    opts: &FetchOptions,
) -> Result<Vec<(ChunkRange, Vec<u8>)>> {
    let bodies = run::run_batch(url, config, batch, opts)?;
    Ok(batch.iter().copied().zip(bodies).collect())
}

/// Downloads the whole plan: batches fetched concurrently, appended in plan
/// order through `writer`. Returns the number of bytes written.
///
/// The bearer token is taken from the cached provider once per batch, so a
/// token that expires mid-download is replaced at the next batch boundary.
pub fn download_plan<P: TokenProvider>(
    url: &str,
    tokens: &CachedTokenProvider<P>,
    marketplace_id: Option<&str>,
    plan: &[ChunkRange],
    writer: &mut FeedWriter,
    opts: &FetchOptions,
) -> Result<u64> {
    let batch_size = opts.batch_size.max(1);
    let batch_count = plan.len().div_ceil(batch_size);
    let mut written = 0u64;
    for (i, batch) in plan.chunks(batch_size).enumerate() {
        let mut config = RequestConfig::new(tokens.token()?);
        if let Some(id) = marketplace_id {
            config = config.with_marketplace(id);
        }
        let bodies = run::run_batch(url, &config, batch, opts)?;
        written += writer.append_batch(&bodies)?;
        tracing::debug!(
            batch = i + 1,
            of = batch_count,
            ranges = batch.len(),
            bytes = written,
            "batch joined and appended"
        );
    }
    Ok(written)
}
