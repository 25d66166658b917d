//! Blocking HTTP GET with per-request headers, used by the metadata
//! endpoints. Chunk downloads go through the fetcher's multi loop instead.

use anyhow::{Context, Result};
use std::time::Duration;

use crate::request::RequestConfig;

pub(super) struct HttpResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

/// Performs one GET and returns status plus the full body. Runs in the
/// current thread; call from `spawn_blocking` in async code.
pub(super) fn http_get(url: &str, config: &RequestConfig) -> Result<HttpResponse> {
    let mut body = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.connect_timeout(Duration::from_secs(15))?;
    easy.timeout(Duration::from_secs(60))?;
    easy.http_headers(config.header_list()?)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform().with_context(|| format!("GET {url}"))?;
    }

    let status = easy.response_code().context("no response code")?;
    Ok(HttpResponse { status, body })
}
