//! Content-length discovery via a small range probe.
//!
//! Issues a GET for `bytes=0-100` and reads the total resource size out of
//! the `Content-Range` response header. The probed bytes are refetched by
//! the real download; that waste is O(1) against full-file cost.

mod parse;

pub use parse::parse_content_range_total;

use anyhow::{Context, Result};
use std::str;
use std::time::Duration;

use crate::error::ProtocolError;
use crate::request::RequestConfig;

/// Probes `url` and returns the total size in bytes of the resource.
///
/// Fails with `ProtocolError` when the response carries no parseable
/// `Content-Range` header, and with a transport error when the request
/// itself cannot be performed. Runs in the current thread; call from
/// `spawn_blocking` in async code.
pub fn probe_total_size(url: &str, config: &RequestConfig) -> Result<u64> {
    let config = config.clone().with_probe_range();
    let mut headers: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.connect_timeout(Duration::from_secs(15))?;
    easy.timeout(Duration::from_secs(30))?;
    easy.http_headers(config.header_list()?)?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                headers.push(s.trim_end().to_string());
            }
            true
        })?;
        // The probe body is the first 101 bytes of the resource; discard it.
        transfer.write_function(|data| Ok(data.len()))?;
        transfer.perform().context("range probe failed")?;
    }

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        return Err(ProtocolError::Status(code, url.to_string()).into());
    }

    let value = content_range_value(&headers).ok_or(ProtocolError::MissingContentRange)?;
    let total = parse_content_range_total(value)?;
    tracing::debug!(url, total, "probed resource size");
    Ok(total)
}

/// Finds the `Content-Range` value among collected header lines.
fn content_range_value(lines: &[String]) -> Option<&str> {
    lines.iter().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("content-range")
            .then(|| value.trim())
    })
}
