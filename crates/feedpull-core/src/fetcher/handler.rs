//! Easy2 handler for one range transfer: validates 206 and Content-Range
//! before buffering, then accumulates the body in memory until the batch
//! joins. Bodies are never written to the output file from here; the
//! sequential writer owns that.

use std::str;

use crate::planner::ChunkRange;

/// Upper bound on the body buffer reserved up front.
const BODY_PREALLOC_CAP: u64 = 32 * 1024 * 1024;

/// Handler state for one in-flight range. Implements curl's `Handler`.
pub(super) struct ChunkHandler {
    range: ChunkRange,
    response_headers: Vec<String>,
    /// None = not yet checked; Some(true) = 206 + matching Content-Range;
    /// Some(false) = abort the transfer without buffering.
    range_ok: Option<bool>,
    body: Vec<u8>,
}

impl ChunkHandler {
    pub(super) fn new(range: ChunkRange) -> Self {
        Self {
            range,
            response_headers: Vec::new(),
            range_ok: None,
            body: Vec::with_capacity(range.len().min(BODY_PREALLOC_CAP) as usize),
        }
    }

    /// Takes the buffered body, leaving the handler empty.
    pub(super) fn take_body(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.body)
    }
}

impl curl::easy::Handler for ChunkHandler {
    fn header(&mut self, data: &[u8]) -> bool {
        if let Ok(s) = str::from_utf8(data) {
            let line = s.trim_end();
            // A new status line means a redirect hop; earlier headers are stale.
            if line.starts_with("HTTP/") {
                self.response_headers.clear();
            }
            self.response_headers.push(line.to_string());
        }
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, curl::easy::WriteError> {
        if self.range_ok.is_none() {
            let status = parse_http_status(&self.response_headers);
            let bounds_ok = parse_content_range_bounds(&self.response_headers)
                .map(|(s, e)| s == self.range.start && e == self.range.end)
                .unwrap_or(false);
            self.range_ok = Some(status == Some(206) && bounds_ok);
        }
        if self.range_ok == Some(false) {
            // Returning a short count makes curl abort this transfer.
            return Ok(0);
        }
        self.body.extend_from_slice(data);
        Ok(data.len())
    }
}

/// Status code from the most recent `HTTP/..` line, if any.
pub(super) fn parse_http_status(lines: &[String]) -> Option<u32> {
    let status_line = lines.iter().rev().find(|l| l.starts_with("HTTP/"))?;
    status_line.split_whitespace().nth(1)?.parse().ok()
}

/// `(start, end)` bounds from a `Content-Range: bytes <start>-<end>/<total>` line.
pub(super) fn parse_content_range_bounds(lines: &[String]) -> Option<(u64, u64)> {
    let value = lines.iter().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("content-range")
            .then(|| value.trim())
    })?;
    let value = value.strip_prefix("bytes").unwrap_or(value).trim_start();
    let (bounds, _) = value.split_once('/')?;
    let (start, end) = bounds.split_once('-')?;
    Some((start.trim().parse().ok()?, end.trim().parse().ok()?))
}
