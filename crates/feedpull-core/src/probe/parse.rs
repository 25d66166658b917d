//! Parse the total size out of a Content-Range header value.

use crate::error::ProtocolError;

/// Extracts `<total>` from a `Content-Range` value.
///
/// Accepts both the standard form `bytes <start>-<end>/<total>` and the bare
/// `<start>-<end>/<total>`. A `*` total (size unknown) or any non-numeric
/// total is a `ProtocolError`.
pub fn parse_content_range_total(value: &str) -> Result<u64, ProtocolError> {
    let malformed = || ProtocolError::MalformedContentRange(value.to_string());
    let (_, total) = value.rsplit_once('/').ok_or_else(malformed)?;
    total.trim().parse::<u64>().map_err(|_| malformed())
}
