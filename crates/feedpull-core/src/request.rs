//! Immutable per-request header configuration.
//!
//! Assembled fresh for every call instead of mutating client-wide header
//! state; the same config can be shared by all fetches in one batch because
//! nothing in it is mutable.

use crate::planner::ChunkRange;

/// Header carrying the marketplace identifier on every request.
pub const MARKETPLACE_HEADER: &str = "X-EBAY-C-MARKETPLACE-ID";

/// Headers attached to one HTTP GET: bearer token, optional marketplace,
/// Accept, and an optional byte range.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    bearer: String,
    marketplace_id: Option<String>,
    range: Option<String>,
}

impl RequestConfig {
    pub fn new(bearer: impl Into<String>) -> Self {
        Self {
            bearer: bearer.into(),
            marketplace_id: None,
            range: None,
        }
    }

    pub fn with_marketplace(mut self, id: impl Into<String>) -> Self {
        self.marketplace_id = Some(id.into());
        self
    }

    pub fn with_range(mut self, range: &ChunkRange) -> Self {
        self.range = Some(range.header_value());
        self
    }

    /// Probe range covering the first bytes of the resource (`bytes=0-100`).
    pub fn with_probe_range(mut self) -> Self {
        self.range = Some("bytes=0-100".to_string());
        self
    }

    pub fn marketplace_id(&self) -> Option<&str> {
        self.marketplace_id.as_deref()
    }

    /// Builds the curl header list for this request.
    pub fn header_list(&self) -> Result<curl::easy::List, curl::Error> {
        let mut list = curl::easy::List::new();
        list.append(&format!("authorization: Bearer {}", self.bearer))?;
        if let Some(id) = &self.marketplace_id {
            list.append(&format!("{}: {}", MARKETPLACE_HEADER, id.trim()))?;
        }
        list.append("Accept: application/json")?;
        if let Some(range) = &self.range {
            list.append(&format!("range: {range}"))?;
        }
        Ok(list)
    }
}
