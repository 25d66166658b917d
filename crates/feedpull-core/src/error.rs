//! Typed errors shared across the crate.
//!
//! Each enum maps to one failure domain: credential acquisition, response
//! shape, request validation, and schema navigation. Transport-level chunk
//! failures live in `fetcher::ChunkError` where they are classified for retry.

use thiserror::Error;

/// Token acquisition failed or produced an unusable credential.
/// Fatal for the current operation; never retried.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token provider returned an empty credential")]
    EmptyToken,
    #[error("token provider returned a malformed credential: {0}")]
    MalformedToken(String),
    #[error("token acquisition failed: {0}")]
    Acquisition(String),
}

/// Response missing the expected headers or body shape.
/// Surfaced to the caller; the core does not retry these.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("response is missing the Content-Range header")]
    MissingContentRange,
    #[error("malformed Content-Range value: {0:?}")]
    MalformedContentRange(String),
    #[error("HTTP {0} from {1}")]
    Status(u32, String),
    #[error("API error payload in response body")]
    ErrorPayload,
    #[error("files listing has no entries")]
    NoFiles,
}

/// A required identifier was missing from the request.
/// Raised before any network call.
#[derive(Debug, Error)]
#[error("missing {0} in the request")]
pub struct ValidationError(pub &'static str);

/// Feed-type metadata could not be navigated down to an ordered field list,
/// or the requested field is not declared in it.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("feed type metadata is malformed: {0}")]
    BadMetadata(#[source] serde_json::Error),
    #[error("metadata has no supportedFeeds entry")]
    NoSupportedFeeds,
    #[error("feed entry has no supportedSchemas entry")]
    NoSupportedSchemas,
    #[error("schema entry has no definition document")]
    NoDefinition,
    #[error("schema definition is not a JSON object document: {0}")]
    BadDefinition(#[source] serde_json::Error),
    #[error("field {0:?} is not declared in the schema definition")]
    FieldNotFound(String),
}
