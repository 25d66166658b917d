//! Minimal typed structures for feed metadata documents.

use serde::Deserialize;

/// Feed-type metadata: the chain down to the schema definition document.
#[derive(Debug, Deserialize)]
pub struct FeedTypeDoc {
    #[serde(default, rename = "supportedFeeds")]
    pub supported_feeds: Vec<SupportedFeed>,
}

#[derive(Debug, Deserialize)]
pub struct SupportedFeed {
    #[serde(default, rename = "supportedSchemas")]
    pub supported_schemas: Vec<SupportedSchema>,
}

#[derive(Debug, Deserialize)]
pub struct SupportedSchema {
    /// Schema definition: a nested JSON object document encoded as a string,
    /// whose key order is the column order of the feed file.
    #[serde(default)]
    pub definition: Option<String>,
}

/// Files listing: ordered descriptors, first entry is the latest file.
#[derive(Debug, Deserialize)]
pub struct FileListDoc {
    #[serde(default, rename = "fileMetadata")]
    pub file_metadata: Vec<FileDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileDescriptor {
    #[serde(rename = "fileId")]
    pub file_id: String,
    #[serde(default)]
    pub size: Option<u64>,
}
