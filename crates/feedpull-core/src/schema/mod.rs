//! Schema-driven column resolution.
//!
//! Feed records are tab-separated with no header line; the only source of
//! column positions is the feed-type metadata, which embeds a schema
//! definition document (a JSON object encoded as a string) whose key order
//! declares the column order. `FeedSchema` materializes that ordered field
//! list once and resolves field names to positional indexes.

mod parse;

pub use parse::{FeedTypeDoc, FileDescriptor, FileListDoc, SupportedFeed, SupportedSchema};

use crate::error::SchemaError;

/// Ordered column layout of one feed type. Immutable after construction.
#[derive(Debug, Clone)]
pub struct FeedSchema {
    fields: Vec<String>,
}

impl FeedSchema {
    /// Builds the schema from a feed-type metadata document.
    ///
    /// Navigation: first supported feed, first supported schema, embedded
    /// definition document, declared field names in declaration order. Every
    /// missing link is its own `SchemaError` variant.
    pub fn from_feed_type_json(doc: &str) -> Result<Self, SchemaError> {
        let parsed: FeedTypeDoc =
            serde_json::from_str(doc).map_err(SchemaError::BadMetadata)?;
        let feed = parsed
            .supported_feeds
            .first()
            .ok_or(SchemaError::NoSupportedFeeds)?;
        let schema = feed
            .supported_schemas
            .first()
            .ok_or(SchemaError::NoSupportedSchemas)?;
        let definition = schema.definition.as_deref().ok_or(SchemaError::NoDefinition)?;
        // serde_json's preserve_order feature keeps the declaration order;
        // the index into this list is the column offset in every record.
        let map: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(definition).map_err(SchemaError::BadDefinition)?;
        Ok(Self {
            fields: map.keys().cloned().collect(),
        })
    }

    /// Declared field names, in column order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Zero-based column index of `name`.
    ///
    /// Absent fields are a typed error, never a sentinel index.
    pub fn field_index(&self, name: &str) -> Result<usize, SchemaError> {
        self.fields
            .iter()
            .position(|f| f == name)
            .ok_or_else(|| SchemaError::FieldNotFound(name.to_string()))
    }
}
