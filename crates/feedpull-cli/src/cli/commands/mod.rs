//! Command implementations, one module per concern.

mod checksum;
mod download;
mod filter;
mod meta;

pub use checksum::run_checksum;
pub use download::run_download;
pub use filter::{run_filter_item, run_filter_items, run_filter_seller};
pub use meta::{run_feed_types, run_files};

use feedpull_core::auth::EnvTokenProvider;
use feedpull_core::client::FeedClient;
use feedpull_core::config::FeedConfig;

/// Client over the configured base URL and the environment token provider.
pub(super) fn feed_client(cfg: &FeedConfig) -> FeedClient<EnvTokenProvider> {
    FeedClient::new(cfg, EnvTokenProvider::default())
}
