use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::fetcher::FetchOptions;
use crate::planner::{DEFAULT_BATCH_SIZE, DEFAULT_CHUNK_SIZE};
use crate::retry::RetryPolicy;

/// Production base URL of the feed API.
pub const DEFAULT_BASE_URL: &str = "https://api.ebay.com/buy/feed/v1";

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per range (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// Global configuration loaded from `~/.config/feedpull/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Base URL of the feed API (override for sandbox or test servers).
    pub base_url: String,
    /// Byte width of one range request.
    pub chunk_size: u64,
    /// Number of ranges fetched concurrently per batch.
    pub batch_size: usize,
    /// Wall-clock bound in seconds for one batch, retries included.
    pub batch_deadline_secs: u64,
    /// Default marketplace identifier attached to requests.
    #[serde(default)]
    pub marketplace: Option<String>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_deadline_secs: 600,
            marketplace: None,
            retry: None,
        }
    }
}

impl FeedConfig {
    /// Fetcher tuning derived from this config.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            batch_size: self.batch_size.max(1),
            batch_deadline: Duration::from_secs(self.batch_deadline_secs.max(1)),
            retry: self
                .retry
                .as_ref()
                .map(RetryConfig::to_policy)
                .unwrap_or_default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("feedpull")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FeedConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FeedConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FeedConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = FeedConfig::default();
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.chunk_size, 10_240_000);
        assert_eq!(cfg.batch_size, 50);
        assert_eq!(cfg.batch_deadline_secs, 600);
        assert!(cfg.marketplace.is_none());
        assert!(cfg.retry.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = FeedConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: FeedConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.base_url, cfg.base_url);
        assert_eq!(parsed.chunk_size, cfg.chunk_size);
        assert_eq!(parsed.batch_size, cfg.batch_size);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            base_url = "http://127.0.0.1:8080/feed/v1"
            chunk_size = 1024
            batch_size = 4
            batch_deadline_secs = 30
            marketplace = "EBAY_DE"
        "#;
        let cfg: FeedConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.base_url, "http://127.0.0.1:8080/feed/v1");
        assert_eq!(cfg.chunk_size, 1024);
        assert_eq!(cfg.batch_size, 4);
        assert_eq!(cfg.marketplace.as_deref(), Some("EBAY_DE"));
    }

    #[test]
    fn config_toml_retry_section() {
        let toml = r#"
            base_url = "https://api.ebay.com/buy/feed/v1"
            chunk_size = 10240000
            batch_size = 50
            batch_deadline_secs = 600

            [retry]
            max_attempts = 3
            base_delay_secs = 0.5
            max_delay_secs = 15
        "#;
        let cfg: FeedConfig = toml::from_str(toml).unwrap();
        let retry = cfg.retry.as_ref().unwrap();
        assert_eq!(retry.max_attempts, 3);
        assert!((retry.base_delay_secs - 0.5).abs() < 1e-9);
        let policy = retry.to_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(15));
    }

    #[test]
    fn fetch_options_clamp_degenerate_values() {
        let cfg = FeedConfig {
            batch_size: 0,
            batch_deadline_secs: 0,
            ..FeedConfig::default()
        };
        let opts = cfg.fetch_options();
        assert_eq!(opts.batch_size, 1);
        assert_eq!(opts.batch_deadline, Duration::from_secs(1));
    }
}
