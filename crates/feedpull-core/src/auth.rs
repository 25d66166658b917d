//! Bearer token acquisition seam.
//!
//! The core never speaks OAuth2 itself; it consumes tokens through the
//! `TokenProvider` trait. `EnvTokenProvider` reads a pre-acquired token from
//! the environment, and `CachedTokenProvider` wraps any provider with
//! explicit expiry tracking so long downloads pick up fresh credentials
//! instead of silently reusing a stale one.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::AuthError;

/// Environment variable holding a pre-acquired OAuth2 application token.
pub const TOKEN_ENV_VAR: &str = "FEEDPULL_TOKEN";

/// Safety margin subtracted from a token's lifetime before re-fetching.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// A bearer credential plus how long it remains valid.
#[derive(Debug, Clone)]
pub struct BearerToken {
    /// Raw token value, without the `Bearer ` prefix.
    pub token: String,
    /// Remaining lifetime as reported by the provider.
    pub expires_in: Duration,
}

/// Source of bearer tokens for a fixed scope.
pub trait TokenProvider {
    fn fetch(&self) -> Result<BearerToken, AuthError>;
}

/// Rejects empty or whitespace-bearing credentials before they hit the wire.
fn validate_token(token: &str) -> Result<(), AuthError> {
    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }
    if token.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AuthError::MalformedToken(
            "token contains whitespace or control characters".to_string(),
        ));
    }
    Ok(())
}

/// Provider backed by a fixed token value. Used by embedders and tests.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
    ttl: Duration,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            // Matches the typical application-token lifetime of two hours.
            ttl: Duration::from_secs(7200),
        }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn fetch(&self) -> Result<BearerToken, AuthError> {
        validate_token(&self.token)?;
        Ok(BearerToken {
            token: self.token.clone(),
            expires_in: self.ttl,
        })
    }
}

/// Provider reading the token from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new(TOKEN_ENV_VAR)
    }
}

impl TokenProvider for EnvTokenProvider {
    fn fetch(&self) -> Result<BearerToken, AuthError> {
        let raw = std::env::var(&self.var)
            .map_err(|_| AuthError::Acquisition(format!("environment variable {} is not set", self.var)))?;
        let token = raw.trim().to_string();
        validate_token(&token)?;
        Ok(BearerToken {
            token,
            expires_in: Duration::from_secs(7200),
        })
    }
}

struct CachedToken {
    token: String,
    valid_until: Instant,
}

/// Caching accessor over a `TokenProvider` with explicit expiry tracking.
///
/// A token is reused until `expires_in` minus a refresh margin has elapsed,
/// then re-fetched. Acquisition failures are never cached.
pub struct CachedTokenProvider<P> {
    inner: P,
    state: Mutex<Option<CachedToken>>,
}

impl<P: TokenProvider> CachedTokenProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            state: Mutex::new(None),
        }
    }

    /// Current token value, fetching or refreshing as needed.
    pub fn token(&self) -> Result<String, AuthError> {
        let mut state = self.state.lock().expect("token cache poisoned");
        if let Some(cached) = state.as_ref() {
            if Instant::now() < cached.valid_until {
                return Ok(cached.token.clone());
            }
        }
        let fresh = self.inner.fetch()?;
        validate_token(&fresh.token)?;
        let lifetime = fresh.expires_in.saturating_sub(REFRESH_MARGIN);
        let token = fresh.token.clone();
        *state = Some(CachedToken {
            token: fresh.token,
            valid_until: Instant::now() + lifetime,
        });
        Ok(token)
    }

    /// Drop the cached token so the next call re-fetches.
    pub fn invalidate(&self) {
        *self.state.lock().expect("token cache poisoned") = None;
    }
}
