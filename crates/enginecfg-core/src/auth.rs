//! Bearer-token lifecycle: minting, caching, invalidation.
//!
//! The cached credential is the only process-wide mutable state in the crate;
//! it lives behind [`TokenCache`] so the reconciler never touches it directly
//! and a no-cache or persisted implementation can be swapped in later.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{EngineError, Result};

/// Assumed validity when the identity provider does not report an expiry.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// A credential within this margin of expiry is discarded and re-minted,
/// covering clock skew and in-flight request latency.
pub const EXPIRY_SAFETY_MARGIN_SECS: i64 = 600;

/// A bearer token and the instant it stops being trustworthy.
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Usable at `now`, with the safety margin applied.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - Duration::seconds(EXPIRY_SAFETY_MARGIN_SECS)
    }
}

/// Source of fresh bearer tokens from the process-ambient identity.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Mint a new credential. Failures mean the identity provider is
    /// unreachable or unauthenticated and are fatal to the calling operation.
    async fn mint(&self) -> Result<Credential>;
}

/// Mints tokens by shelling out to `gcloud auth print-access-token`.
///
/// gcloud does not report an expiry, so credentials are stamped with the
/// default one-hour TTL from mint time.
pub struct GcloudTokenProvider;

#[async_trait]
impl TokenProvider for GcloudTokenProvider {
    async fn mint(&self) -> Result<Credential> {
        debug!("minting access token via gcloud");

        let output = Command::new("gcloud")
            .arg("auth")
            .arg("print-access-token")
            .output()
            .await
            .map_err(|e| {
                EngineError::Authentication(format!(
                    "failed to run gcloud: {e}. Is the Google Cloud SDK installed and on PATH?"
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Authentication(format!(
                "gcloud auth print-access-token failed: {}",
                stderr.trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(EngineError::Authentication(
                "gcloud returned an empty access token".to_string(),
            ));
        }

        Ok(Credential::new(
            token,
            Utc::now() + Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
        ))
    }
}

/// Caches the most recently minted credential and re-mints on demand.
pub struct TokenCache {
    provider: Arc<dyn TokenProvider>,
    cached: Mutex<Option<Credential>>,
}

impl TokenCache {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            cached: Mutex::new(None),
        }
    }

    /// Return the cached credential while fresh, otherwise mint, cache,
    /// and return a new one.
    pub async fn token(&self) -> Result<Credential> {
        let mut cached = self.cached.lock().await;

        if let Some(credential) = cached.as_ref()
            && credential.is_fresh(Utc::now())
        {
            debug!(expires_at = %credential.expires_at, "using cached access token");
            return Ok(credential.clone());
        }

        let credential = self.provider.mint().await?;
        debug!(expires_at = %credential.expires_at, "cached new access token");
        *cached = Some(credential.clone());
        Ok(credential)
    }

    /// Drop the cached credential so the next [`TokenCache::token`] call
    /// mints fresh. Called when the server rejects a token the cache still
    /// considered valid (clock skew, revocation).
    pub async fn invalidate(&self) {
        warn!("invalidating cached access token");
        *self.cached.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingProvider {
        mints: AtomicU32,
        ttl_secs: i64,
    }

    impl CountingProvider {
        fn new(ttl_secs: i64) -> Self {
            Self {
                mints: AtomicU32::new(0),
                ttl_secs,
            }
        }
    }

    #[async_trait]
    impl TokenProvider for CountingProvider {
        async fn mint(&self) -> Result<Credential> {
            let n = self.mints.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Credential::new(
                format!("token-{n}"),
                Utc::now() + Duration::seconds(self.ttl_secs),
            ))
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl TokenProvider for FailingProvider {
        async fn mint(&self) -> Result<Credential> {
            Err(EngineError::Authentication("no ambient identity".to_string()))
        }
    }

    #[tokio::test]
    async fn test_fresh_token_is_reused() {
        let provider = Arc::new(CountingProvider::new(DEFAULT_TOKEN_TTL_SECS));
        let cache = TokenCache::new(provider.clone());

        let first = cache.token().await.unwrap();
        let second = cache.token().await.unwrap();
        assert_eq!(first.token, second.token);
        assert_eq!(provider.mints.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_token_inside_safety_margin_is_reminted() {
        // TTL shorter than the safety margin, so every call re-mints.
        let provider = Arc::new(CountingProvider::new(EXPIRY_SAFETY_MARGIN_SECS - 60));
        let cache = TokenCache::new(provider.clone());

        let first = cache.token().await.unwrap();
        let second = cache.token().await.unwrap();
        assert_ne!(first.token, second.token);
        assert_eq!(provider.mints.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_fresh_mint() {
        let provider = Arc::new(CountingProvider::new(DEFAULT_TOKEN_TTL_SECS));
        let cache = TokenCache::new(provider.clone());

        let first = cache.token().await.unwrap();
        cache.invalidate().await;
        let second = cache.token().await.unwrap();
        assert_ne!(first.token, second.token);
        assert_eq!(provider.mints.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_mint_failure_surfaces_as_authentication_error() {
        let cache = TokenCache::new(Arc::new(FailingProvider));
        let err = cache.token().await.unwrap_err();
        assert!(matches!(err, EngineError::Authentication(_)));
    }
}
