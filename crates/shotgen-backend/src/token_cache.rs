//! Bearer tokens for Vertex AI.
//!
//! `TokenCache` keeps one OAuth token per process and renews it shortly
//! before expiry. Concurrent callers share a single renewal; when renewal
//! fails the previous token is served for as long as it remains valid.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{BackendError, BackendResult};

/// Tokens are renewed once they are this close to expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// OAuth scope for Vertex AI prediction calls.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Source of bearer tokens for the Vertex backend.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// A token valid for at least the refresh margin.
    async fn access_token(&self) -> BackendResult<String>;

    /// Drop any cached token so the next call fetches a fresh one.
    async fn invalidate(&self);
}

struct Lease {
    token: String,
    expires_at: Instant,
}

impl Lease {
    fn from_token(token: &gcp_auth::Token) -> Self {
        // An already-expired token maps to `now`, so it is never served.
        let remaining = (token.expires_at() - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        Self {
            token: token.as_str().to_string(),
            expires_at: Instant::now() + remaining,
        }
    }

    /// Far enough from expiry to hand out without renewing.
    fn fresh(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    /// Not yet expired.
    fn alive(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

fn fresh_token(slot: &Option<Lease>) -> Option<String> {
    slot.as_ref()
        .filter(|lease| lease.fresh())
        .map(|lease| lease.token.clone())
}

/// Token cache over a `gcp_auth` provider.
pub struct TokenCache {
    provider: Arc<dyn TokenProvider>,
    slot: RwLock<Option<Lease>>,
}

impl TokenCache {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            slot: RwLock::new(None),
        }
    }

    /// Build a cache from a service-account file, or the ambient provider chain
    /// (metadata server, gcloud, `GOOGLE_APPLICATION_CREDENTIALS`) when no path is given.
    pub async fn from_credentials(credentials_path: Option<&Path>) -> BackendResult<Self> {
        let provider: Arc<dyn TokenProvider> = match credentials_path {
            Some(path) => {
                let account = CustomServiceAccount::from_file(path).map_err(|e| {
                    BackendError::configuration(format!(
                        "cannot load service account {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Arc::new(account)
            }
            None => gcp_auth::provider().await.map_err(|e| {
                BackendError::configuration(format!("no Google credentials available: {}", e))
            })?,
        };
        Ok(Self::new(provider))
    }

    async fn renew(&self, slot: &mut Option<Lease>) -> BackendResult<String> {
        let fetched = self.provider.token(&[CLOUD_PLATFORM_SCOPE]).await;

        match fetched {
            Ok(token) => {
                let lease = Lease::from_token(&token);
                let value = lease.token.clone();
                *slot = Some(lease);
                debug!("Vertex AI access token renewed");
                Ok(value)
            }
            Err(e) => match slot.as_ref().filter(|lease| lease.alive()) {
                Some(lease) => {
                    warn!(error = %e, "Token renewal failed, serving previous token");
                    Ok(lease.token.clone())
                }
                None => Err(BackendError::authentication(format!(
                    "cannot obtain access token: {}",
                    e
                ))),
            },
        }
    }
}

#[async_trait]
impl AccessTokenSource for TokenCache {
    async fn access_token(&self) -> BackendResult<String> {
        if let Some(token) = fresh_token(&*self.slot.read().await) {
            return Ok(token);
        }

        let mut slot = self.slot.write().await;
        // A concurrent caller may have renewed while this one waited.
        if let Some(token) = fresh_token(&slot) {
            return Ok(token);
        }
        self.renew(&mut slot).await
    }

    async fn invalidate(&self) {
        self.slot.write().await.take();
    }
}

/// Fixed token, for local emulators and tests.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> BackendResult<String> {
        Ok(self.0.clone())
    }

    async fn invalidate(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_refresh_margin() {
        assert_eq!(TOKEN_REFRESH_MARGIN, Duration::from_secs(60));
    }

    #[test]
    fn test_lease_freshness() {
        let long = Lease {
            token: "t".into(),
            expires_at: Instant::now() + Duration::from_secs(600),
        };
        assert!(long.fresh());
        assert_eq!(fresh_token(&Some(long)).as_deref(), Some("t"));

        let expiring = Lease {
            token: "t".into(),
            expires_at: Instant::now() + Duration::from_secs(30),
        };
        assert!(!expiring.fresh());
        assert!(expiring.alive());
        assert!(fresh_token(&Some(expiring)).is_none());
        assert!(fresh_token(&None).is_none());
    }

    #[test]
    fn test_scope() {
        assert!(CLOUD_PLATFORM_SCOPE.ends_with("cloud-platform"));
    }

    #[tokio::test]
    async fn test_missing_service_account_file() {
        let result =
            TokenCache::from_credentials(Some(Path::new("/nonexistent/shotgen-sa.json"))).await;
        assert!(matches!(result, Err(BackendError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_static_token() {
        let source = StaticToken::new("abc");
        assert_eq!(source.access_token().await.unwrap(), "abc");
        source.invalidate().await;
        assert_eq!(source.access_token().await.unwrap(), "abc");
    }
}
