use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::AmadeusError;

/// A token is treated as expired this long before the provider says it is.
pub const EXPIRY_SKEW: Duration = Duration::from_secs(60);

/// Successful response of the OAuth2 token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch_token(&self) -> Result<TokenGrant, AmadeusError>;
}

// ============================================================================
// Client-credentials grant
// ============================================================================

pub struct ClientCredentials {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl ClientCredentials {
    pub fn new(http: reqwest::Client, base_url: &str, client_id: &str, client_secret: &str) -> Self {
        Self {
            http,
            token_url: format!("{}/v1/security/oauth2/token", base_url.trim_end_matches('/')),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }
}

#[async_trait]
impl TokenFetcher for ClientCredentials {
    async fn fetch_token(&self) -> Result<TokenGrant, AmadeusError> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(AmadeusError::MissingCredentials);
        }

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AmadeusError::from_body(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| AmadeusError::Decode(format!("token response: {}", e)))
    }
}

// ============================================================================
// Cache
// ============================================================================

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Holds the current bearer token and refreshes it lazily.
///
/// The lock is held across the refresh, so callers arriving while a refresh is
/// in flight wait for it instead of issuing their own.
pub struct TokenCache {
    fetcher: Arc<dyn TokenFetcher>,
    current: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(fetcher: Arc<dyn TokenFetcher>) -> Self {
        Self {
            fetcher,
            current: Mutex::new(None),
        }
    }

    pub async fn access_token(&self) -> Result<String, AmadeusError> {
        let mut current = self.current.lock().await;

        if let Some(token) = current.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
            debug!("Amadeus token is within {:?} of expiry, refreshing", EXPIRY_SKEW);
        }

        let grant = self.fetcher.fetch_token().await?;
        let lifetime = Duration::from_secs(grant.expires_in);
        let token = CachedToken {
            value: grant.access_token,
            refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_SKEW),
        };
        info!("Obtained Amadeus access token valid for {}s", grant.expires_in);

        let value = token.value.clone();
        *current = Some(token);
        Ok(value)
    }

    /// Forgets the current token; the next `access_token` call fetches a new one.
    pub async fn invalidate(&self) {
        *self.current.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
        expires_in: u64,
    }

    impl CountingFetcher {
        fn new(expires_in: u64) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                expires_in,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenFetcher for CountingFetcher {
        async fn fetch_token(&self) -> Result<TokenGrant, AmadeusError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            // Simulate network latency so concurrent callers overlap.
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(TokenGrant {
                access_token: format!("token-{}", n),
                expires_in: self.expires_in,
                token_type: Some("Bearer".into()),
            })
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl TokenFetcher for FailingFetcher {
        async fn fetch_token(&self) -> Result<TokenGrant, AmadeusError> {
            Err(AmadeusError::Status {
                status: 401,
                message: "invalid_client".into(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_reused_within_validity_window() {
        let fetcher = CountingFetcher::new(1799);
        let cache = TokenCache::new(fetcher.clone());

        let first = cache.access_token().await.unwrap();
        tokio::time::advance(Duration::from_secs(600)).await;
        let second = cache.access_token().await.unwrap();

        assert_eq!(first, "token-1");
        assert_eq!(second, first);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_after_expiry_happens_once() {
        let fetcher = CountingFetcher::new(1799);
        let cache = TokenCache::new(fetcher.clone());

        cache.access_token().await.unwrap();
        tokio::time::advance(Duration::from_secs(1800)).await;

        assert_eq!(cache.access_token().await.unwrap(), "token-2");
        assert_eq!(cache.access_token().await.unwrap(), "token-2");
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_inside_safety_margin() {
        let fetcher = CountingFetcher::new(1799);
        let cache = TokenCache::new(fetcher.clone());
        cache.access_token().await.unwrap();

        // 1799s lifetime minus 60s skew: still fresh just before 1739s...
        tokio::time::advance(Duration::from_secs(1738)).await;
        assert_eq!(cache.access_token().await.unwrap(), "token-1");

        // ...and refreshed from there on, although the provider would still accept it.
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.access_token().await.unwrap(), "token-2");
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_fetch() {
        let fetcher = CountingFetcher::new(1799);
        let cache = Arc::new(TokenCache::new(fetcher.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.access_token().await.unwrap() })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), "token-1");
        }
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_refresh() {
        let fetcher = CountingFetcher::new(1799);
        let cache = TokenCache::new(fetcher.clone());
        cache.access_token().await.unwrap();
        cache.invalidate().await;
        assert_eq!(cache.access_token().await.unwrap(), "token-2");
    }

    #[tokio::test]
    async fn test_fetch_errors_propagate_and_nothing_is_cached() {
        let cache = TokenCache::new(Arc::new(FailingFetcher));
        assert!(cache.access_token().await.unwrap_err().is_unauthorized());
        assert!(cache.access_token().await.is_err());
    }
}
