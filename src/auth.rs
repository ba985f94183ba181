//! Authorization token lifecycle
//!
//! Owns the current bearer token and refreshes it through a credential
//! exchange when it is missing or about to expire. Refreshes are
//! single-flight: however many callers ask for a token while none is held,
//! exactly one exchange is issued and every caller receives its outcome.
//! The remote service may rate-limit or invalidate overlapping exchanges,
//! so this is a correctness requirement, not an optimization.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::types::Credentials;

/// Refresh when less than this much validity remains.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// A bearer token and its validity window.
///
/// Tokens are replaced whole on refresh, never mutated.
#[derive(Debug, Clone)]
pub struct Token {
    value: String,
    expires_at: Instant,
}

impl Token {
    pub fn new(value: impl Into<String>, valid_for: Duration) -> Self {
        Self {
            value: value.into(),
            expires_at: Instant::now() + valid_for,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    fn is_valid(&self, margin: Duration) -> bool {
        Instant::now() + margin < self.expires_at
    }
}

/// Performs the credential exchange against the auth endpoint.
#[async_trait]
pub trait CredentialExchange: Send + Sync + 'static {
    async fn exchange(&self, credentials: &Credentials) -> Result<Token, Error>;
}

type RefreshFlight = Shared<BoxFuture<'static, Result<Token, Error>>>;

struct AuthState {
    token: Option<Token>,
    in_flight: Option<RefreshFlight>,
}

struct ProviderInner {
    exchange: Arc<dyn CredentialExchange>,
    credentials: Credentials,
    margin: Duration,
    state: Mutex<AuthState>,
}

/// Hands a valid bearer token to any number of concurrent callers while
/// performing at most one credential exchange at a time.
#[derive(Clone)]
pub struct AuthorizationProvider {
    inner: Arc<ProviderInner>,
}

impl AuthorizationProvider {
    pub fn new(credentials: Credentials, exchange: Arc<dyn CredentialExchange>) -> Self {
        Self::with_margin(credentials, exchange, EXPIRY_MARGIN)
    }

    pub fn with_margin(
        credentials: Credentials,
        exchange: Arc<dyn CredentialExchange>,
        margin: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                exchange,
                credentials,
                margin,
                state: Mutex::new(AuthState {
                    token: None,
                    in_flight: None,
                }),
            }),
        }
    }

    /// A valid bearer token value, refreshed through the exchange if the
    /// held one is missing or inside the expiry margin.
    ///
    /// Concurrent callers during a refresh all await the same exchange and
    /// see the same token or the same failure. A failed exchange stores
    /// nothing; the next call starts a fresh attempt.
    pub async fn provide_token(&self) -> Result<String, Error> {
        let flight = {
            let mut state = self.inner.state.lock().unwrap();
            if let Some(token) = &state.token {
                if token.is_valid(self.inner.margin) {
                    return Ok(token.value.clone());
                }
            }
            match &state.in_flight {
                Some(flight) => flight.clone(),
                None => {
                    debug!("no valid bearer token held, starting credential exchange");
                    let flight = Self::start_refresh(Arc::clone(&self.inner));
                    state.in_flight = Some(flight.clone());
                    flight
                }
            }
        };

        let token = flight.await?;
        Ok(token.value)
    }

    fn start_refresh(inner: Arc<ProviderInner>) -> RefreshFlight {
        async move {
            let result = inner.exchange.exchange(&inner.credentials).await;
            let mut state = inner.state.lock().unwrap();
            state.in_flight = None;
            match result {
                Ok(token) => {
                    info!("bearer token refreshed");
                    state.token = Some(token.clone());
                    Ok(token)
                }
                Err(err) => {
                    warn!(error = %err, "credential exchange failed");
                    Err(err)
                }
            }
        }
        .boxed()
        .shared()
    }
}

/// Credential exchange over HTTP: Basic-auth POST to the auth endpoint.
pub struct RestCredentialExchange {
    http: reqwest::Client,
    auth_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
    /// Validity in seconds
    valid_for: u64,
}

impl RestCredentialExchange {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            auth_url: format!("{}/v1/auth/token", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl CredentialExchange for RestCredentialExchange {
    async fn exchange(&self, credentials: &Credentials) -> Result<Token, Error> {
        let pair = format!("{}:{}", credentials.application_id(), credentials.secret());
        let encoded = base64::engine::general_purpose::STANDARD.encode(pair);

        let response = self
            .http
            .post(&self.auth_url)
            .header("Authorization", format!("Basic {}", encoded))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // The exchange endpoint answers 401/403 for a rejected pair.
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(Error::BadCredentials(body));
            }
            return Err(Error::from_status(status.as_u16(), &body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Protocol(format!("auth response: {}", e)))?;

        debug!(valid_for = token.valid_for, "credential exchange succeeded");
        Ok(Token::new(token.token, Duration::from_secs(token.valid_for)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct StubExchange {
        calls: AtomicUsize,
        fail: AtomicBool,
        delay: Duration,
        valid_for: Duration,
    }

    impl StubExchange {
        fn new(valid_for: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                delay: Duration::from_millis(50),
                valid_for,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CredentialExchange for StubExchange {
        async fn exchange(&self, _credentials: &Credentials) -> Result<Token, Error> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.delay).await;
            if self.fail.load(Ordering::SeqCst) {
                Err(Error::BadCredentials("SOME_REASON".into()))
            } else {
                Ok(Token::new(format!("token-{}", call), self.valid_for))
            }
        }
    }

    fn provider(exchange: Arc<StubExchange>, margin: Duration) -> AuthorizationProvider {
        AuthorizationProvider::with_margin(
            Credentials::new("AN_APP_ID", "A_SECRET"),
            exchange,
            margin,
        )
    }

    #[tokio::test]
    async fn held_token_is_reused_without_exchange() {
        let exchange = StubExchange::new(Duration::from_secs(3600));
        let provider = provider(exchange.clone(), Duration::from_secs(60));

        let first = provider.provide_token().await.unwrap();
        let second = provider.provide_token().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(exchange.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_exchange() {
        let exchange = StubExchange::new(Duration::from_secs(3600));
        let provider = provider(exchange.clone(), Duration::from_secs(60));

        let (a, b, c, d, e) = tokio::join!(
            provider.provide_token(),
            provider.provide_token(),
            provider.provide_token(),
            provider.provide_token(),
            provider.provide_token(),
        );

        let a = a.unwrap();
        assert_eq!(a, b.unwrap());
        assert_eq!(a, c.unwrap());
        assert_eq!(a, d.unwrap());
        assert_eq!(a, e.unwrap());
        assert_eq!(exchange.calls(), 1);
    }

    #[tokio::test]
    async fn failure_is_shared_with_every_waiter() {
        let exchange = StubExchange::new(Duration::from_secs(3600));
        exchange.fail.store(true, Ordering::SeqCst);
        let provider = provider(exchange.clone(), Duration::from_secs(60));

        let (a, b, c) = tokio::join!(
            provider.provide_token(),
            provider.provide_token(),
            provider.provide_token(),
        );

        assert!(matches!(a, Err(Error::BadCredentials(_))));
        assert!(matches!(b, Err(Error::BadCredentials(_))));
        assert!(matches!(c, Err(Error::BadCredentials(_))));
        assert_eq!(exchange.calls(), 1);
    }

    #[tokio::test]
    async fn next_call_retries_after_failure() {
        let exchange = StubExchange::new(Duration::from_secs(3600));
        exchange.fail.store(true, Ordering::SeqCst);
        let provider = provider(exchange.clone(), Duration::from_secs(60));

        assert!(provider.provide_token().await.is_err());

        exchange.fail.store(false, Ordering::SeqCst);
        let token = provider.provide_token().await.unwrap();
        assert_eq!(token, "token-2");
        assert_eq!(exchange.calls(), 2);
    }

    #[tokio::test]
    async fn expired_token_triggers_refresh() {
        let exchange = StubExchange::new(Duration::from_millis(10));
        let provider = provider(exchange.clone(), Duration::ZERO);

        let first = provider.provide_token().await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let second = provider.provide_token().await.unwrap();

        assert_ne!(first, second);
        assert_eq!(exchange.calls(), 2);
    }

    #[tokio::test]
    async fn margin_forces_refresh_before_expiry() {
        // Token outlives the test but never satisfies the margin.
        let exchange = StubExchange::new(Duration::from_secs(30));
        let provider = provider(exchange.clone(), Duration::from_secs(60));

        provider.provide_token().await.unwrap();
        provider.provide_token().await.unwrap();

        assert_eq!(exchange.calls(), 2);
    }
}
