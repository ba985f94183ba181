//! Fluent client construction

use std::sync::Arc;

use crate::cache::{Cache, InMemoryCache};
use crate::client::http::DEFAULT_BASE_URL;
use crate::client::{CachePolicy, CachingClient, RestClient};
use crate::error::Error;
use crate::types::{Credentials, ServerApiId};

/// Assembles a ready-to-use client.
///
/// Server api id and credentials are required; everything else has a
/// default (production endpoint, fresh in-memory cache, stock TTLs).
#[derive(Default)]
pub struct ClientBuilder {
    server_api_id: Option<ServerApiId>,
    credentials: Option<Credentials>,
    base_url: Option<String>,
    cache_policy: Option<CachePolicy>,
    cache: Option<Arc<dyn Cache>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server_api_id(mut self, id: impl Into<String>) -> Self {
        self.server_api_id = Some(ServerApiId::of(id));
        self
    }

    pub fn credentials(
        mut self,
        application_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials::new(application_id, secret));
        self
    }

    /// Point the client at a self-hosted or test endpoint.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = Some(policy);
        self
    }

    /// Share a cache instance between clients; keys are namespaced by
    /// server api id, so entries of different servers never mix.
    pub fn cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// A caching client over the REST implementation.
    pub fn build(self) -> Result<CachingClient<RestClient>, Error> {
        let cache = self
            .cache
            .clone()
            .unwrap_or_else(|| Arc::new(InMemoryCache::new()));
        let policy = self.cache_policy.clone().unwrap_or_default();
        let scope = self
            .server_api_id
            .clone()
            .ok_or_else(|| Error::Config("server api id needs to be set".into()))?;

        let delegate = self.build_uncached()?;
        Ok(CachingClient::new(delegate, cache, policy, scope))
    }

    /// The bare REST client, without any caching.
    pub fn build_uncached(self) -> Result<RestClient, Error> {
        let server_api_id = self
            .server_api_id
            .ok_or_else(|| Error::Config("server api id needs to be set".into()))?;
        let credentials = self
            .credentials
            .ok_or_else(|| Error::Config("credentials need to be provided".into()))?;
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        RestClient::with_base_url(&base_url, server_api_id, credentials)
    }
}
