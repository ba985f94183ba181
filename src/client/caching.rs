//! Caching decorator for the management client
//!
//! Wraps any [`ManagementClient`] and memoizes its idempotent reads in a
//! TTL cache. Mutations always pass straight through and never touch the
//! cache, so a read within its TTL can return state from before a write —
//! bounded, accepted staleness.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::{Cache, CacheKeyBuilder, CachedOperation};
use crate::error::Error;
use crate::types::*;

use super::ManagementClient;

/// TTL per cacheable operation kind.
///
/// Every kind has a mandatory entry; construction without one is a compile
/// error rather than a runtime configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    pub app_grants: Duration,
    pub priority_queue: Duration,
    pub game_sessions: Duration,
    pub server_info: Duration,
    pub player_details: Duration,
    pub game_server_details: Duration,
    pub leaderboard: Duration,
    pub whitelist: Duration,
    pub banlist: Duration,
    /// Identity resolution is effectively immutable, so it gets the
    /// longest lifetime by default.
    pub resolve: Duration,
}

impl CachePolicy {
    pub fn ttl(&self, op: CachedOperation) -> Duration {
        match op {
            CachedOperation::AppGrants => self.app_grants,
            CachedOperation::PriorityQueue => self.priority_queue,
            CachedOperation::GameSessions => self.game_sessions,
            CachedOperation::ServerInfo => self.server_info,
            CachedOperation::PlayerDetails => self.player_details,
            CachedOperation::GameServerDetails => self.game_server_details,
            CachedOperation::Leaderboard => self.leaderboard,
            CachedOperation::Whitelist => self.whitelist,
            CachedOperation::Banlist => self.banlist,
            CachedOperation::Resolve => self.resolve,
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            app_grants: Duration::from_secs(60),
            priority_queue: Duration::from_secs(30),
            game_sessions: Duration::from_secs(10),
            server_info: Duration::from_secs(30),
            player_details: Duration::from_secs(30),
            game_server_details: Duration::from_secs(30),
            leaderboard: Duration::from_secs(30),
            whitelist: Duration::from_secs(30),
            banlist: Duration::from_secs(30),
            resolve: Duration::from_secs(500),
        }
    }
}

/// Memoizing wrapper around a [`ManagementClient`].
///
/// The cache instance may be shared between clients bound to different
/// servers; keys are namespaced by [`ServerApiId`].
pub struct CachingClient<D> {
    delegate: D,
    cache: Arc<dyn Cache>,
    policy: CachePolicy,
    keys: CacheKeyBuilder,
}

impl<D: ManagementClient> CachingClient<D> {
    pub fn new(
        delegate: D,
        cache: Arc<dyn Cache>,
        policy: CachePolicy,
        scope: ServerApiId,
    ) -> Self {
        Self {
            delegate,
            cache,
            policy,
            keys: CacheKeyBuilder::new(scope),
        }
    }

    fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.cache.get(key)?;
        // A stored value that no longer deserializes counts as a miss.
        serde_json::from_value(value).ok()
    }

    fn store<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        if let Ok(json) = serde_json::to_value(value) {
            self.cache.set(key, json, ttl);
        }
    }

    /// Hit: return the stored response. Miss: await the delegate and store
    /// a successful result under the policy TTL. Failures are never cached.
    ///
    /// Concurrent misses on one key may each reach the delegate; the last
    /// write wins. Only the token refresh is single-flight, not reads.
    async fn cached_read<T, F, Fut>(
        &self,
        op: CachedOperation,
        parts: &[&str],
        fetch: F,
    ) -> Result<T, Error>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, Error>> + Send,
    {
        let key = self.keys.build(op, parts);
        if let Some(hit) = self.lookup::<T>(&key) {
            return Ok(hit);
        }
        let value = fetch().await?;
        let ttl = self.policy.ttl(op);
        debug!(key = %key, ttl_secs = ttl.as_secs(), "caching response");
        self.store(&key, &value, ttl);
        Ok(value)
    }
}

#[async_trait]
impl<D: ManagementClient> ManagementClient for CachingClient<D> {
    async fn get_app_grants(&self) -> Result<AppGrants, Error> {
        self.cached_read(CachedOperation::AppGrants, &[], || {
            self.delegate.get_app_grants()
        })
        .await
    }

    async fn get_game_server_details(
        &self,
        request: &GetGameServerDetailsRequest,
    ) -> Result<GameServerDetails, Error> {
        let port = request.port.to_string();
        self.cached_read(
            CachedOperation::GameServerDetails,
            &[request.game.wire_id(), &request.ip, &port],
            || self.delegate.get_game_server_details(request),
        )
        .await
    }

    async fn get_leaderboard(
        &self,
        request: &GetLeaderboardRequest,
    ) -> Result<Vec<LeaderboardEntry>, Error> {
        let order = match request.order {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        };
        // No limit and limit 0 both mean the server default.
        let limit = request.limit.unwrap_or(0).to_string();
        self.cached_read(
            CachedOperation::Leaderboard,
            &[request.statistic.wire_name(), order, &limit],
            || self.delegate.get_leaderboard(request),
        )
        .await
    }

    async fn get_player_details(&self, player_id: &PlayerId) -> Result<PlayerDetails, Error> {
        let fragment = player_id.key_fragment();
        self.cached_read(CachedOperation::PlayerDetails, &[&fragment], || {
            self.delegate.get_player_details(player_id)
        })
        .await
    }

    async fn delete_player_details(&self, player_id: &PlayerId) -> Result<(), Error> {
        self.delegate.delete_player_details(player_id).await
    }

    async fn get_priority_queue(
        &self,
        player_id: &PlayerId,
    ) -> Result<Option<PriorityQueueEntry>, Error> {
        let fragment = player_id.key_fragment();
        self.cached_read(CachedOperation::PriorityQueue, &[&fragment], || {
            self.delegate.get_priority_queue(player_id)
        })
        .await
    }

    async fn put_priority_queue(&self, request: &PutPriorityQueueRequest) -> Result<(), Error> {
        self.delegate.put_priority_queue(request).await
    }

    async fn delete_priority_queue(&self, player_id: &PlayerId) -> Result<(), Error> {
        self.delegate.delete_priority_queue(player_id).await
    }

    async fn get_whitelist(&self, player_id: &PlayerId) -> Result<Option<WhitelistEntry>, Error> {
        let fragment = player_id.key_fragment();
        self.cached_read(CachedOperation::Whitelist, &[&fragment], || {
            self.delegate.get_whitelist(player_id)
        })
        .await
    }

    async fn put_whitelist(&self, request: &PutWhitelistRequest) -> Result<(), Error> {
        self.delegate.put_whitelist(request).await
    }

    async fn delete_whitelist(&self, player_id: &PlayerId) -> Result<(), Error> {
        self.delegate.delete_whitelist(player_id).await
    }

    async fn list_bans(&self, request: &ListBansRequest) -> Result<Vec<BanEntry>, Error> {
        let fragment = request.player_id.key_fragment();
        self.cached_read(
            CachedOperation::Banlist,
            &[request.list.as_str(), &fragment],
            || self.delegate.list_bans(request),
        )
        .await
    }

    async fn put_ban(&self, request: &PutBanRequest) -> Result<(), Error> {
        self.delegate.put_ban(request).await
    }

    async fn delete_ban(&self, request: &DeleteBanRequest) -> Result<(), Error> {
        self.delegate.delete_ban(request).await
    }

    async fn delete_bans(&self, request: &DeleteBanRequest) -> Result<(), Error> {
        self.delegate.delete_bans(request).await
    }

    async fn get_server_info(&self) -> Result<ServerInfo, Error> {
        self.cached_read(CachedOperation::ServerInfo, &[], || {
            self.delegate.get_server_info()
        })
        .await
    }

    async fn list_game_sessions(&self) -> Result<Vec<GameSession>, Error> {
        self.cached_read(CachedOperation::GameSessions, &[], || {
            self.delegate.list_game_sessions()
        })
        .await
    }

    async fn teleport(&self, request: &TeleportRequest) -> Result<(), Error> {
        self.delegate.teleport(request).await
    }

    async fn spawn_item(&self, request: &SpawnItemRequest) -> Result<(), Error> {
        self.delegate.spawn_item(request).await
    }

    async fn kill_player(&self, session: &GameSessionId) -> Result<(), Error> {
        self.delegate.kill_player(session).await
    }

    async fn heal_player(&self, session: &GameSessionId) -> Result<(), Error> {
        self.delegate.heal_player(session).await
    }

    async fn resolve(&self, player_id: &PlayerId) -> Result<PlayerUid, Error> {
        // Already canonical: no cache, no network.
        if let Some(uid) = player_id.as_uid() {
            return Ok(uid.clone());
        }
        let fragment = player_id.key_fragment();
        self.cached_read(CachedOperation::Resolve, &[&fragment], || {
            self.delegate.resolve(player_id)
        })
        .await
    }
}
