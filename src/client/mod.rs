//! Management API client
//!
//! [`ManagementClient`] is the full remote capability set, one method per
//! operation. [`RestClient`] performs the actual HTTP calls;
//! [`CachingClient`] wraps any implementation and memoizes the idempotent
//! reads.

pub mod caching;
pub mod http;

use async_trait::async_trait;

use crate::error::Error;
use crate::types::*;

pub use caching::{CachePolicy, CachingClient};
pub use http::RestClient;

/// The remote operation set of the management API.
///
/// Read operations are idempotent and safe to memoize; every `put_`,
/// `delete_` and action method mutates remote state and must reach the
/// service on every call.
#[async_trait]
pub trait ManagementClient: Send + Sync {
    /// Servers and banlists the configured credentials are granted.
    async fn get_app_grants(&self) -> Result<AppGrants, Error>;

    /// Matchmaking details of a game server looked up by address.
    async fn get_game_server_details(
        &self,
        request: &GetGameServerDetailsRequest,
    ) -> Result<GameServerDetails, Error>;

    async fn get_leaderboard(
        &self,
        request: &GetLeaderboardRequest,
    ) -> Result<Vec<LeaderboardEntry>, Error>;

    async fn get_player_details(&self, player_id: &PlayerId) -> Result<PlayerDetails, Error>;

    /// Erase the stored details of a player (data-protection request).
    async fn delete_player_details(&self, player_id: &PlayerId) -> Result<(), Error>;

    /// The player's priority-queue slot, if any.
    async fn get_priority_queue(
        &self,
        player_id: &PlayerId,
    ) -> Result<Option<PriorityQueueEntry>, Error>;

    async fn put_priority_queue(&self, request: &PutPriorityQueueRequest) -> Result<(), Error>;

    async fn delete_priority_queue(&self, player_id: &PlayerId) -> Result<(), Error>;

    /// The player's whitelist entry, if any.
    async fn get_whitelist(&self, player_id: &PlayerId) -> Result<Option<WhitelistEntry>, Error>;

    async fn put_whitelist(&self, request: &PutWhitelistRequest) -> Result<(), Error>;

    async fn delete_whitelist(&self, player_id: &PlayerId) -> Result<(), Error>;

    /// Bans of a player on one banlist.
    async fn list_bans(&self, request: &ListBansRequest) -> Result<Vec<BanEntry>, Error>;

    async fn put_ban(&self, request: &PutBanRequest) -> Result<(), Error>;

    /// Remove the first ban matching the request.
    async fn delete_ban(&self, request: &DeleteBanRequest) -> Result<(), Error>;

    /// Remove every ban of the player on the list.
    async fn delete_bans(&self, request: &DeleteBanRequest) -> Result<(), Error>;

    /// Registration details of the server this client is bound to.
    async fn get_server_info(&self) -> Result<ServerInfo, Error>;

    /// Live player sessions on the server.
    async fn list_game_sessions(&self) -> Result<Vec<GameSession>, Error>;

    async fn teleport(&self, request: &TeleportRequest) -> Result<(), Error>;

    async fn spawn_item(&self, request: &SpawnItemRequest) -> Result<(), Error>;

    async fn kill_player(&self, session: &GameSessionId) -> Result<(), Error>;

    async fn heal_player(&self, session: &GameSessionId) -> Result<(), Error>;

    /// Resolve any identifier encoding to the canonical uid.
    async fn resolve(&self, player_id: &PlayerId) -> Result<PlayerUid, Error>;
}
