//! Identifier and domain types for the management API
//!
//! Player identifiers come in several encodings; [`PlayerId`] unifies them
//! and [`PlayerUid`] is the service-native canonical form that every other
//! encoding resolves to.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of a server registration in the management API.
///
/// Every server-scoped request carries this id, and cache keys are
/// namespaced by it so that clients bound to different servers can share
/// one cache without colliding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerApiId(String);

impl ServerApiId {
    pub fn of(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerApiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Service-native canonical player identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerUid(String);

impl PlayerUid {
    pub fn of(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A player identifier in any supported encoding.
///
/// Operations that take a player accept any variant; raw encodings are
/// resolved to a [`PlayerUid`] through the identity-resolution endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    /// Canonical service-native identifier
    Uid(PlayerUid),
    /// 17-digit Steam account id
    Steam64(String),
    /// Bohemia Interactive account id
    BohemiaId(String),
    /// BattlEye GUID
    BattlEyeGuid(String),
}

impl PlayerId {
    pub fn steam64(id: impl Into<String>) -> Self {
        Self::Steam64(id.into())
    }

    pub fn bohemia_id(id: impl Into<String>) -> Self {
        Self::BohemiaId(id.into())
    }

    pub fn battleye_guid(guid: impl Into<String>) -> Self {
        Self::BattlEyeGuid(guid.into())
    }

    /// The canonical uid, if this id already is one
    pub fn as_uid(&self) -> Option<&PlayerUid> {
        match self {
            Self::Uid(uid) => Some(uid),
            _ => None,
        }
    }

    /// The raw identifier string, without its kind
    pub fn raw(&self) -> &str {
        match self {
            Self::Uid(uid) => uid.as_str(),
            Self::Steam64(id) | Self::BohemiaId(id) | Self::BattlEyeGuid(id) => id,
        }
    }

    /// Kind-tagged fragment for cache keys.
    ///
    /// The tag prevents identifiers of different kinds that happen to share
    /// a string value from colliding in the cache.
    pub(crate) fn key_fragment(&self) -> String {
        match self {
            Self::Uid(uid) => format!("uid:{}", uid.as_str()),
            Self::Steam64(id) => format!("steam64:{}", id),
            Self::BohemiaId(id) => format!("bohemia:{}", id),
            Self::BattlEyeGuid(guid) => format!("beguid:{}", guid),
        }
    }
}

impl From<PlayerUid> for PlayerId {
    fn from(uid: PlayerUid) -> Self {
        Self::Uid(uid)
    }
}

/// Application credential pair used for the token exchange.
#[derive(Clone)]
pub struct Credentials {
    application_id: String,
    secret: String,
}

impl Credentials {
    pub fn new(application_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            secret: secret.into(),
        }
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("application_id", &self.application_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Expiration of a priority-queue, whitelist or ban entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expiration {
    Permanent,
    Until(DateTime<Utc>),
}

/// Identifier of a banlist the application has access to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BanlistId(String);

impl BanlistId {
    pub fn of(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a live game session on a server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameSessionId(String);

impl GameSessionId {
    pub fn of(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Supported games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Game {
    DayZ,
}

impl Game {
    pub(crate) fn wire_id(&self) -> &'static str {
        match self {
            Game::DayZ => "dayz",
        }
    }
}

/// Servers and banlists the application credentials are granted access to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppGrants {
    pub servers: Vec<ServerGrant>,
    pub banlists: Vec<BanlistGrant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerGrant {
    pub id: ServerApiId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanlistGrant {
    pub id: BanlistId,
    pub name: String,
}

/// Aggregated details about a player on one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDetails {
    /// Name history, most recent last
    pub names: Vec<String>,
    /// Total playtime in seconds
    pub playtime: u64,
    pub sessions: u32,
    pub environment_deaths: u32,
    pub suicides: u32,
}

/// Statistic a leaderboard can be ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Kills,
    Deaths,
    Suicides,
    Playtime,
    LongestKill,
    LongestShot,
    KillDeathRatio,
}

impl Statistic {
    pub(crate) fn wire_name(&self) -> &'static str {
        match self {
            Statistic::Kills => "kills",
            Statistic::Deaths => "deaths",
            Statistic::Suicides => "suicides",
            Statistic::Playtime => "playtime",
            Statistic::LongestKill => "longest_kill",
            Statistic::LongestShot => "longest_shot",
            Statistic::KillDeathRatio => "kdratio",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GetLeaderboardRequest {
    pub statistic: Statistic,
    pub order: SortOrder,
    /// Number of rows to return, capped by the API at 100
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: PlayerUid,
    pub name: String,
    pub rank: u32,
    /// Playtime in seconds
    pub playtime: u64,
    pub environment_deaths: u32,
    pub suicides: u32,
}

/// A player's priority-queue slot on one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityQueueEntry {
    pub created_by: PlayerUid,
    pub comment: String,
    pub expiration: Expiration,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutPriorityQueueRequest {
    pub player_id: PlayerId,
    pub comment: String,
    pub expiration: Expiration,
}

/// A player's whitelist entry on one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub created_by: PlayerUid,
    pub comment: String,
    pub expiration: Expiration,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutWhitelistRequest {
    pub player_id: PlayerId,
    pub comment: String,
    pub expiration: Expiration,
}

/// One ban on a banlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanEntry {
    /// Server-assigned ban id
    pub id: String,
    pub reason: String,
    pub expiration: Expiration,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListBansRequest {
    pub list: BanlistId,
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutBanRequest {
    pub list: BanlistId,
    pub player_id: PlayerId,
    pub reason: String,
    pub expiration: Expiration,
}

/// Target of a ban removal; `delete_ban` removes the first matching ban,
/// `delete_bans` removes every ban of the player on the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteBanRequest {
    pub list: BanlistId,
    pub player_id: PlayerId,
}

/// Registration details of the server this client is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub nickname: String,
    pub owner: PlayerUid,
    pub game: Game,
}

/// Matchmaking details of a game server looked up by address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameServerDetails {
    pub name: String,
    pub game: Game,
    pub ip: String,
    pub port: u16,
    pub online: bool,
    pub players: u32,
    pub slots: u32,
    pub map: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GetGameServerDetailsRequest {
    pub game: Game,
    pub ip: String,
    pub port: u16,
}

/// A live player session on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub id: GameSessionId,
    pub player: PlayerUid,
    pub player_name: String,
    pub created_at: DateTime<Utc>,
}

/// In-game world position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeleportRequest {
    pub session: GameSessionId,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnItemRequest {
    pub session: GameSessionId,
    /// Class name of the item to spawn
    pub item_class: String,
    pub quantity: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_fragments_are_kind_tagged() {
        let steam = PlayerId::steam64("123456789");
        let bohemia = PlayerId::bohemia_id("123456789");
        assert_ne!(steam.key_fragment(), bohemia.key_fragment());
        assert_eq!(steam.key_fragment(), "steam64:123456789");
    }

    #[test]
    fn uid_round_trips_through_player_id() {
        let uid = PlayerUid::of("abcdef");
        let id = PlayerId::from(uid.clone());
        assert_eq!(id.as_uid(), Some(&uid));
        assert_eq!(id.raw(), "abcdef");
        assert!(PlayerId::steam64("1").as_uid().is_none());
    }

    #[test]
    fn credentials_debug_redacts_secret() {
        let credentials = Credentials::new("app-1", "hunter2");
        let rendered = format!("{:?}", credentials);
        assert!(rendered.contains("app-1"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn expiration_serde_round_trip() {
        let value = serde_json::to_value(Expiration::Permanent).unwrap();
        let back: Expiration = serde_json::from_value(value).unwrap();
        assert_eq!(back, Expiration::Permanent);

        let until = Expiration::Until(Utc::now());
        let value = serde_json::to_value(until.clone()).unwrap();
        let back: Expiration = serde_json::from_value(value).unwrap();
        assert_eq!(back, until);
    }
}
