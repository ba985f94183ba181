//! HTTP implementation of the management client
//!
//! One method per remote operation: build the URL, attach a bearer token
//! from the authorization provider, send, map non-success statuses to
//! [`Error`], and convert the wire DTO into its domain type.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{AuthorizationProvider, RestCredentialExchange};
use crate::error::Error;
use crate::types::*;

use super::ManagementClient;

/// Production endpoint of the management API.
pub const DEFAULT_BASE_URL: &str = "https://data.serverdeck.io";

/// HTTP client timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Management client performing real HTTP calls.
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    server_api_id: ServerApiId,
    auth: AuthorizationProvider,
}

impl RestClient {
    /// Client against the production endpoint.
    pub fn new(server_api_id: ServerApiId, credentials: Credentials) -> Result<Self, Error> {
        Self::with_base_url(DEFAULT_BASE_URL, server_api_id, credentials)
    }

    /// Client against a custom endpoint (self-hosted or test server).
    pub fn with_base_url(
        base_url: &str,
        server_api_id: ServerApiId,
        credentials: Credentials,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let auth = AuthorizationProvider::new(
            credentials,
            Arc::new(RestCredentialExchange::new(http.clone(), &base_url)),
        );

        Ok(Self {
            http,
            base_url,
            server_api_id,
            auth,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path)
    }

    fn server_url(&self, path: &str) -> String {
        format!(
            "{}/v1/server/{}/{}",
            self.base_url,
            urlencoding::encode(self.server_api_id.as_str()),
            path
        )
    }

    fn banlist_url(&self, list: &BanlistId) -> String {
        format!(
            "{}/v1/banlist/{}/bans",
            self.base_url,
            urlencoding::encode(list.as_str())
        )
    }

    async fn authed(&self, request: RequestBuilder) -> Result<RequestBuilder, Error> {
        let token = self.auth.provide_token().await?;
        Ok(request.header("Authorization", format!("Bearer {}", token)))
    }

    async fn resolve_uid(&self, player_id: &PlayerId) -> Result<PlayerUid, Error> {
        if let Some(uid) = player_id.as_uid() {
            return Ok(uid.clone());
        }

        debug!(identifier = player_id.raw(), "resolving player identifier");
        let request = self
            .http
            .get(self.url("users/lookup"))
            .query(&[("identifier", player_id.raw())]);
        let response = self.authed(request).await?.send().await?;
        let response = ensure_success(response).await?;

        let lookup: LookupResponse = response.json().await?;
        Ok(PlayerUid::of(lookup.uid))
    }
}

/// Pass a successful response through, map everything else to an [`Error`].
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::from_status(status.as_u16(), &body))
}

/// Parse a timestamp that may or may not carry a zone suffix.
///
/// The API emits zoned RFC 3339 for some entities and naive UTC for others.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, Error> {
    if raw.ends_with('Z') || raw.contains('+') {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Error::Protocol(format!("bad timestamp {:?}: {}", raw, e)))
    } else {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| Utc.from_utc_datetime(&naive))
            .map_err(|e| Error::Protocol(format!("bad timestamp {:?}: {}", raw, e)))
    }
}

fn parse_expiration(raw: Option<&str>) -> Result<Expiration, Error> {
    match raw {
        None => Ok(Expiration::Permanent),
        Some(at) => parse_timestamp(at).map(Expiration::Until),
    }
}

fn expiration_to_wire(expiration: &Expiration) -> Option<String> {
    match expiration {
        Expiration::Permanent => None,
        Expiration::Until(at) => Some(at.to_rfc3339()),
    }
}

fn game_from_wire(raw: &str) -> Result<Game, Error> {
    match raw {
        "dayz" => Ok(Game::DayZ),
        other => Err(Error::Protocol(format!("unknown game identifier {:?}", other))),
    }
}

// ---- wire DTOs -----------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LookupResponse {
    uid: String,
}

#[derive(Debug, Deserialize)]
struct GrantsResponse {
    servers: Vec<GrantRecord>,
    banlists: Vec<GrantRecord>,
}

#[derive(Debug, Deserialize)]
struct GrantRecord {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct GameServerResponse {
    name: String,
    game: String,
    ip: String,
    port: u16,
    online: bool,
    players: u32,
    slots: u32,
    #[serde(default)]
    map: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LeaderboardResponse {
    leaderboard: Vec<LeaderboardRow>,
}

#[derive(Debug, Deserialize)]
struct LeaderboardRow {
    uid: String,
    latest_name: String,
    rank: u32,
    playtime: u64,
    environment_deaths: u32,
    suicides: u32,
}

#[derive(Debug, Deserialize)]
struct PlayerRecord {
    omega: OmegaRecord,
    game: GameRecord,
}

#[derive(Debug, Deserialize)]
struct OmegaRecord {
    name_history: Vec<String>,
    playtime: u64,
    sessions: u32,
}

#[derive(Debug, Deserialize)]
struct GameRecord {
    general: GeneralStats,
}

#[derive(Debug, Deserialize)]
struct GeneralStats {
    environment_deaths: u32,
    suicides: u32,
}

/// Priority-queue and whitelist entries share one wire shape.
#[derive(Debug, Deserialize)]
struct EntryListResponse {
    entries: Vec<EntryRecord>,
}

#[derive(Debug, Deserialize)]
struct EntryRecord {
    created_at: String,
    creator: UserRef,
    meta: EntryMeta,
}

#[derive(Debug, Deserialize)]
struct UserRef {
    uid: String,
}

#[derive(Debug, Deserialize)]
struct EntryMeta {
    comment: String,
    #[serde(default)]
    expiration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BansResponse {
    entries: Vec<BanRecord>,
}

#[derive(Debug, Deserialize)]
struct BanRecord {
    id: String,
    reason: String,
    #[serde(default)]
    expires_at: Option<String>,
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct ServerInfoResponse {
    nickname: String,
    owner: String,
    game: String,
}

#[derive(Debug, Deserialize)]
struct SessionsResponse {
    sessions: Vec<SessionRecord>,
}

#[derive(Debug, Deserialize)]
struct SessionRecord {
    id: String,
    uid: String,
    player_name: String,
    created_at: String,
}

#[derive(Debug, Serialize)]
struct PutEntryBody {
    uid: String,
    comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutBanBody {
    uid: String,
    reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct TeleportBody {
    session_id: String,
    coordinates: [f64; 3],
}

#[derive(Debug, Serialize)]
struct SpawnItemBody {
    session_id: String,
    item_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    quantity: Option<u32>,
}

#[derive(Debug, Serialize)]
struct SessionActionBody {
    session_id: String,
}

// ---- wire → domain -------------------------------------------------------

fn queue_entry_from_wire(record: EntryRecord) -> Result<PriorityQueueEntry, Error> {
    Ok(PriorityQueueEntry {
        created_by: PlayerUid::of(record.creator.uid),
        comment: record.meta.comment,
        expiration: parse_expiration(record.meta.expiration.as_deref())?,
        created_at: parse_timestamp(&record.created_at)?,
    })
}

fn whitelist_entry_from_wire(record: EntryRecord) -> Result<WhitelistEntry, Error> {
    Ok(WhitelistEntry {
        created_by: PlayerUid::of(record.creator.uid),
        comment: record.meta.comment,
        expiration: parse_expiration(record.meta.expiration.as_deref())?,
        created_at: parse_timestamp(&record.created_at)?,
    })
}

fn ban_from_wire(record: BanRecord) -> Result<BanEntry, Error> {
    Ok(BanEntry {
        id: record.id,
        reason: record.reason,
        expiration: parse_expiration(record.expires_at.as_deref())?,
        created_at: parse_timestamp(&record.created_at)?,
    })
}

#[async_trait]
impl ManagementClient for RestClient {
    async fn get_app_grants(&self) -> Result<AppGrants, Error> {
        debug!("fetching application grants");
        let response = self
            .authed(self.http.get(self.url("app/grants")))
            .await?
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let grants: GrantsResponse = response.json().await?;
        Ok(AppGrants {
            servers: grants
                .servers
                .into_iter()
                .map(|g| ServerGrant {
                    id: ServerApiId::of(g.id),
                    name: g.name,
                })
                .collect(),
            banlists: grants
                .banlists
                .into_iter()
                .map(|g| BanlistGrant {
                    id: BanlistId::of(g.id),
                    name: g.name,
                })
                .collect(),
        })
    }

    async fn get_game_server_details(
        &self,
        request: &GetGameServerDetailsRequest,
    ) -> Result<GameServerDetails, Error> {
        let port = request.port.to_string();
        debug!(game = request.game.wire_id(), ip = %request.ip, port = request.port, "looking up game server");
        let http_request = self.http.get(self.url("gameserver")).query(&[
            ("game", request.game.wire_id()),
            ("ip", request.ip.as_str()),
            ("port", port.as_str()),
        ]);
        let response = self.authed(http_request).await?.send().await?;
        let response = ensure_success(response).await?;

        let details: GameServerResponse = response.json().await?;
        Ok(GameServerDetails {
            name: details.name,
            game: game_from_wire(&details.game)?,
            ip: details.ip,
            port: details.port,
            online: details.online,
            players: details.players,
            slots: details.slots,
            map: details.map,
        })
    }

    async fn get_leaderboard(
        &self,
        request: &GetLeaderboardRequest,
    ) -> Result<Vec<LeaderboardEntry>, Error> {
        let order = match request.order {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        };
        let mut params = vec![
            ("stat".to_string(), request.statistic.wire_name().to_string()),
            ("order".to_string(), order.to_string()),
        ];
        // The API caps pages at 100 rows; out-of-range limits mean default.
        if let Some(limit) = request.limit.filter(|l| (1..=100).contains(l)) {
            params.push(("limit".to_string(), limit.to_string()));
        }

        debug!(stat = request.statistic.wire_name(), order = order, "fetching leaderboard");
        let http_request = self.http.get(self.server_url("leaderboard")).query(&params);
        let response = self.authed(http_request).await?.send().await?;
        let response = ensure_success(response).await?;

        let leaderboard: LeaderboardResponse = response.json().await?;
        Ok(leaderboard
            .leaderboard
            .into_iter()
            .map(|row| LeaderboardEntry {
                id: PlayerUid::of(row.uid),
                name: row.latest_name,
                rank: row.rank,
                playtime: row.playtime,
                environment_deaths: row.environment_deaths,
                suicides: row.suicides,
            })
            .collect())
    }

    async fn get_player_details(&self, player_id: &PlayerId) -> Result<PlayerDetails, Error> {
        let uid = self.resolve_uid(player_id).await?;
        debug!(uid = %uid, "fetching player details");
        let http_request = self
            .http
            .get(self.server_url("player"))
            .query(&[("uid", uid.as_str())]);
        let response = self.authed(http_request).await?.send().await?;
        let response = ensure_success(response).await?;

        // The endpoint answers with a map keyed by uid.
        let mut players: HashMap<String, PlayerRecord> = response.json().await?;
        let record = players
            .remove(uid.as_str())
            .ok_or_else(|| Error::NotFound(uid.to_string()))?;

        Ok(PlayerDetails {
            names: record.omega.name_history,
            playtime: record.omega.playtime,
            sessions: record.omega.sessions,
            environment_deaths: record.game.general.environment_deaths,
            suicides: record.game.general.suicides,
        })
    }

    async fn delete_player_details(&self, player_id: &PlayerId) -> Result<(), Error> {
        let uid = self.resolve_uid(player_id).await?;
        debug!(uid = %uid, "deleting player details");
        let http_request = self
            .http
            .delete(self.server_url("player"))
            .query(&[("uid", uid.as_str())]);
        let response = self.authed(http_request).await?.send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn get_priority_queue(
        &self,
        player_id: &PlayerId,
    ) -> Result<Option<PriorityQueueEntry>, Error> {
        let uid = self.resolve_uid(player_id).await?;
        debug!(uid = %uid, "fetching priority queue entry");
        let http_request = self
            .http
            .get(self.server_url("queuepriority"))
            .query(&[("uid", uid.as_str())]);
        let response = self.authed(http_request).await?.send().await?;
        let response = ensure_success(response).await?;

        let list: EntryListResponse = response.json().await?;
        list.entries
            .into_iter()
            .next()
            .map(queue_entry_from_wire)
            .transpose()
    }

    async fn put_priority_queue(&self, request: &PutPriorityQueueRequest) -> Result<(), Error> {
        let uid = self.resolve_uid(&request.player_id).await?;
        debug!(uid = %uid, "creating priority queue entry");
        let body = PutEntryBody {
            uid: uid.to_string(),
            comment: request.comment.clone(),
            expires_at: expiration_to_wire(&request.expiration),
        };
        let http_request = self.http.post(self.server_url("queuepriority")).json(&body);
        let response = self.authed(http_request).await?.send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn delete_priority_queue(&self, player_id: &PlayerId) -> Result<(), Error> {
        let uid = self.resolve_uid(player_id).await?;
        debug!(uid = %uid, "deleting priority queue entry");
        let http_request = self
            .http
            .delete(self.server_url("queuepriority"))
            .query(&[("uid", uid.as_str())]);
        let response = self.authed(http_request).await?.send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn get_whitelist(&self, player_id: &PlayerId) -> Result<Option<WhitelistEntry>, Error> {
        let uid = self.resolve_uid(player_id).await?;
        debug!(uid = %uid, "fetching whitelist entry");
        let http_request = self
            .http
            .get(self.server_url("whitelist"))
            .query(&[("uid", uid.as_str())]);
        let response = self.authed(http_request).await?.send().await?;
        let response = ensure_success(response).await?;

        let list: EntryListResponse = response.json().await?;
        list.entries
            .into_iter()
            .next()
            .map(whitelist_entry_from_wire)
            .transpose()
    }

    async fn put_whitelist(&self, request: &PutWhitelistRequest) -> Result<(), Error> {
        let uid = self.resolve_uid(&request.player_id).await?;
        debug!(uid = %uid, "creating whitelist entry");
        let body = PutEntryBody {
            uid: uid.to_string(),
            comment: request.comment.clone(),
            expires_at: expiration_to_wire(&request.expiration),
        };
        let http_request = self.http.post(self.server_url("whitelist")).json(&body);
        let response = self.authed(http_request).await?.send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn delete_whitelist(&self, player_id: &PlayerId) -> Result<(), Error> {
        let uid = self.resolve_uid(player_id).await?;
        debug!(uid = %uid, "deleting whitelist entry");
        let http_request = self
            .http
            .delete(self.server_url("whitelist"))
            .query(&[("uid", uid.as_str())]);
        let response = self.authed(http_request).await?.send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn list_bans(&self, request: &ListBansRequest) -> Result<Vec<BanEntry>, Error> {
        let uid = self.resolve_uid(&request.player_id).await?;
        debug!(list = request.list.as_str(), uid = %uid, "listing bans");
        let http_request = self
            .http
            .get(self.banlist_url(&request.list))
            .query(&[("uid", uid.as_str())]);
        let response = self.authed(http_request).await?.send().await?;
        let response = ensure_success(response).await?;

        let bans: BansResponse = response.json().await?;
        bans.entries.into_iter().map(ban_from_wire).collect()
    }

    async fn put_ban(&self, request: &PutBanRequest) -> Result<(), Error> {
        let uid = self.resolve_uid(&request.player_id).await?;
        debug!(list = request.list.as_str(), uid = %uid, "creating ban");
        let body = PutBanBody {
            uid: uid.to_string(),
            reason: request.reason.clone(),
            expires_at: expiration_to_wire(&request.expiration),
        };
        let http_request = self.http.post(self.banlist_url(&request.list)).json(&body);
        let response = self.authed(http_request).await?.send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn delete_ban(&self, request: &DeleteBanRequest) -> Result<(), Error> {
        let uid = self.resolve_uid(&request.player_id).await?;
        debug!(list = request.list.as_str(), uid = %uid, "deleting ban");
        let http_request = self
            .http
            .delete(self.banlist_url(&request.list))
            .query(&[("uid", uid.as_str())]);
        let response = self.authed(http_request).await?.send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn delete_bans(&self, request: &DeleteBanRequest) -> Result<(), Error> {
        let uid = self.resolve_uid(&request.player_id).await?;
        debug!(list = request.list.as_str(), uid = %uid, "deleting all bans of player");
        let http_request = self
            .http
            .delete(self.banlist_url(&request.list))
            .query(&[("uid", uid.as_str()), ("all", "true")]);
        let response = self.authed(http_request).await?.send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn get_server_info(&self) -> Result<ServerInfo, Error> {
        debug!("fetching server info");
        let response = self
            .authed(self.http.get(self.server_url("info")))
            .await?
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let info: ServerInfoResponse = response.json().await?;
        Ok(ServerInfo {
            nickname: info.nickname,
            owner: PlayerUid::of(info.owner),
            game: game_from_wire(&info.game)?,
        })
    }

    async fn list_game_sessions(&self) -> Result<Vec<GameSession>, Error> {
        debug!("listing game sessions");
        let response = self
            .authed(self.http.get(self.server_url("sessions")))
            .await?
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let sessions: SessionsResponse = response.json().await?;
        sessions
            .sessions
            .into_iter()
            .map(|record| {
                Ok(GameSession {
                    id: GameSessionId::of(record.id),
                    player: PlayerUid::of(record.uid),
                    player_name: record.player_name,
                    created_at: parse_timestamp(&record.created_at)?,
                })
            })
            .collect()
    }

    async fn teleport(&self, request: &TeleportRequest) -> Result<(), Error> {
        debug!(session = request.session.as_str(), "teleporting player");
        let body = TeleportBody {
            session_id: request.session.as_str().to_string(),
            coordinates: [
                request.coordinates.x,
                request.coordinates.y,
                request.coordinates.z,
            ],
        };
        let http_request = self
            .http
            .post(self.server_url("action/teleport"))
            .json(&body);
        let response = self.authed(http_request).await?.send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn spawn_item(&self, request: &SpawnItemRequest) -> Result<(), Error> {
        debug!(session = request.session.as_str(), item = %request.item_class, "spawning item");
        let body = SpawnItemBody {
            session_id: request.session.as_str().to_string(),
            item_class: request.item_class.clone(),
            quantity: request.quantity,
        };
        let http_request = self.http.post(self.server_url("action/spawn")).json(&body);
        let response = self.authed(http_request).await?.send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn kill_player(&self, session: &GameSessionId) -> Result<(), Error> {
        debug!(session = session.as_str(), "killing player");
        let body = SessionActionBody {
            session_id: session.as_str().to_string(),
        };
        let http_request = self.http.post(self.server_url("action/kill")).json(&body);
        let response = self.authed(http_request).await?.send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn heal_player(&self, session: &GameSessionId) -> Result<(), Error> {
        debug!(session = session.as_str(), "healing player");
        let body = SessionActionBody {
            session_id: session.as_str().to_string(),
        };
        let http_request = self.http.post(self.server_url("action/heal")).json(&body);
        let response = self.authed(http_request).await?.send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn resolve(&self, player_id: &PlayerId) -> Result<PlayerUid, Error> {
        self.resolve_uid(player_id).await
    }
}
