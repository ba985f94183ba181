//! Cache key construction
//!
//! Keys are `<op>:<scope>:<part>:<part>…` — operation tag first, then the
//! server scope, then the request's identifying parts in a fixed order.
//! Two clients bound to different servers can therefore share one cache
//! without their entries colliding.

use crate::types::ServerApiId;

/// Operations whose responses are memoized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachedOperation {
    AppGrants,
    PriorityQueue,
    GameSessions,
    ServerInfo,
    PlayerDetails,
    GameServerDetails,
    Leaderboard,
    Whitelist,
    Banlist,
    Resolve,
}

impl CachedOperation {
    pub fn tag(&self) -> &'static str {
        match self {
            CachedOperation::AppGrants => "app-grants",
            CachedOperation::PriorityQueue => "priority-queue",
            CachedOperation::GameSessions => "game-sessions",
            CachedOperation::ServerInfo => "server-info",
            CachedOperation::PlayerDetails => "player-details",
            CachedOperation::GameServerDetails => "game-server-details",
            CachedOperation::Leaderboard => "leaderboard",
            CachedOperation::Whitelist => "whitelist",
            CachedOperation::Banlist => "banlist",
            CachedOperation::Resolve => "resolve",
        }
    }
}

/// Builds cache keys scoped to one server registration.
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    scope: ServerApiId,
}

impl CacheKeyBuilder {
    pub fn new(scope: ServerApiId) -> Self {
        Self { scope }
    }

    /// Key for an operation with identifying parts.
    ///
    /// Callers pass parts in a fixed order per operation, so the same
    /// logical request always produces the same key.
    pub fn build(&self, op: CachedOperation, parts: &[&str]) -> String {
        let mut key = String::with_capacity(64);
        key.push_str(op.tag());
        key.push(':');
        key.push_str(self.scope.as_str());
        for part in parts {
            key.push(':');
            key.push_str(part);
        }
        key
    }

    /// Fixed key for an operation with no identifying parameters.
    pub fn fixed(&self, op: CachedOperation) -> String {
        self.build(op, &[])
    }
}
