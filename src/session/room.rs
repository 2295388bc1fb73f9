//! Rooms: the lobby-level container around one game.
//!
//! A room has a roster of named seats. Each seat gets a stable `PlayerId`
//! the first time its name joins and keeps it for the life of the room.
//! Transport connections come and go; a seat is bound to at most one
//! `ConnectionId` at a time.

use serde::{Deserialize, Serialize};

use crate::core::{GameState, PlayerId};
use crate::rules::Engine;

/// Room identifier chosen by the client that creates it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transport connection, assigned by the orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoomStatus {
    Waiting,
    Active,
    Finished,
}

/// A named seat in a room.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomPlayer {
    pub id: PlayerId,
    pub name: String,
    pub is_ready: bool,
    pub connection: Option<ConnectionId>,
}

impl RoomPlayer {
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}

/// Engine and snapshot of a running game.
#[derive(Clone, Debug)]
pub struct ActiveGame {
    pub engine: Engine,
    pub state: GameState,
}

/// A room and, once started, its game.
#[derive(Clone, Debug)]
pub struct Room {
    pub id: RoomId,
    pub host: PlayerId,
    pub players: Vec<RoomPlayer>,
    pub capacity: usize,
    pub is_public: bool,
    pub status: RoomStatus,
    pub game: Option<ActiveGame>,
    pub created_at: u64,

    /// Set while an elimination timer is armed for the current explosion.
    pub elimination_armed: bool,

    next_player_id: u32,
}

impl Room {
    /// Create a public room whose first member is the host.
    #[must_use]
    pub fn new(id: RoomId, host_name: &str, connection: ConnectionId, capacity: usize, now: u64) -> Self {
        let mut room = Self {
            id,
            host: PlayerId::new(0),
            players: Vec::new(),
            capacity,
            is_public: true,
            status: RoomStatus::Waiting,
            game: None,
            created_at: now,
            elimination_armed: false,
            next_player_id: 0,
        };
        room.host = room.add_member(host_name, connection);
        room
    }

    /// Add a seat and bind it to `connection`.
    pub fn add_member(&mut self, name: &str, connection: ConnectionId) -> PlayerId {
        let id = PlayerId::new(self.next_player_id);
        self.next_player_id += 1;
        self.players.push(RoomPlayer {
            id,
            name: name.to_owned(),
            is_ready: false,
            connection: Some(connection),
        });
        id
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity
    }

    #[must_use]
    pub fn member(&self, id: PlayerId) -> Option<&RoomPlayer> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn member_mut(&mut self, id: PlayerId) -> Option<&mut RoomPlayer> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    #[must_use]
    pub fn member_by_name(&self, name: &str) -> Option<&RoomPlayer> {
        self.players.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn member_by_connection(&self, connection: ConnectionId) -> Option<&RoomPlayer> {
        self.players.iter().find(|p| p.connection == Some(connection))
    }

    /// Connections of every connected member, in seat order.
    pub fn connections(&self) -> impl Iterator<Item = (PlayerId, ConnectionId)> + '_ {
        self.players
            .iter()
            .filter_map(|p| p.connection.map(|c| (p.id, c)))
    }

    #[must_use]
    pub fn connected_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_connected()).count()
    }

    /// Pass the host role to the first connected member if the current
    /// host is gone or disconnected.
    pub fn reassign_host(&mut self) {
        let host_present = self.member(self.host).is_some_and(RoomPlayer::is_connected);
        if host_present {
            return;
        }
        if let Some(next) = self.players.iter().find(|p| p.is_connected()) {
            self.host = next.id;
        }
    }

    /// Every member other than the host is ready.
    #[must_use]
    pub fn all_ready(&self) -> bool {
        self.players.iter().filter(|p| p.id != self.host).all(|p| p.is_ready)
    }

    /// Seats in roster order, for dealing.
    #[must_use]
    pub fn seats(&self) -> Vec<(PlayerId, String)> {
        self.players.iter().map(|p| (p.id, p.name.clone())).collect()
    }

    /// Wire summary, never including game state.
    #[must_use]
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id.clone(),
            host_id: self.host,
            players: self
                .players
                .iter()
                .map(|p| RoomPlayerSummary {
                    id: p.id,
                    name: p.name.clone(),
                    is_ready: p.is_ready,
                    is_host: p.id == self.host,
                    is_connected: p.is_connected(),
                })
                .collect(),
            max_players: self.capacity,
            is_public: self.is_public,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub is_ready: bool,
    pub is_host: bool,
    pub is_connected: bool,
}

/// Room as sent to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomId,
    pub host_id: PlayerId,
    pub players: Vec<RoomPlayerSummary>,
    pub max_players: usize,
    pub is_public: bool,
    pub status: RoomStatus,
    pub created_at: u64,
}
