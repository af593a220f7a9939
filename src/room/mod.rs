//! Multiplayer rooms: the record shared through the store and its directory

pub mod directory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::GameSnapshot;
use crate::store::StoreError;

pub use directory::RoomDirectory;

/// Player identifier within a room
pub type PlayerId = Uuid;

/// Store key of a room record
pub fn room_key(room_id: &str) -> String {
    format!("room:{}", room_id)
}

/// One of the two seats in a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSlot {
    pub id: PlayerId,
    pub name: String,
    pub ready: bool,
}

impl PlayerSlot {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            ready: false,
        }
    }
}

/// Room record as stored under `room:<roomId>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: String,
    pub host: PlayerSlot,
    pub guest: Option<PlayerSlot>,
    pub game_started: bool,
    /// Player allowed to act and publish snapshots
    pub current_turn: PlayerId,
    pub game_state: Option<GameSnapshot>,
    pub last_updated: DateTime<Utc>,
    /// Bumped on every write
    #[serde(default)]
    pub revision: u64,
}

impl Room {
    pub fn new(room_id: String, host: PlayerSlot) -> Self {
        Self {
            room_id,
            current_turn: host.id,
            host,
            guest: None,
            game_started: false,
            game_state: None,
            last_updated: Utc::now(),
            revision: 0,
        }
    }

    pub fn is_full(&self) -> bool {
        self.guest.is_some()
    }

    pub fn both_ready(&self) -> bool {
        self.host.ready && self.guest.as_ref().is_some_and(|g| g.ready)
    }

    /// The seat occupied by `player`, if any
    pub fn slot(&self, player: PlayerId) -> Option<&PlayerSlot> {
        if self.host.id == player {
            return Some(&self.host);
        }
        self.guest.as_ref().filter(|g| g.id == player)
    }

    fn slot_mut(&mut self, player: PlayerId) -> Option<&mut PlayerSlot> {
        if self.host.id == player {
            return Some(&mut self.host);
        }
        self.guest.as_mut().filter(|g| g.id == player)
    }

    /// The seat across from `player`
    pub fn opponent_of(&self, player: PlayerId) -> Option<&PlayerSlot> {
        if self.host.id == player {
            self.guest.as_ref()
        } else {
            Some(&self.host)
        }
    }

    pub fn is_turn_of(&self, player: PlayerId) -> bool {
        self.current_turn == player
    }

    /// Mark the record as written
    fn touch(&mut self) {
        self.revision += 1;
        self.last_updated = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Guest,
}

/// A local player's seat in a room, returned by create/join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub room_id: String,
    pub player_id: PlayerId,
    pub player_name: String,
    pub role: Role,
}

impl Membership {
    pub fn is_host(&self) -> bool {
        self.role == Role::Host
    }
}

/// Room directory errors
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("room {0} not found")]
    NotFound(String),

    #[error("room {0} is full")]
    Full(String),

    #[error("no free room id after {0} attempts")]
    NoFreeId(usize),

    #[error("not your turn")]
    NotYourTurn,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("room record is malformed: {0}")]
    Codec(#[from] serde_json::Error),
}
