// Use-case level inputs/outputs for the session task.

use crate::domain::{BombId, BombKey, Facing, PlayerId, PlayerSnapshot, SessionError, WorldPos};
use axum::extract::ws::Utf8Bytes;

/// Map description as received from a client, before it becomes a tile grid.
#[derive(Debug, Clone)]
pub struct MapDescription {
    pub width: u32,
    pub height: u32,
    // Row-major, 0 = open, anything else = solid.
    pub tiles: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum GameEvent {
    Connect {
        player_id: PlayerId,
    },
    RegisterMap {
        player_id: PlayerId,
        map: MapDescription,
    },
    Join {
        player_id: PlayerId,
    },
    Move {
        player_id: PlayerId,
        pos: WorldPos,
        facing: Facing,
    },
    PlaceBomb {
        player_id: PlayerId,
        bomb_id: BombId,
        x: f32,
        y: f32,
    },
    Leave {
        player_id: PlayerId,
    },
    // Posted by a bomb's fuse timer.
    FuseExpired {
        key: BombKey,
    },
}

/// Who in the session should receive an outbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    All,
    Only(PlayerId),
    AllExcept(PlayerId),
}

impl Recipient {
    pub fn includes(&self, player_id: PlayerId) -> bool {
        match *self {
            Recipient::All => true,
            Recipient::Only(id) => id == player_id,
            Recipient::AllExcept(id) => id != player_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    NewPlayer(PlayerSnapshot),
    AssignId {
        id: PlayerId,
        x: f32,
        y: f32,
    },
    RemovePlayer {
        id: PlayerId,
    },
    KillPlayer {
        id: PlayerId,
    },
    PlaceBomb {
        id: BombId,
        x: f32,
        y: f32,
    },
    Detonate {
        id: BombId,
        explosions: Vec<WorldPos>,
    },
    // Relayed moves carry no timestamp; broadcast ticks do (Unix epoch millis).
    MovePlayer {
        player: PlayerSnapshot,
        timestamp: Option<u64>,
    },
    JoinRefused {
        reason: SessionError,
    },
    Error {
        error: SessionError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub recipient: Recipient,
    pub event: ServerEvent,
}

/// An outbound event serialized once for every connection in the session.
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    pub recipient: Recipient,
    pub bytes: Utf8Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Closed,
}
