// Wire protocol DTOs and conversions for public game server messages.
// Internal service-to-service DTOs live next to their routes in `net::internal`.

use crate::domain::{BombId, Facing, PlayerSnapshot, WorldPos};
use crate::use_cases::{MapDescription, ServerEvent};
use serde::{Deserialize, Serialize};

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // A player entered the session (broadcast on join, replayed to the joiner).
    NewPlayer(PlayerDto),
    // Identity and spawn position, sent only to the joining connection.
    AssignId { id: String, x: f32, y: f32 },
    RemovePlayer { id: String },
    KillPlayer { id: String },
    // Snapped bomb position, echoed to the whole session.
    PlaceBomb { id: BombId, x: f32, y: f32 },
    Detonate { id: BombId, explosions: Vec<PointDto> },
    MovePlayer(MovePlayerStateDto),
    // Join was refused (e.g. no spawn point left); the connection stays open.
    JoinRefused { reason: String },
    Error { message: String },
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    RegisterMap(MapDto),
    NewPlayer,
    MovePlayer(MovePlayerDto),
    PlaceBomb(PlaceBombDto),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingDto {
    Up,
    Down,
    Left,
    Right,
}

impl From<FacingDto> for Facing {
    fn from(facing: FacingDto) -> Self {
        match facing {
            FacingDto::Up => Facing::Up,
            FacingDto::Down => Facing::Down,
            FacingDto::Left => Facing::Left,
            FacingDto::Right => Facing::Right,
        }
    }
}

impl From<Facing> for FacingDto {
    fn from(facing: Facing) -> Self {
        match facing {
            Facing::Up => FacingDto::Up,
            Facing::Down => FacingDto::Down,
            Facing::Left => FacingDto::Left,
            Facing::Right => FacingDto::Right,
        }
    }
}

/// Tile map as sent by the client: row-major, 0 = open, non-zero = solid.
#[derive(Debug, Clone, Deserialize)]
pub struct MapDto {
    pub width: u32,
    pub height: u32,
    pub tiles: Vec<u8>,
}

impl From<MapDto> for MapDescription {
    fn from(map: MapDto) -> Self {
        Self {
            width: map.width,
            height: map.height,
            tiles: map.tiles,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovePlayerDto {
    pub x: f32,
    pub y: f32,
    pub facing: FacingDto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceBombDto {
    pub id: BombId,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerDto {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub facing: FacingDto,
}

impl From<&PlayerSnapshot> for PlayerDto {
    fn from(player: &PlayerSnapshot) -> Self {
        Self {
            id: player.id.to_string(),
            x: player.x,
            y: player.y,
            facing: player.facing.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MovePlayerStateDto {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub facing: FacingDto,
    // Present on periodic broadcasts only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointDto {
    pub x: f32,
    pub y: f32,
}

impl From<WorldPos> for PointDto {
    fn from(pos: WorldPos) -> Self {
        Self { x: pos.x, y: pos.y }
    }
}

impl From<ServerEvent> for ServerMessage {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::NewPlayer(player) => ServerMessage::NewPlayer(PlayerDto::from(&player)),
            ServerEvent::AssignId { id, x, y } => ServerMessage::AssignId {
                id: id.to_string(),
                x,
                y,
            },
            ServerEvent::RemovePlayer { id } => ServerMessage::RemovePlayer { id: id.to_string() },
            ServerEvent::KillPlayer { id } => ServerMessage::KillPlayer { id: id.to_string() },
            ServerEvent::PlaceBomb { id, x, y } => ServerMessage::PlaceBomb { id, x, y },
            ServerEvent::Detonate { id, explosions } => ServerMessage::Detonate {
                id,
                explosions: explosions.into_iter().map(PointDto::from).collect(),
            },
            ServerEvent::MovePlayer { player, timestamp } => {
                ServerMessage::MovePlayer(MovePlayerStateDto {
                    id: player.id.to_string(),
                    x: player.x,
                    y: player.y,
                    facing: player.facing.into(),
                    timestamp,
                })
            }
            ServerEvent::JoinRefused { reason } => ServerMessage::JoinRefused {
                reason: reason.to_string(),
            },
            ServerEvent::Error { error } => ServerMessage::Error {
                message: error.to_string(),
            },
        }
    }
}
