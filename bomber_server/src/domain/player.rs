// Per-connection player state.

use super::grid::{TileCoord, WorldPos};

/// Connection-derived player identity, unique within a session.
pub type PlayerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub pos: WorldPos,
    pub facing: Facing,
    // Held only so it can go back to the pool on death or disconnect.
    pub spawn_point: TileCoord,
}

impl Player {
    /// Places a new player on the top-left corner of its spawn tile, facing down.
    pub fn spawn(id: PlayerId, spawn_point: TileCoord, tile_size: f32) -> Self {
        Self {
            id,
            pos: WorldPos::new(
                spawn_point.x as f32 * tile_size,
                spawn_point.y as f32 * tile_size,
            ),
            facing: Facing::default(),
            spawn_point,
        }
    }
}

/// Position record shared with clients.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub facing: Facing,
}

impl From<&Player> for PlayerSnapshot {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            x: p.pos.x,
            y: p.pos.y,
            facing: p.facing,
        }
    }
}
