// Gameplay tuning for bombs and the session grid.
//
// Keep this separate from runtime/server configuration (channel sizes, ports, etc.).

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct BombTuning {
    /// Delay between placement and detonation.
    pub fuse: Duration,

    /// Blast reach in tiles along each cardinal direction.
    pub radius: u32,
}

impl Default for BombTuning {
    fn default() -> Self {
        Self {
            fuse: Duration::from_millis(2000),
            radius: 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionTuning {
    /// Edge length of one tile in world pixels.
    pub tile_size: f32,

    pub bomb: BombTuning,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            tile_size: 40.0,
            bomb: BombTuning::default(),
        }
    }
}
