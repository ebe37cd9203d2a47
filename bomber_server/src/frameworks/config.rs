use crate::domain::{BombTuning, SessionTuning, TileCoord};
use std::{env, str::FromStr, time::Duration};

// Runtime/server settings read from the environment, with gameplay defaults.

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub fn http_port() -> u16 {
    env_or("BOMBER_SERVER_PORT", 8000)
}

pub fn broadcast_interval() -> Duration {
    Duration::from_millis(env_or("BROADCAST_INTERVAL_MS", 100u64).max(1))
}

pub fn session_tuning() -> SessionTuning {
    let defaults = SessionTuning::default();
    let tile_size = env_or("TILE_SIZE", defaults.tile_size);
    SessionTuning {
        // A non-positive tile size would make every map invalid.
        tile_size: if tile_size.is_finite() && tile_size > 0.0 {
            tile_size
        } else {
            defaults.tile_size
        },
        bomb: BombTuning {
            fuse: Duration::from_millis(env_or(
                "BOMB_FUSE_MS",
                defaults.bomb.fuse.as_millis() as u64,
            )),
            radius: env_or("BOMB_RADIUS", defaults.bomb.radius),
        },
    }
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const EVENT_BROADCAST_CAPACITY: usize = 512;

// Session that exists from startup and serves clients that do not pick one.
pub const DEFAULT_SESSION_ID: &str = "default";

pub const DEFAULT_SPAWN_POINTS: [TileCoord; 4] = [
    TileCoord::new(2, 5),
    TileCoord::new(13, 1),
    TileCoord::new(2, 1),
    TileCoord::new(12, 6),
];
