// Domain layer: tile grid, entities and the rules that need no clock or transport.

pub mod bomb;
pub mod errors;
pub mod grid;
pub mod player;
pub mod spawn;
pub mod tuning;

pub use bomb::{Bomb, BombId, BombKey, Detonation};
pub use errors::SessionError;
pub use grid::{TileCoord, TileGrid, WorldPos};
pub use player::{Facing, Player, PlayerId, PlayerSnapshot};
pub use spawn::SpawnAllocator;
pub use tuning::{BombTuning, SessionTuning};
