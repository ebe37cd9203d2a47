// Bomb entity and the blast propagation rule.

use super::grid::{TileCoord, TileGrid, WorldPos};
use super::player::{Player, PlayerId};

/// Client-supplied bomb identifier, unique per owner while armed.
pub type BombId = u64;

/// Session-wide bomb key; ids are only scoped per owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BombKey {
    pub owner: PlayerId,
    pub id: BombId,
}

#[derive(Debug, Clone)]
pub struct Bomb {
    pub key: BombKey,
    // Always a tile center.
    pub pos: WorldPos,
}

/// Result of one detonation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detonation {
    /// Bomb tile first, then each arm outward in up/down/left/right order.
    pub explosion_tiles: Vec<TileCoord>,
    pub killed: Vec<PlayerId>,
}

// Up, down, left, right (+y is down on screen).
const ARMS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

impl Bomb {
    pub fn new(owner: PlayerId, id: BombId, pos: WorldPos) -> Self {
        Self {
            key: BombKey { owner, id },
            pos,
        }
    }

    /// Computes the blast from this bomb's tile.
    ///
    /// Each arm extends up to `radius` tiles and stops before the first solid tile, so walls
    /// shield whatever is behind them. The bomb tile is always part of the blast even when
    /// `radius` is zero. A player is caught when its position resolves to a blast tile.
    pub fn detonate<'a>(
        &self,
        grid: &TileGrid,
        radius: u32,
        players: impl IntoIterator<Item = &'a Player>,
    ) -> Detonation {
        let origin = grid.tile_of(self.pos);
        let reach = i32::try_from(radius).unwrap_or(i32::MAX);

        let mut tiles = vec![origin];
        for (dx, dy) in ARMS {
            for step in 1..=reach {
                let tile = origin.offset(dx * step, dy * step);
                if grid.is_solid(tile.x, tile.y) {
                    break;
                }
                tiles.push(tile);
            }
        }

        let killed = players
            .into_iter()
            .filter(|p| tiles.contains(&grid.tile_of(p.pos)))
            .map(|p| p.id)
            .collect();

        Detonation {
            explosion_tiles: tiles,
            killed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::grid_from_rows;

    const TILE: f32 = 40.0;
    const NOBODY: [Player; 0] = [];

    fn player_on(id: PlayerId, tx: i32, ty: i32) -> Player {
        // Put players off-center to exercise the floor mapping.
        let mut p = Player::spawn(id, TileCoord::new(tx, ty), TILE);
        p.pos.x += 3.0;
        p.pos.y += 37.0;
        p
    }

    fn bomb_on(grid: &TileGrid, tx: i32, ty: i32) -> Bomb {
        Bomb::new(1, 7, grid.tile_center(TileCoord::new(tx, ty)))
    }

    #[test]
    fn when_wall_is_east_of_bomb_then_blast_has_no_east_arm() {
        // Bomb sits at (2, 3) with a wall right next to it.
        let grid = grid_from_rows(
            &[
                ".......",
                ".......",
                "...#...",
                "...#...",
                ".......",
                ".......",
            ],
            TILE,
        );
        let bomb = bomb_on(&grid, 2, 3);

        let result = bomb.detonate(&grid, 2, &NOBODY);

        assert_eq!(
            result.explosion_tiles,
            vec![
                TileCoord::new(2, 3),
                TileCoord::new(2, 2),
                TileCoord::new(2, 1),
                TileCoord::new(2, 4),
                TileCoord::new(2, 5),
                TileCoord::new(1, 3),
                TileCoord::new(0, 3),
            ]
        );
    }

    #[test]
    fn when_wall_is_two_tiles_away_then_arm_stops_before_it() {
        let grid = grid_from_rows(&["......", "....#."], TILE);
        let bomb = bomb_on(&grid, 2, 1);

        let result = bomb.detonate(&grid, 3, &NOBODY);

        assert!(result.explosion_tiles.contains(&TileCoord::new(3, 1)));
        assert!(!result.explosion_tiles.contains(&TileCoord::new(4, 1)));
        assert!(!result.explosion_tiles.contains(&TileCoord::new(5, 1)));
    }

    #[test]
    fn when_bomb_is_at_map_edge_then_blast_stays_inside_the_grid() {
        let grid = grid_from_rows(&["...", "...", "..."], TILE);
        let bomb = bomb_on(&grid, 0, 0);

        let result = bomb.detonate(&grid, 2, &NOBODY);

        assert_eq!(
            result.explosion_tiles,
            vec![
                TileCoord::new(0, 0),
                TileCoord::new(0, 1),
                TileCoord::new(0, 2),
                TileCoord::new(1, 0),
                TileCoord::new(2, 0),
            ]
        );
    }

    #[test]
    fn when_radius_is_zero_then_only_the_bomb_tile_explodes() {
        let grid = grid_from_rows(&["...", "...", "..."], TILE);
        let bomb = bomb_on(&grid, 1, 1);
        let victim = player_on(5, 1, 1);
        let neighbour = player_on(6, 1, 2);

        let result = bomb.detonate(&grid, 0, [&victim, &neighbour]);

        assert_eq!(result.explosion_tiles, vec![TileCoord::new(1, 1)]);
        assert_eq!(result.killed, vec![5]);
    }

    #[test]
    fn when_players_are_inside_or_just_outside_the_blast_then_only_inside_ones_die() {
        let grid = grid_from_rows(
            &[
                ".......",
                ".......",
                ".......",
                ".......",
                ".......",
                ".......",
                ".......",
            ],
            TILE,
        );
        let bomb = bomb_on(&grid, 3, 3);
        let players = [
            player_on(1, 3, 3), // on the bomb
            player_on(2, 3, 1), // end of north arm
            player_on(3, 5, 3), // end of east arm
            player_on(4, 3, 0), // one past north arm
            player_on(5, 6, 3), // one past east arm
            player_on(6, 0, 3), // one past west arm
            player_on(7, 3, 6), // one past south arm
            player_on(8, 4, 4), // diagonal
        ];

        let result = bomb.detonate(&grid, 2, players.iter());

        assert_eq!(result.killed, vec![1, 2, 3]);
    }

    #[test]
    fn when_wall_shields_a_player_then_player_survives() {
        let grid = grid_from_rows(&[".....", ".#...", "....."], TILE);
        let bomb = bomb_on(&grid, 2, 1);
        let hidden = player_on(1, 0, 1);
        let exposed = player_on(2, 4, 1);

        let result = bomb.detonate(&grid, 2, [&hidden, &exposed]);

        assert_eq!(result.killed, vec![2]);
    }
}
