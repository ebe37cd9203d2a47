// Immutable tile grid used for bomb snapping and blast propagation.

use super::errors::SessionError;

/// Discrete tile index (column, row). Spawn points use the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Continuous world-space position in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

impl WorldPos {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Rectangular map of open and solid tiles.
///
/// World coordinates map to tiles with `floor(coord / tile_size)`. Positions outside the
/// grid are clamped to the nearest edge tile, so every world point resolves to a tile that
/// exists. Index lookups through [`TileGrid::is_solid`] do not clamp: anything outside the
/// grid counts as solid, which stops blasts at the map edge.
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tile_size: f32,
    solid: Vec<bool>,
}

impl TileGrid {
    /// Builds a grid from row-major tiles where `0` is open and anything else is solid.
    pub fn from_tiles(
        width: u32,
        height: u32,
        tiles: &[u8],
        tile_size: f32,
    ) -> Result<Self, SessionError> {
        if width == 0 || height == 0 {
            return Err(SessionError::InvalidMap);
        }
        if !(tile_size.is_finite() && tile_size > 0.0) {
            return Err(SessionError::InvalidMap);
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or(SessionError::InvalidMap)?;
        if tiles.len() != expected {
            return Err(SessionError::InvalidMap);
        }
        // Tile indices are i32 in the rest of the domain.
        if width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(SessionError::InvalidMap);
        }

        Ok(Self {
            width,
            height,
            tile_size,
            solid: tiles.iter().map(|&t| t != 0).collect(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns true for solid tiles and for any index outside the grid.
    pub fn is_solid(&self, tx: i32, ty: i32) -> bool {
        if tx < 0 || ty < 0 || tx >= self.width as i32 || ty >= self.height as i32 {
            return true;
        }
        self.solid[ty as usize * self.width as usize + tx as usize]
    }

    /// Tile containing the world position, clamped into the grid.
    pub fn tile_of(&self, pos: WorldPos) -> TileCoord {
        TileCoord {
            x: clamp_axis(pos.x, self.tile_size, self.width),
            y: clamp_axis(pos.y, self.tile_size, self.height),
        }
    }

    /// World-space center of a tile.
    pub fn tile_center(&self, tile: TileCoord) -> WorldPos {
        let half = self.tile_size / 2.0;
        WorldPos {
            x: tile.x as f32 * self.tile_size + half,
            y: tile.y as f32 * self.tile_size + half,
        }
    }

    /// Snaps a world point to the center of its (clamped) tile.
    pub fn nearest_tile_center(&self, x: f32, y: f32) -> WorldPos {
        self.tile_center(self.tile_of(WorldPos { x, y }))
    }
}

fn clamp_axis(coord: f32, tile_size: f32, tiles: u32) -> i32 {
    // `as` saturates and maps NaN to 0, so hostile input still lands on a real tile.
    let index = (coord / tile_size).floor() as i64;
    index.clamp(0, tiles as i64 - 1) as i32
}

#[cfg(test)]
pub(crate) fn grid_from_rows(rows: &[&str], tile_size: f32) -> TileGrid {
    // '#' is solid, anything else is open.
    let height = rows.len() as u32;
    let width = rows.first().map(|r| r.len()).unwrap_or(0) as u32;
    let tiles: Vec<u8> = rows
        .iter()
        .flat_map(|r| r.bytes().map(|b| u8::from(b == b'#')))
        .collect();
    TileGrid::from_tiles(width, height, &tiles, tile_size).expect("test grid should be valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_point_is_inside_a_tile_then_nearest_center_is_that_tiles_center() {
        let grid = grid_from_rows(&["....", "....", "...."], 40.0);

        assert_eq!(grid.nearest_tile_center(41.0, 79.9), WorldPos::new(60.0, 60.0));
        assert_eq!(grid.nearest_tile_center(0.0, 0.0), WorldPos::new(20.0, 20.0));
        assert_eq!(grid.nearest_tile_center(159.9, 119.9), WorldPos::new(140.0, 100.0));
    }

    #[test]
    fn when_point_is_outside_the_grid_then_it_clamps_to_the_edge_tile() {
        let grid = grid_from_rows(&["....", "....", "...."], 40.0);

        assert_eq!(grid.nearest_tile_center(-5.0, -500.0), WorldPos::new(20.0, 20.0));
        assert_eq!(grid.nearest_tile_center(160.0, 120.0), WorldPos::new(140.0, 100.0));
        assert_eq!(grid.nearest_tile_center(1.0e9, 50.0), WorldPos::new(140.0, 60.0));
        assert_eq!(grid.tile_of(WorldPos::new(f32::NAN, f32::INFINITY)), TileCoord::new(0, 2));
    }

    #[test]
    fn when_index_is_out_of_bounds_then_tile_is_solid() {
        let grid = grid_from_rows(&[".#", ".."], 40.0);

        assert!(!grid.is_solid(0, 0));
        assert!(grid.is_solid(1, 0));
        assert!(grid.is_solid(-1, 0));
        assert!(grid.is_solid(0, -1));
        assert!(grid.is_solid(2, 1));
        assert!(grid.is_solid(0, 2));
    }

    #[test]
    fn when_tile_count_does_not_match_dimensions_then_map_is_invalid() {
        assert_eq!(
            TileGrid::from_tiles(3, 2, &[0; 5], 40.0).unwrap_err(),
            SessionError::InvalidMap
        );
        assert_eq!(
            TileGrid::from_tiles(0, 0, &[], 40.0).unwrap_err(),
            SessionError::InvalidMap
        );
        assert_eq!(
            TileGrid::from_tiles(1, 1, &[0], 0.0).unwrap_err(),
            SessionError::InvalidMap
        );
    }
}
