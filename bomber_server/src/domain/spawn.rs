// Pool of free spawn coordinates for one session.

use super::grid::TileCoord;
use std::collections::{HashSet, VecDeque};

/// Hands out spawn points oldest-released-first.
///
/// The allocator does not track who holds a coordinate; the session releases each
/// coordinate exactly once when its holder dies or leaves. Repeated points in the initial
/// set are kept once, at their first position.
#[derive(Debug, Clone)]
pub struct SpawnAllocator {
    available: VecDeque<TileCoord>,
}

impl SpawnAllocator {
    pub fn new(points: impl IntoIterator<Item = TileCoord>) -> Self {
        let mut seen = HashSet::new();
        Self {
            available: points.into_iter().filter(|p| seen.insert(*p)).collect(),
        }
    }

    /// Removes the oldest available coordinate, or `None` when the pool is exhausted.
    pub fn take(&mut self) -> Option<TileCoord> {
        self.available.pop_front()
    }

    pub fn release(&mut self, coord: TileCoord) {
        self.available.push_back(coord);
    }

    pub fn available(&self) -> impl Iterator<Item = &TileCoord> {
        self.available.iter()
    }

    pub fn len(&self) -> usize {
        self.available.len()
    }

    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_taking_then_points_come_out_in_insertion_order() {
        let mut pool = SpawnAllocator::new([TileCoord::new(2, 5), TileCoord::new(13, 1)]);

        assert_eq!(pool.take(), Some(TileCoord::new(2, 5)));
        assert_eq!(pool.take(), Some(TileCoord::new(13, 1)));
        assert_eq!(pool.take(), None);
        assert!(pool.is_empty());
    }

    #[test]
    fn when_initial_set_repeats_a_point_then_it_is_pooled_once() {
        let mut pool = SpawnAllocator::new([
            TileCoord::new(1, 1),
            TileCoord::new(2, 2),
            TileCoord::new(1, 1),
        ]);

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.take(), Some(TileCoord::new(1, 1)));
        assert_eq!(pool.take(), Some(TileCoord::new(2, 2)));
        assert_eq!(pool.take(), None);
    }

    #[test]
    fn when_released_then_point_goes_behind_the_ones_already_waiting() {
        let mut pool = SpawnAllocator::new([
            TileCoord::new(1, 1),
            TileCoord::new(2, 2),
            TileCoord::new(3, 3),
        ]);

        let first = pool.take().expect("pool should not be empty");
        pool.release(first);

        let order: Vec<TileCoord> = pool.available().copied().collect();
        assert_eq!(
            order,
            vec![TileCoord::new(2, 2), TileCoord::new(3, 3), TileCoord::new(1, 1)]
        );
        assert_eq!(pool.len(), 3);
    }
}
