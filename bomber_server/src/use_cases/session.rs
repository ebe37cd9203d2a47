// Session aggregate: every rule that spans players, bombs, spawn points and the map.
//
// Nothing here knows about clocks or sockets. The session task in `game.rs` feeds it
// events one at a time and turns the return values into outbound messages.

use crate::domain::{
    Bomb, BombId, BombKey, Detonation, Facing, Player, PlayerId, PlayerSnapshot, SessionError,
    SessionTuning, SpawnAllocator, TileCoord, TileGrid, WorldPos,
};
use std::collections::BTreeMap;

/// Data produced by a successful join.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// The new player as the rest of the session should see it.
    pub player: PlayerSnapshot,
    /// Players that were live before the join, for replay to the joiner.
    pub roster: Vec<PlayerSnapshot>,
}

pub struct GameSession {
    tuning: SessionTuning,
    grid: Option<TileGrid>,
    players: BTreeMap<PlayerId, Player>,
    // Keyed by (owner, id) so bombs outlive their owner's player record.
    bombs: BTreeMap<BombKey, Bomb>,
    spawns: SpawnAllocator,
}

impl GameSession {
    pub fn new(spawn_points: impl IntoIterator<Item = TileCoord>, tuning: SessionTuning) -> Self {
        Self {
            tuning,
            grid: None,
            players: BTreeMap::new(),
            bombs: BTreeMap::new(),
            spawns: SpawnAllocator::new(spawn_points),
        }
    }

    pub fn tuning(&self) -> &SessionTuning {
        &self.tuning
    }

    pub fn grid(&self) -> Option<&TileGrid> {
        self.grid.as_ref()
    }

    /// Installs the session map. Returns false when a map is already in place; the first
    /// registration stays authoritative.
    pub fn register_map(&mut self, grid: TileGrid) -> bool {
        if self.grid.is_some() {
            return false;
        }
        self.grid = Some(grid);
        true
    }

    pub fn join(&mut self, player_id: PlayerId) -> Result<JoinOutcome, SessionError> {
        if self.players.contains_key(&player_id) {
            return Err(SessionError::AlreadyJoined);
        }
        let spawn_point = self.spawns.take().ok_or(SessionError::SpawnExhausted)?;

        let roster = self.snapshots();
        let player = Player::spawn(player_id, spawn_point, self.tuning.tile_size);
        let snapshot = PlayerSnapshot::from(&player);
        self.players.insert(player_id, player);

        Ok(JoinOutcome {
            player: snapshot,
            roster,
        })
    }

    /// Overwrites position and facing as reported by the client.
    ///
    /// Returns `None` for players that are no longer live; late moves after a death or
    /// disconnect are expected and ignored. Reported positions are not checked against
    /// walls or movement speed.
    pub fn move_player(
        &mut self,
        player_id: PlayerId,
        pos: WorldPos,
        facing: Facing,
    ) -> Option<PlayerSnapshot> {
        let player = self.players.get_mut(&player_id)?;
        player.pos = pos;
        player.facing = facing;
        Some(PlayerSnapshot::from(&*player))
    }

    /// Arms a bomb on the tile under (x, y) and returns the snapped position.
    ///
    /// `Ok(None)` means the owner is no longer live and nothing was placed. Scheduling the
    /// detonation is left to the caller.
    pub fn place_bomb(
        &mut self,
        owner: PlayerId,
        bomb_id: BombId,
        x: f32,
        y: f32,
    ) -> Result<Option<WorldPos>, SessionError> {
        if !self.players.contains_key(&owner) {
            return Ok(None);
        }
        let grid = self.grid.as_ref().ok_or(SessionError::MapNotRegistered)?;

        let key = BombKey { owner, id: bomb_id };
        if self.bombs.contains_key(&key) {
            return Err(SessionError::DuplicateBomb);
        }

        let pos = grid.nearest_tile_center(x, y);
        self.bombs.insert(key, Bomb::new(owner, bomb_id, pos));
        Ok(Some(pos))
    }

    /// Detonates an armed bomb and kills every player caught in the blast.
    ///
    /// The bomb is removed before any player is touched, so a second call for the same key
    /// returns `None`.
    pub fn detonate(&mut self, key: BombKey) -> Option<Detonation> {
        let grid = self.grid.as_ref()?;
        let bomb = self.bombs.remove(&key)?;

        let result = bomb.detonate(grid, self.tuning.bomb.radius, self.players.values());
        for &victim in &result.killed {
            self.kill_player(victim);
        }
        Some(result)
    }

    /// Removes a live player and returns its spawn point to the pool.
    pub fn kill_player(&mut self, player_id: PlayerId) -> bool {
        self.remove_player(player_id)
    }

    /// Same cleanup as a kill. Bombs the player already placed stay armed and still
    /// detonate on schedule.
    pub fn leave(&mut self, player_id: PlayerId) -> bool {
        self.remove_player(player_id)
    }

    fn remove_player(&mut self, player_id: PlayerId) -> bool {
        match self.players.remove(&player_id) {
            Some(player) => {
                self.spawns.release(player.spawn_point);
                true
            }
            None => false,
        }
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(&player_id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn snapshots(&self) -> Vec<PlayerSnapshot> {
        self.players.values().map(PlayerSnapshot::from).collect()
    }

    pub fn bomb(&self, key: BombKey) -> Option<&Bomb> {
        self.bombs.get(&key)
    }

    pub fn armed_bomb_count(&self) -> usize {
        self.bombs.len()
    }

    pub fn bombs_owned_by(&self, owner: PlayerId) -> impl Iterator<Item = &Bomb> {
        self.bombs.values().filter(move |b| b.key.owner == owner)
    }

    pub fn available_spawns(&self) -> impl Iterator<Item = &TileCoord> {
        self.spawns.available()
    }
}
