// Per-session task: the single place where a session's state is mutated.

use super::session::GameSession;
use super::types::{GameEvent, Outbound, Recipient, ServerEvent, SessionState};
use crate::domain::{BombKey, PlayerId, SessionError, TileGrid, WorldPos};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{Notify, broadcast, mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Everything the session task owns while it runs.
pub struct SessionWorker {
    pub session_id: Arc<str>,
    pub session: GameSession,
    pub input_rx: mpsc::Receiver<GameEvent>,
    // Weak so pending fuses never keep a removed session alive.
    pub fuse_tx: mpsc::WeakSender<GameEvent>,
    pub events_tx: broadcast::Sender<Outbound>,
    pub state_tx: watch::Sender<SessionState>,
    pub broadcast_interval: Duration,
    pub shutdown: Arc<Notify>,
}

pub async fn session_task(mut worker: SessionWorker) {
    let mut interval = tokio::time::interval(worker.broadcast_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(session_id = %worker.session_id, "session task started");

    loop {
        tokio::select! {
            _ = worker.shutdown.notified() => {
                // Exit cleanly when the session is removed.
                break;
            }
            event = worker.input_rx.recv() => {
                match event {
                    Some(event) => worker.handle_event(event),
                    None => break,
                }
            }
            _ = interval.tick() => {
                worker.broadcast_positions();
            }
        }
    }

    worker.state_tx.send_replace(SessionState::Closed);
    info!(session_id = %worker.session_id, "session task stopped");
}

impl SessionWorker {
    fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::Connect { player_id } => {
                debug!(session_id = %self.session_id, player_id, "connection attached");
            }
            GameEvent::RegisterMap { player_id, map } => {
                let tile_size = self.session.tuning().tile_size;
                match TileGrid::from_tiles(map.width, map.height, &map.tiles, tile_size) {
                    Ok(grid) => {
                        let (width, height) = (grid.width(), grid.height());
                        if self.session.register_map(grid) {
                            info!(
                                session_id = %self.session_id,
                                player_id,
                                width,
                                height,
                                "map registered"
                            );
                        } else {
                            debug!(session_id = %self.session_id, player_id, "map already registered; ignoring");
                        }
                    }
                    Err(error) => {
                        warn!(session_id = %self.session_id, player_id, %error, "rejected map");
                        self.emit(Recipient::Only(player_id), ServerEvent::Error { error });
                    }
                }
            }
            GameEvent::Join { player_id } => self.join(player_id),
            GameEvent::Move {
                player_id,
                pos,
                facing,
            } => {
                if let Some(player) = self.session.move_player(player_id, pos, facing) {
                    self.emit(
                        Recipient::AllExcept(player_id),
                        ServerEvent::MovePlayer {
                            player,
                            timestamp: None,
                        },
                    );
                }
            }
            GameEvent::PlaceBomb {
                player_id,
                bomb_id,
                x,
                y,
            } => match self.session.place_bomb(player_id, bomb_id, x, y) {
                Ok(Some(pos)) => {
                    debug!(session_id = %self.session_id, player_id, bomb_id, x = pos.x, y = pos.y, "bomb placed");
                    self.emit(
                        Recipient::All,
                        ServerEvent::PlaceBomb {
                            id: bomb_id,
                            x: pos.x,
                            y: pos.y,
                        },
                    );
                    self.schedule_fuse(BombKey {
                        owner: player_id,
                        id: bomb_id,
                    });
                }
                Ok(None) => {
                    debug!(session_id = %self.session_id, player_id, bomb_id, "bomb from stale player ignored");
                }
                Err(error) => {
                    warn!(session_id = %self.session_id, player_id, bomb_id, %error, "bomb rejected");
                    self.emit(Recipient::Only(player_id), ServerEvent::Error { error });
                }
            },
            GameEvent::Leave { player_id } => {
                if self.session.leave(player_id) {
                    info!(session_id = %self.session_id, player_id, "player left");
                    self.emit(Recipient::All, ServerEvent::RemovePlayer { id: player_id });
                }
            }
            GameEvent::FuseExpired { key } => self.detonate(key),
        }
    }

    fn join(&mut self, player_id: PlayerId) {
        match self.session.join(player_id) {
            Ok(outcome) => {
                info!(
                    session_id = %self.session_id,
                    player_id,
                    x = outcome.player.x,
                    y = outcome.player.y,
                    "player joined"
                );
                // Others first, then the joiner's identity, then the existing roster.
                self.emit(
                    Recipient::AllExcept(player_id),
                    ServerEvent::NewPlayer(outcome.player.clone()),
                );
                self.emit(
                    Recipient::Only(player_id),
                    ServerEvent::AssignId {
                        id: player_id,
                        x: outcome.player.x,
                        y: outcome.player.y,
                    },
                );
                for existing in outcome.roster {
                    self.emit(Recipient::Only(player_id), ServerEvent::NewPlayer(existing));
                }
            }
            Err(SessionError::SpawnExhausted) => {
                warn!(session_id = %self.session_id, player_id, "no spawn point available; join refused");
                self.emit(
                    Recipient::Only(player_id),
                    ServerEvent::JoinRefused {
                        reason: SessionError::SpawnExhausted,
                    },
                );
            }
            Err(error) => {
                warn!(session_id = %self.session_id, player_id, %error, "join rejected");
                self.emit(Recipient::Only(player_id), ServerEvent::Error { error });
            }
        }
    }

    fn detonate(&mut self, key: BombKey) {
        let Some(result) = self.session.detonate(key) else {
            debug!(session_id = %self.session_id, owner = key.owner, bomb_id = key.id, "fuse expired for unknown bomb");
            return;
        };

        let explosions: Vec<WorldPos> = match self.session.grid() {
            Some(grid) => result
                .explosion_tiles
                .iter()
                .map(|tile| grid.tile_center(*tile))
                .collect(),
            None => Vec::new(),
        };

        info!(
            session_id = %self.session_id,
            owner = key.owner,
            bomb_id = key.id,
            tiles = explosions.len(),
            killed = result.killed.len(),
            "bomb detonated"
        );
        self.emit(
            Recipient::All,
            ServerEvent::Detonate {
                id: key.id,
                explosions,
            },
        );

        for victim in result.killed {
            info!(session_id = %self.session_id, player_id = victim, "player killed");
            self.emit(Recipient::All, ServerEvent::KillPlayer { id: victim });
        }
    }

    fn schedule_fuse(&self, key: BombKey) {
        let fuse = self.session.tuning().bomb.fuse;
        let fuse_tx = self.fuse_tx.clone();
        // Not cancellable: the bomb goes off even if its owner is gone by then.
        tokio::spawn(async move {
            tokio::time::sleep(fuse).await;
            if let Some(tx) = fuse_tx.upgrade() {
                let _ = tx.send(GameEvent::FuseExpired { key }).await;
            }
        });
    }

    fn broadcast_positions(&self) {
        let timestamp = now_millis();
        for player in self.session.snapshots() {
            self.emit(
                Recipient::All,
                ServerEvent::MovePlayer {
                    player,
                    timestamp: Some(timestamp),
                },
            );
        }
    }

    fn emit(&self, recipient: Recipient, event: ServerEvent) {
        // No subscribers just means nobody is connected right now.
        let _ = self.events_tx.send(Outbound { recipient, event });
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
