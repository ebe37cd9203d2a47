// Session registry: creates, looks up and tears down session tasks.

use crate::domain::{SessionTuning, TileCoord, TileGrid};
use crate::use_cases::game::{SessionWorker, session_task};
use crate::use_cases::session::GameSession;
use crate::use_cases::{GameEvent, MapDescription, Outbound, OutboundFrame, SessionState};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock, broadcast, mpsc, watch};
use tracing::info;

/// Shared configuration for spawning session tasks.
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// Capacity for inbound client events.
    pub input_channel_capacity: usize,
    /// Capacity for outbound session events and frames.
    pub event_broadcast_capacity: usize,
    /// Period of the position broadcast.
    pub broadcast_interval: Duration,
    /// Gameplay tuning applied to new sessions.
    pub tuning: SessionTuning,
}

/// Errors returned by registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Session already exists and cannot be re-created.
    AlreadyExists,
    /// No session with that id.
    NotFound,
    /// Pinned sessions live for the whole process.
    Pinned,
    /// The initial map could not be built.
    InvalidMap,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::AlreadyExists => "session already exists",
            Self::NotFound => "session not found",
            Self::Pinned => "session is pinned",
            Self::InvalidMap => "invalid map description",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for RegistryError {}

/// Per-session channels.
#[derive(Clone)]
pub struct SessionHandle {
    /// Identifier clients use to target this session.
    pub session_id: Arc<str>,
    /// Sender for game events into the session task.
    pub input_tx: mpsc::Sender<GameEvent>,
    /// Broadcast sender for outbound domain events.
    pub events_tx: broadcast::Sender<Outbound>,
    /// Broadcast sender for serialized outbound events.
    pub frames_tx: broadcast::Sender<OutboundFrame>,
    /// Watch sender for the session lifecycle.
    pub state_tx: watch::Sender<SessionState>,
    shutdown: Arc<Notify>,
    pinned: bool,
}

impl SessionHandle {
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }
}

/// Thread-safe registry for active sessions.
#[derive(Debug)]
pub struct SessionRegistry {
    /// Global settings applied to newly created sessions.
    settings: RegistrySettings,
    /// Map of session id to active handle.
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session_id", &self.session_id)
            .field("pinned", &self.pinned)
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    /// Creates a new registry with the provided settings.
    pub fn new(settings: RegistrySettings) -> Self {
        Self {
            settings,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a new session and spawns its task.
    pub async fn create_session(
        &self,
        session_id: String,
        spawn_points: Vec<TileCoord>,
        map: Option<MapDescription>,
        pinned: bool,
    ) -> Result<SessionHandle, RegistryError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session_id) {
            return Err(RegistryError::AlreadyExists);
        }

        let tuning = self.settings.tuning;
        let spawn_count = spawn_points.len();
        let mut session = GameSession::new(spawn_points, tuning);
        if let Some(map) = map {
            let grid = TileGrid::from_tiles(map.width, map.height, &map.tiles, tuning.tile_size)
                .map_err(|_| RegistryError::InvalidMap)?;
            session.register_map(grid);
        }

        // Channel wiring for the session task.
        let (input_tx, input_rx) = mpsc::channel::<GameEvent>(self.settings.input_channel_capacity);
        let (events_tx, _events_rx) =
            broadcast::channel::<Outbound>(self.settings.event_broadcast_capacity);
        let (frames_tx, _frames_rx) =
            broadcast::channel::<OutboundFrame>(self.settings.event_broadcast_capacity);
        let (state_tx, _state_rx) = watch::channel(SessionState::Running);
        let shutdown = Arc::new(Notify::new());
        let session_id: Arc<str> = Arc::from(session_id);

        // Spawn the authoritative task for this session.
        tokio::spawn(session_task(SessionWorker {
            session_id: session_id.clone(),
            session,
            input_rx,
            fuse_tx: input_tx.downgrade(),
            events_tx: events_tx.clone(),
            state_tx: state_tx.clone(),
            broadcast_interval: self.settings.broadcast_interval,
            shutdown: shutdown.clone(),
        }));

        let handle = SessionHandle {
            session_id: session_id.clone(),
            input_tx,
            events_tx,
            frames_tx,
            state_tx,
            shutdown,
            pinned,
        };

        info!(session_id = %session_id, spawn_count, pinned, "session created");
        sessions.insert(session_id.to_string(), handle.clone());
        Ok(handle)
    }

    /// Returns a session handle for the provided id, if it exists.
    pub async fn get_session(&self, session_id: &str) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    /// Removes a session and stops its task. Connected clients see the session close.
    pub async fn remove_session(&self, session_id: &str) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(session_id) {
            None => return Err(RegistryError::NotFound),
            Some(handle) if handle.pinned => return Err(RegistryError::Pinned),
            Some(_) => {}
        }
        if let Some(handle) = sessions.remove(session_id) {
            handle.shutdown.notify_one();
        }
        info!(session_id, "session removed");
        Ok(())
    }

    pub async fn session_ids(&self) -> Vec<String> {
        let sessions = self.sessions.read().await;
        let mut ids: Vec<String> = sessions.keys().cloned().collect();
        ids.sort();
        ids
    }
}
