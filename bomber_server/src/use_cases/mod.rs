// Use cases layer: application workflows for the game server.

pub mod game;
pub mod lobby;
pub mod session;
pub mod types;

pub use lobby::{RegistryError, RegistrySettings, SessionHandle, SessionRegistry};
pub use session::{GameSession, JoinOutcome};
pub use types::{
    GameEvent, MapDescription, Outbound, OutboundFrame, Recipient, ServerEvent, SessionState,
};
