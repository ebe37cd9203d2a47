// Domain-level errors for session workflows.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    // No free spawn point; the join attempt must be refused.
    SpawnExhausted,
    // The referenced session id is not in the registry.
    UnknownSession,
    // A map-dependent operation ran before the session had a tile grid.
    MapNotRegistered,
    // The supplied map description cannot form a tile grid.
    InvalidMap,
    // The player id is already live in this session.
    AlreadyJoined,
    // The owner still has an armed bomb with this id.
    DuplicateBomb,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::SpawnExhausted => "no spawn point available",
            Self::UnknownSession => "session not found",
            Self::MapNotRegistered => "map not registered",
            Self::InvalidMap => "invalid map description",
            Self::AlreadyJoined => "player already joined",
            Self::DuplicateBomb => "bomb id already armed",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for SessionError {}
