use crate::use_cases::SessionRegistry;
use std::sync::Arc;

pub struct AppState {
    // Owns every live session task.
    pub session_registry: Arc<SessionRegistry>,
    // Session used when a client does not name one.
    pub default_session_id: Arc<str>,
}
