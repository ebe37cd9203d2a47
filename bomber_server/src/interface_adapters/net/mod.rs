// Network adapter modules split by external client sockets vs internal HTTP routes.

pub mod client;
pub mod internal;

pub use client::{ConnectionContext, spawn_session_serializer, ws_handler};
pub use internal::{create_session_handler, delete_session_handler};
