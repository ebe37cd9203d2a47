use crate::domain::TileCoord;
use crate::interface_adapters::http::error_response;
use crate::interface_adapters::net::client::spawn_session_serializer;
use crate::interface_adapters::protocol::MapDto;
use crate::interface_adapters::state::AppState;
use crate::use_cases::RegistryError;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, serde::Deserialize)]
pub struct SpawnPointDto {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, serde::Deserialize)]
pub struct SessionInitRequest {
    // Session id chosen by the lobby service.
    session_id: String,
    // Tile coordinates players may spawn on.
    #[serde(default)]
    spawn_points: Vec<SpawnPointDto>,
    // Optional map; otherwise the first client to register one wins.
    #[serde(default)]
    map: Option<MapDto>,
}

#[derive(Debug, serde::Serialize)]
struct SessionInitResponse {
    // The session id that was created.
    session_id: String,
}

pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SessionInitRequest>,
) -> impl IntoResponse {
    // Ensure we have a session id to create.
    let session_id = payload.session_id.trim().to_string();
    if session_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "session_id is required");
    }
    if payload.spawn_points.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "spawn_points must not be empty");
    }

    let spawn_points: Vec<TileCoord> = payload
        .spawn_points
        .iter()
        .map(|p| TileCoord::new(p.x, p.y))
        .collect();
    if has_duplicates(&spawn_points) {
        return error_response(StatusCode::BAD_REQUEST, "spawn_points must be distinct");
    }

    match state
        .session_registry
        .create_session(
            session_id.clone(),
            spawn_points,
            payload.map.map(Into::into),
            false,
        )
        .await
    {
        Ok(session) => {
            // Create the serializer so clients can subscribe immediately.
            spawn_session_serializer(&session);
            (
                StatusCode::CREATED,
                Json(SessionInitResponse { session_id }),
            )
                .into_response()
        }
        Err(e @ RegistryError::AlreadyExists) => error_response(StatusCode::CONFLICT, e.to_string()),
        Err(e @ RegistryError::InvalidMap) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.session_registry.remove_session(&session_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e @ RegistryError::NotFound) => error_response(StatusCode::NOT_FOUND, e.to_string()),
        Err(e @ RegistryError::Pinned) => error_response(StatusCode::CONFLICT, e.to_string()),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

fn has_duplicates(points: &[TileCoord]) -> bool {
    let mut seen = HashSet::new();
    points.iter().any(|p| !seen.insert(*p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_a_spawn_point_repeats_then_duplicates_are_detected() {
        let points = [TileCoord::new(1, 1), TileCoord::new(2, 1), TileCoord::new(1, 1)];

        assert!(has_duplicates(&points));
        assert!(!has_duplicates(&points[..2]));
    }
}
