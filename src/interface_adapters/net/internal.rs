// Service-to-service routes: simulation hooks and the end-of-round leaderboard trigger.

use crate::domain::{EntityId, LeaderboardError, RoomId, ScoreEntry};
use crate::interface_adapters::http::json_error;
use crate::interface_adapters::protocol::LeaderboardUpdateResponse;
use crate::interface_adapters::state::AppState;
use crate::use_cases::SessionEvent;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::warn;

#[derive(Debug, serde::Deserialize)]
pub struct EntityDestroyedRequest {
    // Entity credited with the destruction (ship or projectile).
    destroyer: EntityId,
    destroyed: EntityId,
}

pub async fn entity_destroyed_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EntityDestroyedRequest>,
) -> Response {
    let event = SessionEvent::EntityDestroyed {
        destroyer: payload.destroyer,
        destroyed: payload.destroyed,
    };
    match state.events_tx.send(event).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(_) => json_error(StatusCode::SERVICE_UNAVAILABLE, "session loop unavailable"),
    }
}

pub async fn update_leaderboard_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_room_id): Path<String>,
) -> Response {
    let room_id = match RoomId::parse(&raw_room_id) {
        Ok(room_id) => room_id,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let snapshot = match request_snapshot(&state, &room_id).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(%room_id, error = %e, "room snapshot unavailable");
            return json_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string());
        }
    };

    match state.aggregator.update_leaderboard(&room_id, snapshot).await {
        Ok(outcome) => Json(LeaderboardUpdateResponse::from(outcome)).into_response(),
        Err(e) => json_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    }
}

async fn request_snapshot(
    state: &AppState,
    room_id: &RoomId,
) -> Result<Vec<ScoreEntry>, LeaderboardError> {
    let (reply, reply_rx) = oneshot::channel();
    state
        .events_tx
        .send(SessionEvent::SnapshotRequested {
            room_id: room_id.clone(),
            reply,
        })
        .await
        .map_err(|_| LeaderboardError::RoomUnavailable)?;

    match timeout(state.snapshot_timeout, reply_rx).await {
        Ok(Ok(snapshot)) => Ok(snapshot),
        Ok(Err(_)) | Err(_) => Err(LeaderboardError::RoomUnavailable),
    }
}
