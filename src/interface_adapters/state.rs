use crate::domain::ports::IdentityVerifier;
use crate::use_cases::{LeaderboardAggregator, SessionEvent};
use axum::extract::ws::Utf8Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};

#[derive(Clone)]
pub struct AppState {
    // Events flowing from connections and internal routes into the session loop.
    pub events_tx: mpsc::Sender<SessionEvent>,
    // Serialized score boards, shared across all connections.
    pub score_bytes_tx: broadcast::Sender<Utf8Bytes>,
    // Latest serialized score board for new connections and lag recovery.
    pub score_latest_tx: watch::Sender<Utf8Bytes>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub aggregator: Arc<LeaderboardAggregator>,
    // Query parameter the room id is read from.
    pub room_query_field: Arc<str>,
    // Upper bound for waiting on a session loop snapshot.
    pub snapshot_timeout: Duration,
}
