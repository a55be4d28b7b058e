use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_PLAYER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id for a WebSocket connection.
pub fn next_connection_id() -> u64 {
    NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Process-unique player id. Players are anonymous, so each connection gets a fresh one.
pub fn next_player_id() -> u64 {
    NEXT_PLAYER_ID.fetch_add(1, Ordering::Relaxed)
}
