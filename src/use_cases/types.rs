// Use-case level inputs/outputs for the session loop.

use crate::domain::{ConnectionId, EntityId, PlayerId, RoomId, ScoreEntry, Verification};
use std::collections::BTreeMap;
use tokio::sync::oneshot;

#[derive(Debug, Clone)]
pub struct ConnectRequest {
    pub conn_id: ConnectionId,
    pub player_id: PlayerId,
    pub room_id: RoomId,
    pub verification: Verification,
}

#[derive(Debug)]
pub enum SessionEvent {
    ConnectionOpened(ConnectRequest),
    ConnectionClosed {
        conn_id: ConnectionId,
        player_id: PlayerId,
    },
    RestartRequested {
        conn_id: ConnectionId,
    },
    ProjectileFired {
        conn_id: ConnectionId,
    },
    EntityDestroyed {
        destroyer: EntityId,
        destroyed: EntityId,
    },
    // Live candidates for an end-of-round leaderboard update.
    SnapshotRequested {
        room_id: RoomId,
        reply: oneshot::Sender<Vec<ScoreEntry>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreView {
    pub kills: u32,
    pub name: String,
}

/// Every room's live score table, keyed by room then player.
pub type ScoreBoard = BTreeMap<RoomId, BTreeMap<PlayerId, ScoreView>>;
