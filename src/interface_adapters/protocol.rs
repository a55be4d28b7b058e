// Wire protocol DTOs and conversions for public WebSocket messages.
// Internal service-to-service DTOs live with their handlers and clients.

use crate::domain::LeaderboardEntry;
use crate::use_cases::{LeaderboardOutcome, ScoreBoard, ScoreView};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Sent once, right after the upgrade.
    Identity {
        player_id: String,
        room_id: String,
        can_play: bool,
    },
    // Every room's live scores, keyed by room id then player id.
    ScoreUpdate(ScoreBoardDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Spawn a ship if the player has none.
    RequestRestart,
    Fire,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreDto {
    pub kills: u32,
    pub name: String,
}

impl From<&ScoreView> for ScoreDto {
    fn from(view: &ScoreView) -> Self {
        Self {
            kills: view.kills,
            name: view.name.clone(),
        }
    }
}

pub type ScoreBoardDto = BTreeMap<String, BTreeMap<String, ScoreDto>>;

pub fn score_board_dto(board: &ScoreBoard) -> ScoreBoardDto {
    board
        .iter()
        .map(|(room_id, table)| {
            let players = table
                .iter()
                .map(|(player_id, view)| (player_id.to_string(), ScoreDto::from(view)))
                .collect();
            (room_id.to_string(), players)
        })
        .collect()
}

/// Response body for the end-of-round leaderboard trigger.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardUpdateResponse {
    pub status: &'static str,
    pub entries: Vec<LeaderboardEntry>,
}

impl From<LeaderboardOutcome> for LeaderboardUpdateResponse {
    fn from(outcome: LeaderboardOutcome) -> Self {
        match outcome {
            LeaderboardOutcome::Updated(entries) => Self {
                status: "updated",
                entries,
            },
            LeaderboardOutcome::Unchanged(entries) => Self {
                status: "unchanged",
                entries,
            },
            LeaderboardOutcome::NoBackingRecord => Self {
                status: "no_backing_record",
                entries: Vec::new(),
            },
        }
    }
}
