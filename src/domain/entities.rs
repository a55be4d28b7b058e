// Domain-level room, entity and scoring types.

use crate::domain::errors::SessionError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub type ConnectionId = u64;
pub type PlayerId = u64;
pub type EntityId = u64;

const MAX_ROOM_ID_LEN: usize = 128;

/// External identifier that partitions the world into rooms (for example an asset id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Validates a raw room id taken from request context.
    pub fn parse(raw: &str) -> Result<Self, SessionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed == "."
            || trimmed == ".."
            || trimmed.len() > MAX_ROOM_ID_LEN
            || trimmed.chars().any(char::is_control)
        {
            return Err(SessionError::MalformedRequest);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reads the room-deriving field out of connect request parameters.
pub fn room_id_from_params(
    params: &HashMap<String, String>,
    field: &str,
) -> Result<RoomId, SessionError> {
    let raw = params.get(field).ok_or(SessionError::MalformedRequest)?;
    RoomId::parse(raw)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Ship,
    Projectile,
}

/// A simulated object. Physics lives elsewhere; the server only tracks ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: EntityId,
    pub owner_id: PlayerId,
    pub room_id: RoomId,
    pub kind: EntityKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Assigned,
    ShipActive { ship_id: EntityId },
    ShipDestroyed,
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub player_id: PlayerId,
    pub room_id: RoomId,
    // Stable identity used for the persisted leaderboard.
    pub identity_id: String,
    // Spectators see the room but cannot spawn.
    pub can_play: bool,
    pub display_name: Option<String>,
    pub phase: ConnectionPhase,
}

/// Live per-player, per-room score state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub entity_id: EntityId,
    pub identity_id: String,
    pub kills: u32,
    pub name: String,
}

/// Candidate leaderboard row taken from a live room score table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEntry {
    pub id: String,
    pub score: u32,
    pub name: String,
}

impl ScoreEntry {
    pub fn stamped(self, achieved_at_ms: u64) -> LeaderboardEntry {
        LeaderboardEntry {
            id: self.id,
            score: self.score,
            name: self.name,
            achieved_at_ms,
        }
    }
}

/// Persisted historical high-score row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: String,
    pub score: u32,
    pub name: String,
    #[serde(rename = "date")]
    pub achieved_at_ms: u64,
}

/// Outcome of identity verification for a connecting visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub authorized: bool,
    pub display_name: Option<String>,
    pub identity_id: Option<String>,
}

impl Verification {
    pub fn spectator() -> Self {
        Self {
            authorized: false,
            display_name: None,
            identity_id: None,
        }
    }
}

/// Named text slot on a room's leaderboard display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplaySlot {
    PlayerName(usize),
    Score(usize),
    TopPlayerName(usize),
    TopDate(usize),
    TopScore(usize),
}

impl fmt::Display for DisplaySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplaySlot::PlayerName(i) => write!(f, "playerName_{i}"),
            DisplaySlot::Score(i) => write!(f, "score_{i}"),
            DisplaySlot::TopPlayerName(i) => write!(f, "topPlayerName_{i}"),
            DisplaySlot::TopDate(i) => write!(f, "topDate_{i}"),
            DisplaySlot::TopScore(i) => write!(f, "topScore_{i}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_room_field_is_present_then_room_id_is_trimmed() {
        let params = HashMap::from([("assetId".to_string(), "  abc ".to_string())]);

        let room_id = room_id_from_params(&params, "assetId").expect("room id should parse");

        assert_eq!(room_id.as_str(), "abc");
    }

    #[test]
    fn when_room_field_is_missing_then_request_is_malformed() {
        let params = HashMap::from([("visitorId".to_string(), "7".to_string())]);

        let result = room_id_from_params(&params, "assetId");

        assert_eq!(result, Err(SessionError::MalformedRequest));
    }

    #[test]
    fn when_room_field_is_blank_then_request_is_malformed() {
        assert_eq!(RoomId::parse("   "), Err(SessionError::MalformedRequest));
        assert_eq!(RoomId::parse("a\nb"), Err(SessionError::MalformedRequest));
        assert_eq!(RoomId::parse(".."), Err(SessionError::MalformedRequest));
    }

    #[test]
    fn when_slot_is_formatted_then_matches_display_object_suffix() {
        assert_eq!(DisplaySlot::TopPlayerName(2).to_string(), "topPlayerName_2");
        assert_eq!(DisplaySlot::Score(0).to_string(), "score_0");
    }

    #[test]
    fn when_entry_is_serialized_then_timestamp_uses_date_key() {
        let entry = ScoreEntry {
            id: "9".to_string(),
            score: 8,
            name: "Zed".to_string(),
        }
        .stamped(1_700_000_000_000);

        let json = serde_json::to_value(&entry).expect("entry should serialize");

        assert_eq!(json["date"], 1_700_000_000_000u64);
        assert_eq!(json["score"], 8);
    }
}
