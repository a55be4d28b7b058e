// Domain-level errors for session and leaderboard workflows.

use crate::domain::entities::{ConnectionId, EntityId};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    // Request is missing the room-deriving field, or it is blank.
    MalformedRequest,
    // The session loop can no longer take connections.
    RoomUnavailable,
    // Spectator attempted a player-only action.
    VerificationFailure,
    UnknownConnection(ConnectionId),
    DuplicateConnection(ConnectionId),
    ShipAlreadyActive(EntityId),
    NoActiveShip(ConnectionId),
    // Event references an entity that is already gone.
    StaleReference(EntityId),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::MalformedRequest => write!(f, "request has no valid room id"),
            SessionError::RoomUnavailable => write!(f, "room unavailable"),
            SessionError::VerificationFailure => write!(f, "visitor is not verified to play"),
            SessionError::UnknownConnection(id) => write!(f, "unknown connection {id}"),
            SessionError::DuplicateConnection(id) => {
                write!(f, "connection {id} is already assigned")
            }
            SessionError::ShipAlreadyActive(id) => write!(f, "ship {id} is still active"),
            SessionError::NoActiveShip(id) => write!(f, "connection {id} has no live ship"),
            SessionError::StaleReference(id) => write!(f, "entity {id} no longer exists"),
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Transport(String),
    Upstream { status: u16 },
    Decode(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Transport(err) => write!(f, "store transport error: {err}"),
            StoreError::Upstream { status } => write!(f, "store upstream error {status}"),
            StoreError::Decode(err) => write!(f, "store response decode error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    Rejected,
    Unavailable(String),
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::Rejected => write!(f, "identity rejected"),
            IdentityError::Unavailable(err) => write!(f, "identity service unavailable: {err}"),
        }
    }
}

impl std::error::Error for IdentityError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardError {
    StoreUnavailable(StoreError),
    RoomUnavailable,
}

impl fmt::Display for LeaderboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaderboardError::StoreUnavailable(err) => write!(f, "leaderboard store: {err}"),
            LeaderboardError::RoomUnavailable => write!(f, "room snapshot unavailable"),
        }
    }
}

impl std::error::Error for LeaderboardError {}
