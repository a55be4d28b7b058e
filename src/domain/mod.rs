// Domain layer: room, entity and leaderboard types plus the pure ranking rules.

pub mod entities;
pub mod errors;
pub mod ports;
pub mod ranking;
pub mod relative_time;
pub mod world;

pub use entities::{
    Connection, ConnectionId, ConnectionPhase, DisplaySlot, Entity, EntityId, EntityKind,
    LeaderboardEntry, PlayerId, RoomId, ScoreEntry, ScoreRecord, Verification,
};
pub use errors::{IdentityError, LeaderboardError, SessionError, StoreError};
pub use world::World;
