use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::entities::{DisplaySlot, LeaderboardEntry, RoomId, Verification};
use crate::domain::errors::{IdentityError, StoreError};

// Port for checking whether a visitor may play in a room.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(
        &self,
        room_id: &RoomId,
        credentials: &HashMap<String, String>,
    ) -> Result<Verification, IdentityError>;
}

// Port for the persisted high-score table. `None` means the room has no backing record.
#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    async fn fetch(&self, room_id: &RoomId) -> Result<Option<Vec<LeaderboardEntry>>, StoreError>;
    async fn persist(
        &self,
        room_id: &RoomId,
        entries: &[LeaderboardEntry],
    ) -> Result<(), StoreError>;
}

// Port for in-world text displays. Writes are fire-and-forget; implementations log failures.
#[async_trait]
pub trait DisplaySink: Send + Sync {
    async fn is_deployed(&self, room_id: &RoomId) -> bool;
    async fn set_text(&self, room_id: &RoomId, slot: DisplaySlot, text: &str);
}

// Port for generating display names for freshly spawned ships.
pub trait NameGenerator: Send + Sync {
    fn generate(&self) -> String;
}

// Port for retrieving the current time.
pub trait Clock: Send + Sync {
    fn now_epoch_millis(&self) -> u64;
}
