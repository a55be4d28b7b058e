// End-of-round leaderboard aggregation: live display, merge, persist, historical display.

use crate::domain::ports::{Clock, DisplaySink, LeaderboardStore};
use crate::domain::ranking::merge;
use crate::domain::relative_time::humanize_since;
use crate::domain::{DisplaySlot, LeaderboardEntry, LeaderboardError, RoomId, ScoreEntry};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const EMPTY_SLOT: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardOutcome {
    /// Merged table differed from the stored one and was persisted.
    Updated(Vec<LeaderboardEntry>),
    Unchanged(Vec<LeaderboardEntry>),
    /// The room has no historical record to merge into.
    NoBackingRecord,
}

pub struct LeaderboardAggregator {
    store: Arc<dyn LeaderboardStore>,
    display: Arc<dyn DisplaySink>,
    clock: Arc<dyn Clock>,
    top_n: usize,
    room_locks: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl LeaderboardAggregator {
    pub fn new(
        store: Arc<dyn LeaderboardStore>,
        display: Arc<dyn DisplaySink>,
        clock: Arc<dyn Clock>,
        top_n: usize,
    ) -> Self {
        Self {
            store,
            display,
            clock,
            top_n,
            room_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Folds a live room snapshot into the room's historical top-N table.
    pub async fn update_leaderboard(
        &self,
        room_id: &RoomId,
        snapshot: Vec<ScoreEntry>,
    ) -> Result<LeaderboardOutcome, LeaderboardError> {
        let room_lock = self.room_lock(room_id).await;
        let outcome = {
            let _guard = room_lock.lock().await;
            self.update_locked(room_id, snapshot).await
        };
        self.release_room_lock(room_id, room_lock).await;
        outcome
    }

    async fn update_locked(
        &self,
        room_id: &RoomId,
        snapshot: Vec<ScoreEntry>,
    ) -> Result<LeaderboardOutcome, LeaderboardError> {
        let deployed = self.display.is_deployed(room_id).await;
        if deployed {
            self.write_live_slots(room_id, &snapshot).await;
        }

        let historical = match self.store.fetch(room_id).await {
            Ok(Some(entries)) => entries,
            Ok(None) => {
                debug!(%room_id, "no leaderboard record for room");
                return Ok(LeaderboardOutcome::NoBackingRecord);
            }
            Err(e) => {
                warn!(%room_id, error = %e, "failed to fetch leaderboard");
                return Err(LeaderboardError::StoreUnavailable(e));
            }
        };

        let now = self.clock.now_epoch_millis();
        let candidates: Vec<LeaderboardEntry> =
            snapshot.into_iter().map(|entry| entry.stamped(now)).collect();
        let merged = merge(&candidates, &historical, self.top_n);

        if merged == historical {
            debug!(%room_id, "leaderboard unchanged");
            return Ok(LeaderboardOutcome::Unchanged(merged));
        }

        if let Err(e) = self.store.persist(room_id, &merged).await {
            warn!(%room_id, error = %e, "failed to persist leaderboard");
            return Err(LeaderboardError::StoreUnavailable(e));
        }
        info!(%room_id, entries = merged.len(), "leaderboard updated");

        if deployed {
            self.write_top_slots(room_id, &merged, now).await;
        }
        Ok(LeaderboardOutcome::Updated(merged))
    }

    async fn room_lock(&self, room_id: &RoomId) -> Arc<Mutex<()>> {
        let mut locks = self.room_locks.lock().await;
        locks.entry(room_id.clone()).or_default().clone()
    }

    // The map holds one reference and the caller another; anything more is a waiting update.
    async fn release_room_lock(&self, room_id: &RoomId, room_lock: Arc<Mutex<()>>) {
        let mut locks = self.room_locks.lock().await;
        if Arc::strong_count(&room_lock) <= 2 {
            locks.remove(room_id);
        }
    }

    #[cfg(test)]
    async fn tracked_rooms(&self) -> usize {
        self.room_locks.lock().await.len()
    }

    async fn write_live_slots(&self, room_id: &RoomId, snapshot: &[ScoreEntry]) {
        for i in 0..self.top_n {
            let (name, score) = match snapshot.get(i) {
                Some(entry) => (entry.name.clone(), entry.score.to_string()),
                None => (EMPTY_SLOT.to_string(), EMPTY_SLOT.to_string()),
            };
            self.display
                .set_text(room_id, DisplaySlot::PlayerName(i), &name)
                .await;
            self.display
                .set_text(room_id, DisplaySlot::Score(i), &score)
                .await;
        }
    }

    async fn write_top_slots(&self, room_id: &RoomId, table: &[LeaderboardEntry], now: u64) {
        for i in 0..self.top_n {
            let (name, date, score) = match table.get(i) {
                Some(entry) => (
                    entry.name.clone(),
                    humanize_since(entry.achieved_at_ms, now),
                    entry.score.to_string(),
                ),
                None => (
                    EMPTY_SLOT.to_string(),
                    EMPTY_SLOT.to_string(),
                    EMPTY_SLOT.to_string(),
                ),
            };
            self.display
                .set_text(room_id, DisplaySlot::TopPlayerName(i), &name)
                .await;
            self.display
                .set_text(room_id, DisplaySlot::TopDate(i), &date)
                .await;
            self.display
                .set_text(room_id, DisplaySlot::TopScore(i), &score)
                .await;
        }
    }
}
