// In-process fakes for the collaborator ports, shared by unit tests.

use crate::domain::ports::{Clock, DisplaySink, LeaderboardStore, NameGenerator};
use crate::domain::{DisplaySlot, LeaderboardEntry, RoomId, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_epoch_millis(&self) -> u64 {
        self.0
    }
}

/// Hands out "Pilot 1", "Pilot 2", ...
#[derive(Default)]
pub(crate) struct SequenceNames {
    issued: AtomicUsize,
}

impl NameGenerator for SequenceNames {
    fn generate(&self) -> String {
        let n = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        format!("Pilot {n}")
    }
}

#[derive(Default)]
pub(crate) struct RecordingStore {
    records: Mutex<HashMap<String, Vec<LeaderboardEntry>>>,
    persisted: Mutex<Vec<(RoomId, Vec<LeaderboardEntry>)>>,
    fail_fetch: bool,
    fail_persist: bool,
}

impl RecordingStore {
    pub(crate) fn with_record(room_id: &str, entries: Vec<LeaderboardEntry>) -> Self {
        let store = Self::default();
        store
            .records
            .lock()
            .expect("records lock")
            .insert(room_id.to_string(), entries);
        store
    }

    pub(crate) fn failing_fetch() -> Self {
        Self {
            fail_fetch: true,
            ..Self::default()
        }
    }

    pub(crate) fn failing_persist(mut self) -> Self {
        self.fail_persist = true;
        self
    }

    pub(crate) fn persisted(&self) -> Vec<(RoomId, Vec<LeaderboardEntry>)> {
        self.persisted.lock().expect("persisted lock").clone()
    }
}

#[async_trait]
impl LeaderboardStore for RecordingStore {
    async fn fetch(&self, room_id: &RoomId) -> Result<Option<Vec<LeaderboardEntry>>, StoreError> {
        if self.fail_fetch {
            return Err(StoreError::Upstream { status: 500 });
        }
        let records = self.records.lock().expect("records lock");
        Ok(records.get(room_id.as_str()).cloned())
    }

    async fn persist(
        &self,
        room_id: &RoomId,
        entries: &[LeaderboardEntry],
    ) -> Result<(), StoreError> {
        if self.fail_persist {
            return Err(StoreError::Transport("connection refused".to_string()));
        }
        self.records
            .lock()
            .expect("records lock")
            .insert(room_id.as_str().to_string(), entries.to_vec());
        self.persisted
            .lock()
            .expect("persisted lock")
            .push((room_id.clone(), entries.to_vec()));
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingDisplay {
    deployed: bool,
    writes: Mutex<Vec<(String, String)>>,
}

impl RecordingDisplay {
    pub(crate) fn deployed() -> Self {
        Self {
            deployed: true,
            ..Self::default()
        }
    }

    pub(crate) fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().expect("writes lock").clone()
    }

    /// Last text written to the named slot.
    pub(crate) fn text(&self, slot: &str) -> Option<String> {
        self.writes()
            .into_iter()
            .rev()
            .find(|(name, _)| name == slot)
            .map(|(_, text)| text)
    }
}

#[async_trait]
impl DisplaySink for RecordingDisplay {
    async fn is_deployed(&self, _room_id: &RoomId) -> bool {
        self.deployed
    }

    async fn set_text(&self, _room_id: &RoomId, slot: DisplaySlot, text: &str) {
        self.writes
            .lock()
            .expect("writes lock")
            .push((slot.to_string(), text.to_string()));
    }
}
