use super::room_url;
use crate::domain::ports::LeaderboardStore;
use crate::domain::{LeaderboardEntry, RoomId, StoreError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Serialize, Deserialize)]
struct HighScoresBody {
    #[serde(default)]
    entries: Vec<LeaderboardEntry>,
}

// Reqwest client for the per-room high-score record.
#[derive(Clone)]
pub struct HttpLeaderboardStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpLeaderboardStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn url(&self, room_id: &RoomId) -> Result<reqwest::Url, StoreError> {
        room_url(&self.base_url, room_id, "high-scores")
            .ok_or_else(|| StoreError::Transport(format!("invalid store url {}", self.base_url)))
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Transport(e.to_string())
}

#[async_trait]
impl LeaderboardStore for HttpLeaderboardStore {
    async fn fetch(&self, room_id: &RoomId) -> Result<Option<Vec<LeaderboardEntry>>, StoreError> {
        let response = self
            .http
            .get(self.url(room_id)?)
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response
                    .json::<HighScoresBody>()
                    .await
                    .map_err(|e| StoreError::Decode(e.to_string()))?;
                Ok(Some(body.entries))
            }
            status => Err(StoreError::Upstream {
                status: status.as_u16(),
            }),
        }
    }

    async fn persist(
        &self,
        room_id: &RoomId,
        entries: &[LeaderboardEntry],
    ) -> Result<(), StoreError> {
        let response = self
            .http
            .put(self.url(room_id)?)
            .json(&HighScoresBody {
                entries: entries.to_vec(),
            })
            .send()
            .await
            .map_err(transport)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Upstream {
                status: response.status().as_u16(),
            })
        }
    }
}

/// Process-local store. Every room gets an empty record on first fetch.
#[derive(Debug, Default)]
pub struct InMemoryLeaderboardStore {
    records: RwLock<HashMap<RoomId, Vec<LeaderboardEntry>>>,
}

impl InMemoryLeaderboardStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaderboardStore for InMemoryLeaderboardStore {
    async fn fetch(&self, room_id: &RoomId) -> Result<Option<Vec<LeaderboardEntry>>, StoreError> {
        let mut records = self.records.write().await;
        Ok(Some(records.entry(room_id.clone()).or_default().clone()))
    }

    async fn persist(
        &self,
        room_id: &RoomId,
        entries: &[LeaderboardEntry],
    ) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(room_id.clone(), entries.to_vec());
        Ok(())
    }
}
