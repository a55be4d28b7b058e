use super::room_url;
use crate::domain::ports::DisplaySink;
use crate::domain::{DisplaySlot, RoomId};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Serialize)]
struct UpdateTextRequest<'a> {
    unique_name: &'a str,
    text: &'a str,
}

// Reqwest client for the in-world text display service.
#[derive(Clone)]
pub struct HttpDisplayClient {
    http: reqwest::Client,
    base_url: String,
    // Leading part of every display object's unique name.
    slot_prefix: String,
}

impl HttpDisplayClient {
    pub fn new(
        base_url: impl Into<String>,
        slot_prefix: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            slot_prefix: slot_prefix.into(),
        })
    }

    fn board_name(&self, room_id: &RoomId) -> String {
        format!("{}_{}", self.slot_prefix, room_id)
    }

    /// Unique name of a single text slot, e.g. `multiplayer_leaderboard_abc_topScore_0`.
    pub fn slot_name(&self, room_id: &RoomId, slot: DisplaySlot) -> String {
        format!("{}_{}", self.board_name(room_id), slot)
    }
}

#[async_trait]
impl DisplaySink for HttpDisplayClient {
    async fn is_deployed(&self, room_id: &RoomId) -> bool {
        let Some(mut url) = room_url(&self.base_url, room_id, "displays") else {
            warn!(%room_id, base_url = %self.base_url, "invalid display lookup url");
            return false;
        };
        url.query_pairs_mut()
            .append_pair("unique_name", &self.board_name(room_id));

        let response = match self.http.get(url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(%room_id, status = %response.status(), "display lookup failed");
                return false;
            }
            Err(e) => {
                warn!(%room_id, error = %e, "display service unavailable");
                return false;
            }
        };

        match response.json::<Vec<serde_json::Value>>().await {
            Ok(displays) => !displays.is_empty(),
            Err(e) => {
                warn!(%room_id, error = %e, "failed to decode display lookup");
                false
            }
        }
    }

    async fn set_text(&self, room_id: &RoomId, slot: DisplaySlot, text: &str) {
        let url = format!("{}/texts", self.base_url);
        let unique_name = self.slot_name(room_id, slot);
        let result = self
            .http
            .post(url)
            .json(&UpdateTextRequest {
                unique_name: &unique_name,
                text,
            })
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(%room_id, slot = %unique_name, "display text updated");
            }
            Ok(response) => {
                warn!(
                    %room_id,
                    slot = %unique_name,
                    status = %response.status(),
                    "display text rejected"
                );
            }
            Err(e) => {
                warn!(%room_id, slot = %unique_name, error = %e, "failed to update display text");
            }
        }
    }
}

/// Display stand-in that only logs. Always reports a deployed board.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDisplay;

#[async_trait]
impl DisplaySink for LogDisplay {
    async fn is_deployed(&self, _room_id: &RoomId) -> bool {
        true
    }

    async fn set_text(&self, room_id: &RoomId, slot: DisplaySlot, text: &str) {
        info!(%room_id, %slot, text, "display text");
    }
}
