use std::{env, time::Duration};

// Runtime/server constants (not gameplay tuning).
pub const SESSION_EVENTS_CAPACITY: usize = 1024;
pub const SCORE_BROADCAST_CAPACITY: usize = 64;
pub const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(2);

fn var_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn optional_url(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().trim_end_matches('/').to_string())
        .filter(|value| !value.is_empty())
}

pub fn http_port() -> u16 {
    var_or("ROOM_SERVER_PORT", 3001)
}

/// Tunables read once at startup.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    // Query parameter the room id is derived from.
    pub room_query_field: String,
    pub score_broadcast_debounce: Duration,
    pub leaderboard_size: usize,
    pub events_capacity: usize,
    pub score_broadcast_capacity: usize,
    pub snapshot_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            room_query_field: "assetId".to_string(),
            score_broadcast_debounce: Duration::from_millis(1000),
            leaderboard_size: 3,
            events_capacity: SESSION_EVENTS_CAPACITY,
            score_broadcast_capacity: SCORE_BROADCAST_CAPACITY,
            snapshot_timeout: SNAPSHOT_TIMEOUT,
        }
    }
}

impl ServerSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let room_query_field = env::var("ROOM_QUERY_FIELD")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.room_query_field);
        Self {
            room_query_field,
            score_broadcast_debounce: Duration::from_millis(var_or(
                "SCORE_BROADCAST_DEBOUNCE_MS",
                1000,
            )),
            leaderboard_size: var_or("LEADERBOARD_SIZE", defaults.leaderboard_size),
            ..defaults
        }
    }
}

/// Where the external collaborators live. `None` selects the local stand-in.
#[derive(Debug, Clone)]
pub struct CollaboratorSettings {
    pub identity_service_url: Option<String>,
    pub identity_verify_timeout: Duration,
    pub leaderboard_store_url: Option<String>,
    pub display_service_url: Option<String>,
    pub display_slot_prefix: String,
    pub request_timeout: Duration,
}

impl CollaboratorSettings {
    pub fn from_env() -> Self {
        Self {
            identity_service_url: optional_url("IDENTITY_SERVICE_URL"),
            identity_verify_timeout: Duration::from_millis(var_or(
                "IDENTITY_VERIFY_TIMEOUT_MS",
                1500,
            )),
            leaderboard_store_url: optional_url("LEADERBOARD_STORE_URL"),
            display_service_url: optional_url("DISPLAY_SERVICE_URL"),
            display_slot_prefix: env::var("DISPLAY_SLOT_PREFIX")
                .unwrap_or_else(|_| "multiplayer_leaderboard".to_string()),
            request_timeout: Duration::from_millis(var_or("COLLABORATOR_TIMEOUT_MS", 3000)),
        }
    }
}
