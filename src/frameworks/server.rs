// Framework bootstrap for the room server runtime.

use crate::domain::ports::{Clock, DisplaySink, IdentityVerifier, LeaderboardStore, NameGenerator};
use crate::frameworks::config::{self, CollaboratorSettings, ServerSettings};
use crate::interface_adapters::clients::{
    AllowAllVerifier, HttpDisplayClient, HttpIdentityClient, HttpLeaderboardStore,
    InMemoryLeaderboardStore, LogDisplay,
};
use crate::interface_adapters::net::score_update_serializer;
use crate::interface_adapters::routes::app;
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::clock::SystemClock;
use crate::interface_adapters::utils::names::RandomNameGenerator;
use crate::use_cases::{LeaderboardAggregator, SessionServer, session_task};

use axum::extract::ws::Utf8Bytes;
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tokio::sync::{broadcast, mpsc, watch};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Implementations behind every outbound port.
#[derive(Clone)]
pub struct Collaborators {
    pub identity: Arc<dyn IdentityVerifier>,
    pub store: Arc<dyn LeaderboardStore>,
    pub display: Arc<dyn DisplaySink>,
    pub names: Arc<dyn NameGenerator>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Local stand-ins only: everyone plays, scores stay in memory, displays are logged.
    pub fn local() -> Self {
        Self {
            identity: Arc::new(AllowAllVerifier),
            store: Arc::new(InMemoryLeaderboardStore::new()),
            display: Arc::new(LogDisplay),
            names: Arc::new(RandomNameGenerator),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn from_settings(settings: &CollaboratorSettings) -> Result<Self> {
        let mut collaborators = Self::local();

        if let Some(base_url) = &settings.identity_service_url {
            let client = HttpIdentityClient::new(base_url.clone(), settings.identity_verify_timeout)
                .map_err(|e| client_init_error("identity", e))?;
            collaborators.identity = Arc::new(client);
            tracing::debug!(
                identity_base_url = %base_url,
                identity_verify_timeout_ms = settings.identity_verify_timeout.as_millis(),
                "identity client configured"
            );
        } else {
            tracing::warn!("IDENTITY_SERVICE_URL not set; every visitor may play");
        }

        if let Some(base_url) = &settings.leaderboard_store_url {
            let client = HttpLeaderboardStore::new(base_url.clone(), settings.request_timeout)
                .map_err(|e| client_init_error("leaderboard store", e))?;
            collaborators.store = Arc::new(client);
            tracing::debug!(store_base_url = %base_url, "leaderboard store configured");
        } else {
            tracing::info!("LEADERBOARD_STORE_URL not set; keeping high scores in memory");
        }

        if let Some(base_url) = &settings.display_service_url {
            let client = HttpDisplayClient::new(
                base_url.clone(),
                settings.display_slot_prefix.clone(),
                settings.request_timeout,
            )
            .map_err(|e| client_init_error("display", e))?;
            collaborators.display = Arc::new(client);
            tracing::debug!(display_base_url = %base_url, "display client configured");
        } else {
            tracing::info!("DISPLAY_SERVICE_URL not set; display updates are logged only");
        }

        Ok(collaborators)
    }
}

fn client_init_error(name: &str, e: reqwest::Error) -> std::io::Error {
    std::io::Error::other(format!("failed to initialize {name} client: {e}"))
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let collaborators = Collaborators::from_settings(&CollaboratorSettings::from_env())?;
    run_with(listener, ServerSettings::from_env(), collaborators).await
}

pub async fn run_with(
    listener: tokio::net::TcpListener,
    settings: ServerSettings,
    collaborators: Collaborators,
) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(&settings, collaborators);
    let app = app(state);

    tracing::info!(
        %address,
        room_query_field = %settings.room_query_field,
        debounce_ms = settings.score_broadcast_debounce.as_millis(),
        "listening"
    );

    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state(settings: &ServerSettings, collaborators: Collaborators) -> Arc<AppState> {
    let (events_tx, events_rx) = mpsc::channel(settings.events_capacity);
    let (scores_tx, scores_rx) = broadcast::channel(settings.score_broadcast_capacity);
    let (score_bytes_tx, _) = broadcast::channel(settings.score_broadcast_capacity);
    let (score_latest_tx, _) = watch::channel(Utf8Bytes::from_static(""));

    // The session loop owns every room; everything else talks to it through events.
    tokio::spawn(session_task(
        SessionServer::new(collaborators.names.clone()),
        events_rx,
        scores_tx,
        settings.score_broadcast_debounce,
    ));
    tokio::spawn(score_update_serializer(
        scores_rx,
        score_bytes_tx.clone(),
        score_latest_tx.clone(),
    ));

    let aggregator = LeaderboardAggregator::new(
        collaborators.store,
        collaborators.display,
        collaborators.clock,
        settings.leaderboard_size,
    );

    Arc::new(AppState {
        events_tx,
        score_bytes_tx,
        score_latest_tx,
        identity: collaborators.identity,
        aggregator: Arc::new(aggregator),
        room_query_field: Arc::from(settings.room_query_field.as_str()),
        snapshot_timeout: settings.snapshot_timeout,
    })
}
