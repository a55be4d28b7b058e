use crate::interface_adapters::net::{
    entity_destroyed_handler, update_leaderboard_handler, ws_handler,
};
use crate::interface_adapters::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route(
            "/internal/events/entity-destroyed",
            post(entity_destroyed_handler),
        )
        .route(
            "/internal/rooms/{room_id}/leaderboard",
            post(update_leaderboard_handler),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RoomId, Verification};
    use crate::interface_adapters::clients::AllowAllVerifier;
    use crate::use_cases::test_support::{
        FixedClock, RecordingDisplay, RecordingStore, SequenceNames,
    };
    use crate::use_cases::{
        ConnectRequest, LeaderboardAggregator, SessionEvent, SessionServer, session_task,
    };
    use axum::body::{Body, to_bytes};
    use axum::extract::ws::Utf8Bytes;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::time::Duration;
    use tokio::sync::{broadcast, mpsc, watch};
    use tower::ServiceExt;

    const NOW: u64 = 1_700_000_000_000;

    fn build_state(
        events_tx: mpsc::Sender<SessionEvent>,
        store: Arc<RecordingStore>,
    ) -> Arc<AppState> {
        let (score_bytes_tx, _) = broadcast::channel(4);
        let (score_latest_tx, _) = watch::channel(Utf8Bytes::from_static(""));
        let aggregator = LeaderboardAggregator::new(
            store,
            Arc::new(RecordingDisplay::default()),
            Arc::new(FixedClock(NOW)),
            3,
        );
        Arc::new(AppState {
            events_tx,
            score_bytes_tx,
            score_latest_tx,
            identity: Arc::new(AllowAllVerifier),
            aggregator: Arc::new(aggregator),
            room_query_field: Arc::from("assetId"),
            snapshot_timeout: Duration::from_secs(1),
        })
    }

    fn build_test_app(store: RecordingStore) -> (Router, mpsc::Sender<SessionEvent>) {
        let (events_tx, events_rx) = mpsc::channel(64);
        let (scores_tx, _) = broadcast::channel(4);
        tokio::spawn(session_task(
            SessionServer::new(Arc::new(SequenceNames::default())),
            events_rx,
            scores_tx,
            Duration::from_millis(10),
        ));
        let app = app(build_state(events_tx.clone(), Arc::new(store)));
        (app, events_tx)
    }

    fn post_json(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("expected request to build")
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("expected response body");
        serde_json::from_slice(&body).expect("expected json body")
    }

    async fn join_with_ship(events_tx: &mpsc::Sender<SessionEvent>, conn_id: u64, room: &str) {
        let request = ConnectRequest {
            conn_id,
            player_id: conn_id,
            room_id: RoomId::parse(room).expect("room"),
            verification: Verification {
                authorized: true,
                display_name: None,
                identity_id: Some(format!("visitor-{conn_id}")),
            },
        };
        events_tx
            .send(SessionEvent::ConnectionOpened(request))
            .await
            .expect("send");
        events_tx
            .send(SessionEvent::RestartRequested { conn_id })
            .await
            .expect("send");
    }

    #[tokio::test]
    async fn when_entity_destroyed_is_posted_then_returns_202() {
        let (app, _events_tx) = build_test_app(RecordingStore::default());

        let response = app
            .oneshot(post_json(
                "/internal/events/entity-destroyed",
                r#"{"destroyer":1,"destroyed":2}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn when_room_id_is_blank_then_leaderboard_returns_400_and_error_message() {
        let (app, _events_tx) = build_test_app(RecordingStore::default());

        let response = app
            .oneshot(post_json("/internal/rooms/%20/leaderboard", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = json_body(response).await;
        assert_eq!(payload["error"], "request has no valid room id");
    }

    #[tokio::test]
    async fn when_room_has_a_kill_then_leaderboard_reports_updated_entries() {
        let (app, events_tx) = build_test_app(RecordingStore::with_record("abc", Vec::new()));
        join_with_ship(&events_tx, 1, "abc").await;
        join_with_ship(&events_tx, 2, "abc").await;
        // Ships are entities 1 and 2, spawned in join order.
        events_tx
            .send(SessionEvent::EntityDestroyed {
                destroyer: 1,
                destroyed: 2,
            })
            .await
            .expect("send");

        let response = app
            .oneshot(post_json("/internal/rooms/abc/leaderboard", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload["status"], "updated");
        assert_eq!(payload["entries"][0]["id"], "visitor-1");
        assert_eq!(payload["entries"][0]["score"], 1);
        assert_eq!(payload["entries"][0]["date"], NOW);
    }

    #[tokio::test]
    async fn when_store_fails_then_leaderboard_returns_503() {
        let (app, _events_tx) = build_test_app(RecordingStore::failing_fetch());

        let response = app
            .oneshot(post_json("/internal/rooms/abc/leaderboard", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let payload = json_body(response).await;
        assert_eq!(payload["error"], "leaderboard store: store upstream error 500");
    }

    #[tokio::test]
    async fn when_session_loop_is_gone_then_leaderboard_returns_503() {
        let (events_tx, events_rx) = mpsc::channel(1);
        drop(events_rx);
        let app = app(build_state(events_tx, Arc::new(RecordingStore::default())));

        let response = app
            .oneshot(post_json("/internal/rooms/abc/leaderboard", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let payload = json_body(response).await;
        assert_eq!(payload["error"], "room snapshot unavailable");
    }
}
