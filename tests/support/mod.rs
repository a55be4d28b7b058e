// One-time room server bootstrap shared by the integration tests in a binary.
#![allow(dead_code)]

use futures::StreamExt;
use room_server::{Collaborators, ServerSettings};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use std::{
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

// Short debounce so score broadcasts arrive quickly in tests.
pub const TEST_DEBOUNCE: Duration = Duration::from_millis(50);

static SERVER_URL: OnceLock<String> = OnceLock::new();
static SERVER_READY: OnceLock<()> = OnceLock::new();

// Ensure the shared local test server is running and return its base URL (`http://host:port`).
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let _ = SERVER_URL.set(start_server(Collaborators::local()));
    });

    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

// Start a dedicated server with the given collaborators and return its base URL.
pub fn start_server(collaborators: Collaborators) -> String {
    let published_url = Arc::new(OnceLock::<String>::new());
    let published_url_thread = Arc::clone(&published_url);
    // Own runtime on an OS thread so the server outlives individual `#[tokio::test]` runtimes.
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().expect("test runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind ephemeral test port");
            let addr = listener.local_addr().expect("get local addr");
            let _ = published_url_thread.set(format!("http://{}", addr));

            let settings = ServerSettings {
                score_broadcast_debounce: TEST_DEBOUNCE,
                ..ServerSettings::default()
            };
            room_server::run_with(listener, settings, collaborators)
                .await
                .expect("server failed");
        });
    });
    wait_for_server_url_and_readiness(published_url)
}

pub fn ws_url(query: &str) -> String {
    ws_url_on(ensure_server(), query)
}

pub fn ws_url_on(base_url: &str, query: &str) -> String {
    let base = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");
    format!("ws://{base}/ws?{query}")
}

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub async fn connect(url: String) -> Client {
    let (stream, _) = tokio_tungstenite::connect_async(url)
        .await
        .expect("websocket connect");
    stream
}

// Reads JSON text frames until one satisfies `accept`, failing after a few seconds.
pub async fn next_matching(client: &mut Client, accept: impl Fn(&Value) -> bool) -> Value {
    let read = async {
        while let Some(frame) = client.next().await {
            let frame = frame.expect("websocket frame");
            let Message::Text(text) = frame else {
                continue;
            };
            let value: Value = serde_json::from_str(text.as_str()).expect("json frame");
            if accept(&value) {
                return value;
            }
        }
        panic!("socket closed before expected message");
    };
    tokio::time::timeout(Duration::from_secs(5), read)
        .await
        .expect("expected message in time")
}

// Room ids unique per call so tests sharing the server never see each other's scores.
pub fn unique_room(label: &str) -> String {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    format!("{label}-{}-{}", std::process::id(), NEXT.fetch_add(1, Ordering::Relaxed))
}

fn wait_for_server_url_and_readiness(published_url: Arc<OnceLock<String>>) -> String {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://")
        .to_string();

    // Retry briefly to avoid racing the server bind/accept.
    for _ in 0..100 {
        if std::net::TcpStream::connect(addr.as_str()).is_ok() {
            return base_url;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}
