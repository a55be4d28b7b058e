use crate::domain::entities::room_id_from_params;
use crate::domain::{ConnectionId, PlayerId, RoomId, SessionError, Verification};
use crate::interface_adapters::http::json_error;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage, score_board_dto};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::{next_connection_id, next_player_id};
use crate::use_cases::{ConnectRequest, ScoreBoard, SessionEvent};

use axum::{
    Error,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::SinkExt;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{Instrument, debug, error, info, info_span, warn};

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;

#[derive(Debug)]
enum NetError {
    Ws(axum::Error),
    Serialization(serde_json::Error),
    EventsClosed,
    ScoresClosed,
}

impl std::fmt::Display for NetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetError::Ws(e) => write!(f, "websocket error: {e}"),
            NetError::Serialization(e) => write!(f, "serialization error: {e}"),
            NetError::EventsClosed => write!(f, "session events closed"),
            NetError::ScoresClosed => write!(f, "score updates closed"),
        }
    }
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

/// Serializes each score board once and fans the shared bytes out to every connection.
pub async fn score_update_serializer(
    mut scores_rx: broadcast::Receiver<ScoreBoard>,
    score_bytes_tx: broadcast::Sender<Utf8Bytes>,
    score_latest_tx: watch::Sender<Utf8Bytes>,
) {
    loop {
        match scores_rx.recv().await {
            Ok(board) => {
                let msg = ServerMessage::ScoreUpdate(score_board_dto(&board));
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize score update");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                let _ = score_latest_tx.send(bytes.clone());
                let _ = score_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "score serializer lagged; skipping to latest board");
            }
            Err(broadcast::error::RecvError::Closed) => {
                info!("score updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let room_id = match room_id_from_params(&params, &state.room_query_field) {
        Ok(room_id) => room_id,
        Err(e) => {
            debug!(field = %state.room_query_field, error = %e, "rejecting connect request");
            return json_error(
                StatusCode::BAD_REQUEST,
                format!("{} query parameter is required", state.room_query_field),
            );
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, room_id, params))
        .into_response()
}

struct ConnCtx {
    conn_id: ConnectionId,
    player_id: PlayerId,
    can_play: bool,
    events_tx: mpsc::Sender<SessionEvent>,
    score_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    score_latest_rx: watch::Receiver<Utf8Bytes>,
    lag_recovery_count: u64,

    msgs_in: u64,
    msgs_out: u64,
    invalid_json: u32,

    last_events_full_log: Instant,
    last_score_lag_log: Instant,
    last_invalid_input_log: Instant,

    close_frame: Option<CloseFrame>,
}

enum LoopControl {
    Continue,
    Disconnect,
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    room_id: RoomId,
    credentials: HashMap<String, String>,
) {
    let conn_id = next_connection_id();
    let player_id = next_player_id();
    let span = info_span!("conn", conn_id, player_id, room_id = %room_id);
    serve_socket(socket, state, room_id, credentials, conn_id, player_id)
        .instrument(span)
        .await;
}

async fn serve_socket(
    mut socket: WebSocket,
    state: Arc<AppState>,
    room_id: RoomId,
    credentials: HashMap<String, String>,
    conn_id: ConnectionId,
    player_id: PlayerId,
) {
    // Subscribe before any await so no board emitted during the handshake is missed.
    let score_bytes_rx = state.score_bytes_tx.subscribe();
    let score_latest_rx = state.score_latest_tx.subscribe();

    let verification = match state.identity.verify(&room_id, &credentials).await {
        Ok(verification) => verification,
        Err(e) => {
            warn!(error = %e, "identity verification failed; joining as spectator");
            Verification::spectator()
        }
    };
    let can_play = verification.authorized;

    let opened = SessionEvent::ConnectionOpened(ConnectRequest {
        conn_id,
        player_id,
        room_id: room_id.clone(),
        verification,
    });
    if state.events_tx.send(opened).await.is_err() {
        warn!("session loop unavailable; refusing connection");
        let _ = send_close_with_reason(
            &mut socket,
            close_code::AGAIN,
            SessionError::RoomUnavailable.to_string(),
        )
        .await;
        return;
    }

    let mut ctx = ConnCtx {
        conn_id,
        player_id,
        can_play,
        events_tx: state.events_tx.clone(),
        score_bytes_rx,
        score_latest_rx,
        lag_recovery_count: 0,
        msgs_in: 0,
        msgs_out: 0,
        invalid_json: 0,
        last_events_full_log: Instant::now() - LOG_THROTTLE,
        last_score_lag_log: Instant::now() - LOG_THROTTLE,
        last_invalid_input_log: Instant::now() - LOG_THROTTLE,
        close_frame: None,
    };

    match send_welcome(&mut socket, &mut ctx, &room_id).await {
        Ok(()) => {
            info!(can_play, "client connected");
            if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
                warn!(error = %e, "client loop exited with error");
            }
        }
        Err(e) => warn!(error = %e, "failed to greet client"),
    }

    disconnect_cleanup(&ctx).await;
}

async fn send_welcome(
    socket: &mut WebSocket,
    ctx: &mut ConnCtx,
    room_id: &RoomId,
) -> Result<(), NetError> {
    let identity = ServerMessage::Identity {
        player_id: ctx.player_id.to_string(),
        room_id: room_id.to_string(),
        can_play: ctx.can_play,
    };
    send_message(socket, &identity).await?;
    ctx.msgs_out += 1;

    // Clone out of the watch before awaiting so the lock is not held across the send.
    let latest = ctx.score_latest_rx.borrow_and_update().clone();
    if !latest.is_empty() {
        socket.send(Message::Text(latest)).await?;
        ctx.msgs_out += 1;
    }
    Ok(())
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)
}

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: String,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await?;
    socket.close().await.map_err(NetError::Ws)
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, ctx) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            score_msg = ctx.score_bytes_rx.recv() => {
                match score_msg {
                    Ok(bytes) => matches!(
                        forward_score_bytes(bytes, socket, &mut ctx.msgs_out).await,
                        LoopControl::Disconnect
                    ),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(&mut ctx.last_score_lag_log) {
                            warn!(missed = n, "score updates lagged; sending latest board");
                        }
                        let latest = ctx.score_latest_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            ctx.lag_recovery_count += 1;
                            matches!(
                                forward_score_bytes(latest, socket, &mut ctx.msgs_out).await,
                                LoopControl::Disconnect
                            )
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::ScoresClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await {
                debug!(error = %err, "socket close error");
            }
            break;
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(Message::Text(text))) => {
            ctx.msgs_in += 1;
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => forward_client_message(msg, ctx),
                Err(parse_err) => {
                    ctx.invalid_json += 1;
                    if should_log(&mut ctx.last_invalid_input_log) {
                        warn!(
                            bytes = text.len(),
                            error = %parse_err,
                            "failed to parse client message"
                        );
                    }
                    if ctx.invalid_json > MAX_INVALID_JSON {
                        ctx.close_frame = Some(CloseFrame {
                            code: close_code::POLICY,
                            reason: "too many invalid messages".into(),
                        });
                        return Ok(LoopControl::Disconnect);
                    }
                    Ok(LoopControl::Continue)
                }
            }
        }
        Some(Ok(Message::Binary(_))) => {
            ctx.close_frame = Some(CloseFrame {
                code: close_code::UNSUPPORTED,
                reason: "binary messages not supported".into(),
            });
            Ok(LoopControl::Disconnect)
        }
        Some(Ok(Message::Ping(_) | Message::Pong(_))) => Ok(LoopControl::Continue),
        Some(Ok(Message::Close(_))) => Ok(LoopControl::Disconnect),
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            debug!("websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

fn forward_client_message(msg: ClientMessage, ctx: &mut ConnCtx) -> Result<LoopControl, NetError> {
    if !ctx.can_play {
        if should_log(&mut ctx.last_invalid_input_log) {
            warn!("spectator input ignored");
        }
        return Ok(LoopControl::Continue);
    }

    let conn_id = ctx.conn_id;
    let event = match msg {
        ClientMessage::RequestRestart => SessionEvent::RestartRequested { conn_id },
        ClientMessage::Fire => SessionEvent::ProjectileFired { conn_id },
    };

    match ctx.events_tx.try_send(event) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_)) => {
            if should_log(&mut ctx.last_events_full_log) {
                warn!("session events full; dropping input");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Err(NetError::EventsClosed),
    }
}

async fn forward_score_bytes(
    bytes: Utf8Bytes,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
) -> LoopControl {
    match socket.send(Message::Text(bytes)).await {
        Ok(()) => {
            *msgs_out += 1;
            LoopControl::Continue
        }
        Err(err) => {
            warn!(error = %err, "failed to send score update");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(ctx: &ConnCtx) {
    let closed = SessionEvent::ConnectionClosed {
        conn_id: ctx.conn_id,
        player_id: ctx.player_id,
    };
    if ctx.events_tx.send(closed).await.is_err() {
        warn!("session loop gone before disconnect could be recorded");
    }

    debug!(
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        invalid_json = ctx.invalid_json,
        lag_recovery_count = ctx.lag_recovery_count,
        "connection stats"
    );
    info!("client disconnected");
}
