use crate::domain::{PlayerId, SessionError, WorldPos};
use crate::interface_adapters::http::error_response;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::next_conn_id;
use crate::use_cases::{GameEvent, Outbound, OutboundFrame, SessionHandle, SessionState};

use axum::{
    Error,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    InputClosed,
    FramesClosed,
}

#[derive(Debug, serde::Deserialize)]
pub struct SessionQuery {
    // The session the client wants to play in.
    #[serde(default)]
    session_id: Option<String>,
}

/// Explicit per-connection identity, resolved once at the transport boundary.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub session_id: Arc<str>,
    pub player_id: PlayerId,
}

pub async fn outbound_serializer(
    mut events_rx: broadcast::Receiver<Outbound>,
    frames_tx: broadcast::Sender<OutboundFrame>,
) {
    // Serialize each outbound event once and broadcast the shared bytes.
    loop {
        match events_rx.recv().await {
            Ok(outbound) => {
                let msg = ServerMessage::from(outbound.event);
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize outbound event");
                        continue;
                    }
                };

                let _ = frames_tx.send(OutboundFrame {
                    recipient: outbound.recipient,
                    bytes: Utf8Bytes::from(txt),
                });
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "outbound serializer lagged; events dropped");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("outbound events channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_session_serializer(session: &SessionHandle) {
    // Spawn a task that serializes outbound events for this session.
    tokio::spawn(outbound_serializer(
        session.events_tx.subscribe(),
        session.frames_tx.clone(),
    ));
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> impl IntoResponse {
    let session_id = query
        .session_id
        .unwrap_or_else(|| state.default_session_id.to_string());

    let session = match state.session_registry.get_session(&session_id).await {
        Some(session) => session,
        None => {
            // Keep not-found responses consistent with the JSON error schema.
            return error_response(
                StatusCode::NOT_FOUND,
                SessionError::UnknownSession.to_string(),
            );
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, session))
}

async fn handle_socket(mut socket: WebSocket, session: SessionHandle) {
    // The connection id doubles as the player id inside the session.
    let mut ctx = bootstrap_connection(&session, next_conn_id());
    let span = info_span!(
        "conn",
        conn_id = ctx.conn.player_id,
        session_id = %ctx.conn.session_id
    );

    async move {
        if ctx
            .input_tx
            .send(GameEvent::Connect {
                player_id: ctx.conn.player_id,
            })
            .await
            .is_err()
        {
            warn!("session closed before connection was attached");
            let _ = send_close_with_reason(&mut socket, close_code::AWAY, "session closed").await;
            return;
        }
        info!("client connected");

        // Main Client Loop
        if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
            warn!(error = ?e, "client loop exited with error");
        }
    }
    .instrument(span)
    .await
}

struct ConnCtx {
    pub conn: ConnectionContext,
    pub input_tx: mpsc::Sender<GameEvent>,
    pub frames_rx: broadcast::Receiver<OutboundFrame>,
    pub session_state_rx: watch::Receiver<SessionState>,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub frames_lagged: u64,

    pub invalid_json: u32,

    pub last_input_full_log: Instant,
    pub last_frames_lag_log: Instant,
    pub last_invalid_input_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

fn bootstrap_connection(session: &SessionHandle, conn_id: u64) -> ConnCtx {
    // Subscribe to outbound frames *before* sending anything into the session so no event
    // addressed to this connection (its own AssignId in particular) can be missed.
    let frames_rx = session.frames_tx.subscribe();
    let session_state_rx = session.state_tx.subscribe();

    let now = Instant::now() - LOG_THROTTLE;
    ConnCtx {
        conn: ConnectionContext {
            session_id: session.session_id.clone(),
            player_id: conn_id,
        },
        input_tx: session.input_tx.clone(),
        frames_rx,
        session_state_rx,

        msgs_in: 0,
        msgs_out: 0,
        bytes_in: 0,
        bytes_out: 0,
        frames_lagged: 0,

        invalid_json: 0,

        last_input_full_log: now,
        last_frames_lag_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
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

// Structural check only: positions are otherwise trusted as reported.
fn finite_position(x: f32, y: f32) -> Option<WorldPos> {
    (x.is_finite() && y.is_finite()).then_some(WorldPos::new(x, y))
}

// Maps a parsed client message onto a session event.
fn to_game_event(player_id: PlayerId, msg: ClientMessage) -> Option<GameEvent> {
    match msg {
        ClientMessage::RegisterMap(map) => Some(GameEvent::RegisterMap {
            player_id,
            map: map.into(),
        }),
        ClientMessage::NewPlayer => Some(GameEvent::Join { player_id }),
        ClientMessage::MovePlayer(m) => {
            finite_position(m.x, m.y).map(|pos| GameEvent::Move {
                player_id,
                pos,
                facing: m.facing.into(),
            })
        }
        ClientMessage::PlaceBomb(b) => {
            finite_position(b.x, b.y).map(|_| GameEvent::PlaceBomb {
                player_id,
                bomb_id: b.id,
                x: b.x,
                y: b.y,
            })
        }
    }
}

async fn forward_event(
    player_id: PlayerId,
    input_tx: &mpsc::Sender<GameEvent>,
    event: GameEvent,
    last_input_full_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    // Moves are superseded by the next one, so they may be dropped under load.
    if matches!(event, GameEvent::Move { .. }) {
        return match input_tx.try_send(event) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(mpsc::error::TrySendError::Full(_evt)) => {
                if should_log(last_input_full_log) {
                    warn!(player_id, "input channel full; dropping move");
                }
                Ok(LoopControl::Continue)
            }
            Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::InputClosed),
        };
    }

    input_tx
        .send(event)
        .await
        .map_err(|_| NetError::InputClosed)?;
    Ok(LoopControl::Continue)
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.conn.player_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        input_tx,
        frames_rx,
        session_state_rx,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        frames_lagged,
        invalid_json,
        last_input_full_log,
        last_frames_lag_log,
        last_invalid_input_log,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    player_id,
                    input_tx,
                    msgs_in,
                    bytes_in,
                    invalid_json,
                    last_input_full_log,
                    last_invalid_input_log,
                    close_frame,
                ).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing session events addressed to this player
            frame = frames_rx.recv() => {
                match frame {
                    Ok(frame) if frame.recipient.includes(player_id) => {
                        match forward_frame(frame.bytes, socket, msgs_out, bytes_out).await {
                            LoopControl::Continue => false,
                            LoopControl::Disconnect => true,
                        }
                    }
                    Ok(_) => false,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // The next position broadcast resynchronizes players; other
                        // missed events are gone.
                        *frames_lagged += n;
                        if should_log(last_frames_lag_log) {
                            warn!(player_id, missed = n, "outbound frames lagged");
                        }
                        false
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::FramesClosed);
                        true
                    }
                }
            }

            // Session lifecycle
            changed = session_state_rx.changed() => {
                let closed = changed.is_err()
                    || *session_state_rx.borrow_and_update() == SessionState::Closed;
                if closed {
                    *close_frame = Some(CloseFrame {
                        code: close_code::AWAY,
                        reason: "session closed".into(),
                    });
                    info!(player_id, "session closed; disconnecting");
                }
                closed
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    disconnect_cleanup(
        player_id,
        input_tx,
        *msgs_in,
        *msgs_out,
        *bytes_in,
        *bytes_out,
        *invalid_json,
        *frames_lagged,
    )
    .await;

    if let Some(err) = fatal {
        Err(err)
    } else {
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    player_id: PlayerId,
    input_tx: &mpsc::Sender<GameEvent>,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    last_input_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                *msgs_in += 1;
                *bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => match to_game_event(player_id, msg) {
                        Some(event) => {
                            forward_event(player_id, input_tx, event, last_input_full_log).await
                        }
                        None => {
                            if should_log(last_invalid_input_log) {
                                warn!(player_id, "invalid coordinates (NaN/inf); dropping");
                            }
                            Ok(LoopControl::Continue)
                        }
                    },
                    Err(parse_err) => {
                        *invalid_json += 1;
                        if should_log(last_invalid_input_log) {
                            warn!(
                                player_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if *invalid_json > MAX_INVALID_JSON {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_frame(
    bytes: Utf8Bytes,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let bytes_len = bytes.len();
    match socket.send(Message::Text(bytes)).await.map_err(NetError::Ws) {
        Ok(()) => {
            *msgs_out += 1;
            *bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send session event");
            LoopControl::Disconnect
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn disconnect_cleanup(
    player_id: PlayerId,
    input_tx: &mpsc::Sender<GameEvent>,
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    frames_lagged: u64,
) {
    // A closed input channel means the session is already gone; nothing to clean up.
    if input_tx.send(GameEvent::Leave { player_id }).await.is_err() {
        debug!(player_id, "session closed before leave");
    }

    debug!(
        player_id,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        frames_lagged,
        "connection stats"
    );
    info!(player_id, "client disconnected");
}
