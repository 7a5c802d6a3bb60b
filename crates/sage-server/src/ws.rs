//! Per-connection gateway loop
//!
//! Connecting at `/ws/:client_id` registers a session; each inbound text
//! frame is a plain query. Admission control runs before every query, and
//! orchestration errors turn into user-visible notices without ever
//! terminating the loop. Only transport failure closes a session.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use sage_core::ConversationLog;

use crate::registry::SessionHandle;
use crate::server::AppState;

/// Fixed notice sent when a query is denied by the quota tracker
pub const THROTTLE_NOTICE: &str =
    "Rate limit exceeded. Please wait before sending more messages.";

/// Fixed notice sent when retrieval or generation fails
pub const ERROR_NOTICE: &str = "Sorry, there was an error processing your request.";

/// Upgrade handler; accepting the connection registers the session
pub async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, client_id))
}

/// Connection control loop: Connecting -> Open -> Closed.
///
/// The conversation log lives on this task's stack and is handed to the
/// orchestrator by mutable borrow - no other task can ever observe it.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, client_id: String) {
    info!(%client_id, "client connected");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let handle = state.registry.register(client_id.clone(), tx);

    let mut log = ConversationLog::new();
    // Set after a throttling notice; pauses inbound reads for this
    // connection only while outbound delivery keeps flowing.
    let mut cooldown_until: Option<Instant> = None;

    loop {
        if let Some(until) = cooldown_until {
            tokio::select! {
                _ = tokio::time::sleep_until(until) => {
                    cooldown_until = None;
                }
                outbound = rx.recv() => match outbound {
                    Some(text) => {
                        if sink.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
            }
            continue;
        }

        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(text) => {
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                None => break,
            },

            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(query))) => {
                    let query = query.trim().to_string();
                    if query.is_empty() {
                        continue;
                    }

                    // Inline call keeps queries from one session in strict
                    // receipt order; a disconnect drops this task and any
                    // in-flight backend round-trip with it.
                    if let Some(until) = process_query(&state, &handle, &mut log, &query).await
                    {
                        cooldown_until = Some(until);
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Ping/pong is answered at the protocol layer; binary
                // frames carry no queries
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(%client_id, error = %e, "transport error");
                    break;
                }
            },
        }
    }

    // Teardown runs on every exit path, abnormal disconnects included.
    // Unregistering by handle keeps a stale teardown from evicting a
    // session that reconnected under the same identity; the departure
    // broadcast only goes out when this task's session was the live one.
    if state.registry.unregister(&handle) {
        state
            .registry
            .broadcast(&format!("Client {} left the chat", client_id));
    }
    info!(%client_id, "client disconnected");
}

/// Admission check plus orchestration for one inbound query.
///
/// Sends the answer or a fixed notice through the session handle; returns
/// the cooldown deadline when the quota tracker denies the query.
async fn process_query(
    state: &AppState,
    handle: &SessionHandle,
    log: &mut ConversationLog,
    query: &str,
) -> Option<Instant> {
    let client_id = &handle.identity;

    if !state.quota.admit(client_id).await {
        debug!(%client_id, "query throttled");
        let _ = handle.send(THROTTLE_NOTICE);
        return Some(Instant::now() + state.cooldown);
    }

    match state.agent.answer(log, query).await {
        Ok(answer) => {
            info!(%client_id, chars = answer.len(), "answer delivered");
            let _ = handle.send(answer);
        }
        Err(e) => {
            error!(%client_id, error = %e, "query failed");
            let _ = handle.send(ERROR_NOTICE);
        }
    }
    None
}
