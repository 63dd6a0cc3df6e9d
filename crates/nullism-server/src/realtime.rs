//! WebSocket realtime channel.
//!
//! One socket per browser tab. On open the connection is assigned an id,
//! told that id, and admitted to the roster; from then on it forwards every
//! roster dispatch addressed to it and reports `orbitCompleted` frames back.
//!
//! ```text
//! ┌─────────┐   {"event":"orbitCompleted"}    ┌──────────────────┐
//! │ Browser │ ──────────────────────────────→ │ RealtimeChannel  │
//! │  tab    │ ←────────────────────────────── │  (this socket)   │
//! └─────────┘  userCount / totalVisits /      └────────┬─────────┘
//!              usersData                               │ subscribe
//!                                             ┌────────▼─────────┐
//!                                             │ RosterBroadcaster │
//!                                             └──────────────────┘
//! ```

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use nullism_core::{ClientEvent, ConnectionId, ServerEvent};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::roster::{Dispatch, RosterBroadcaster};
use crate::server::AppState;

/// WebSocket handler for the realtime channel.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one connection from open to close.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let connection = ConnectionId::random(&mut rand::thread_rng());

    // Subscribe first so the join broadcasts reach this socket too
    let mut dispatches = state.roster.subscribe();

    if let Err(e) = send_event(&mut socket, &ServerEvent::Connected(connection.clone())).await {
        warn!(%connection, "Failed to send handshake: {}", e);
        return;
    }

    state.roster.on_connect(connection.clone()).await;

    loop {
        tokio::select! {
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_frame(&state, &connection, text.as_str()).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = socket.send(Message::Pong(data)).await {
                            warn!(%connection, "Failed to send pong: {}", e);
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        error!(%connection, "WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
            dispatch = dispatches.recv() => {
                match dispatch {
                    Ok(dispatch) => {
                        if !dispatch.is_for(&connection) {
                            continue;
                        }
                        if let Err(e) = send_event(&mut socket, &dispatch.event).await {
                            warn!(%connection, "Failed to send {}: {}", dispatch.event.name(), e);
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(%connection, skipped, "Connection lagged, resynchronizing");
                        resynchronize(&state.roster, &mut dispatches, &connection).await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    state.roster.on_disconnect(&connection).await;
}

/// Skip the stale backlog and queue the current state for `connection`.
async fn resynchronize(
    roster: &RosterBroadcaster,
    dispatches: &mut broadcast::Receiver<Dispatch>,
    connection: &ConnectionId,
) {
    *dispatches = dispatches.resubscribe();
    roster.resync(connection).await;
}

async fn handle_client_frame(state: &AppState, connection: &ConnectionId, frame: &str) {
    match ClientEvent::from_frame(frame) {
        Ok(ClientEvent::OrbitCompleted) => {
            state.roster.on_completion_reported(connection).await;
        }
        Err(e) => debug!(%connection, "Ignoring client frame: {}", e),
    }
}

/// Send a server event over the socket.
async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<()> {
    let frame = event.to_frame()?;
    socket
        .send(Message::Text(frame.into()))
        .await
        .map_err(|e| Error::Network(e.to_string()))
}
