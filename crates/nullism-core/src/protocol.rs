//! Wire protocol: realtime events and HTTP bodies.
//!
//! Realtime frames are JSON text, tagged by event name:
//!
//! ```text
//! server → client   {"event":"userCount","data":3}
//!                   {"event":"usersData","data":[{...participant...}]}
//! client → server   {"event":"orbitCompleted"}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::participant::{ConnectionId, Participant};

/// Errors decoding or validating wire data.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame was not valid JSON for the expected event set
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Direction other than +1 / -1
    #[error("invalid direction {0}, expected 1 or -1")]
    InvalidDirection(i8),

    /// Negative or non-finite speed
    #[error("invalid speed {0}")]
    InvalidSpeed(f64),
}

/// Events pushed from the server to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Handshake: the id this connection was assigned.
    Connected(ConnectionId),
    /// Number of live connections.
    UserCount(usize),
    /// Connections ever accepted, across restarts.
    TotalVisits(u64),
    /// Full roster, in join order.
    UsersData(Vec<Participant>),
}

impl ServerEvent {
    /// Encode as a text frame.
    pub fn to_frame(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a text frame.
    pub fn from_frame(frame: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(frame)?)
    }

    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connected(_) => "connected",
            ServerEvent::UserCount(_) => "userCount",
            ServerEvent::TotalVisits(_) => "totalVisits",
            ServerEvent::UsersData(_) => "usersData",
        }
    }
}

/// Events sent by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// The sender finished an orbit. Fire-and-forget.
    OrbitCompleted,
}

impl ClientEvent {
    pub fn to_frame(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_frame(frame: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(frame)?)
    }
}

/// `GET /api/counter`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterResponse {
    pub orbits: u64,
}

/// `POST /api/increment` on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementResponse {
    pub orbits: u64,
    pub message: String,
}

/// Any non-2xx JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub orbits: u64,
    pub total_visits: u64,
    pub active_users: usize,
    /// RFC 3339, UTC, millisecond precision
    pub timestamp: String,
}
