//! Nullism server
//!
//! Keeps the global orbit counter and the total visit counter on disk,
//! serves them over HTTP, and runs a WebSocket channel that tells every
//! browser tab who else is orbiting right now.
//!
//! # Architecture
//!
//! - **Storage**: single-integer text files
//! - **Counter**: orbit counter with reject-on-contention increments, visit counter
//! - **Roster**: connected participants and the broadcast that fans changes out
//! - **Realtime**: one WebSocket task per connection
//! - **API**: HTTP endpoints, CORS and the static file fallback
//!
//! # Example
//!
//! ```no_run
//! use nullism_server::{NullismServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::from_env()?;
//!     NullismServer::new(config).await?.run().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod counter;
pub mod error;
pub mod realtime;
pub mod roster;
pub mod server;
pub mod storage;

pub use config::ServerConfig;
pub use counter::{Increment, IncrementError, OrbitCounterStore, VisitCounter};
pub use error::{Error, Result};
pub use roster::{Audience, Dispatch, Roster, RosterBroadcaster};
pub use server::{AppState, NullismServer, NullismState};
pub use storage::ScalarFile;
