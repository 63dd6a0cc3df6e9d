//! Server bootstrap and shared state.

use axum::Router;
use std::sync::Arc;

use crate::api;
use crate::config::ServerConfig;
use crate::counter::{OrbitCounterStore, VisitCounter};
use crate::error::Result;
use crate::roster::RosterBroadcaster;
use crate::storage::ScalarFile;

/// State shared by every request and socket.
pub struct NullismState {
    pub counter: OrbitCounterStore,
    pub roster: RosterBroadcaster,
}

pub type AppState = Arc<NullismState>;

/// A Nullism server instance.
pub struct NullismServer {
    state: AppState,
    config: ServerConfig,
}

impl NullismServer {
    /// Open both counters and build the shared state.
    pub async fn new(config: ServerConfig) -> Result<Self> {
        // Ensure data directory exists
        tokio::fs::create_dir_all(&config.data_dir).await?;

        let counter =
            OrbitCounterStore::open(ScalarFile::new(config.counter_path()), config.initial_orbits)
                .await;
        let visits =
            VisitCounter::open(ScalarFile::new(config.visits_path()), config.initial_visits).await;

        let state = Arc::new(NullismState {
            counter,
            roster: RosterBroadcaster::new(visits),
        });

        Ok(Self { state, config })
    }

    /// Get the shared state.
    pub fn state(&self) -> AppState {
        Arc::clone(&self.state)
    }

    pub fn router(&self) -> Router {
        api::build_router(self.state(), &self.config.static_dir)
    }

    /// Serve HTTP and WebSocket traffic until the listener fails.
    pub async fn run(self) -> Result<()> {
        let app = self.router();

        tracing::info!("Nullism server starting");
        tracing::info!("  Data: {:?}", self.config.data_dir);
        tracing::info!("  Static: {:?}", self.config.static_dir);
        tracing::info!("  Global orbit count: {}", self.state.counter.read());
        tracing::info!("  Total visits: {}", self.state.roster.total_visits());
        if self.config.initial_orbits.is_none() {
            tracing::info!("  Set GLOBAL_ORBIT_COUNTER to override the orbit count");
        }
        if self.config.initial_visits.is_none() {
            tracing::info!("  Set TOTAL_VISITS to override the visit count");
        }

        let listener = tokio::net::TcpListener::bind(self.config.listen_addr).await?;
        tracing::info!("HTTP server listening on {}", self.config.listen_addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
