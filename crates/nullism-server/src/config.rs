//! Server configuration from environment variables.

use crate::error::{Error, Result};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// File holding the global orbit counter.
pub const COUNTER_FILE: &str = ".orbit_counter";

/// File holding the total visit counter.
pub const VISITS_FILE: &str = ".total_visits";

/// Configuration for a Nullism server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP + WebSocket listen address
    pub listen_addr: SocketAddr,

    /// Directory holding the counter files
    pub data_dir: PathBuf,

    /// Directory served for everything that is not an API route
    pub static_dir: PathBuf,

    /// Operator override for the global orbit counter
    pub initial_orbits: Option<u64>,

    /// Operator override for the total visit counter
    pub initial_visits: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            data_dir: PathBuf::from("."),
            static_dir: PathBuf::from("public"),
            initial_orbits: None,
            initial_visits: None,
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host: IpAddr = parse_var(&lookup, "NULLISM_BIND_ADDR")?
            .unwrap_or_else(|| defaults.listen_addr.ip());
        let port: u16 = parse_var(&lookup, "PORT")?
            .unwrap_or_else(|| defaults.listen_addr.port());

        let data_dir = lookup("NULLISM_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let static_dir = lookup("NULLISM_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        Ok(Self {
            listen_addr: SocketAddr::new(host, port),
            data_dir,
            static_dir,
            initial_orbits: parse_var(&lookup, "GLOBAL_ORBIT_COUNTER")?,
            initial_visits: parse_var(&lookup, "TOTAL_VISITS")?,
        })
    }

    /// Path of the orbit counter file.
    pub fn counter_path(&self) -> PathBuf {
        self.data_dir.join(COUNTER_FILE)
    }

    /// Path of the visit counter file.
    pub fn visits_path(&self) -> PathBuf {
        self.data_dir.join(VISITS_FILE)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("{key}={raw:?}: {e}"))),
    }
}
