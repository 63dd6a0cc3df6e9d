//! Nullism Core
//!
//! Shared model for the orbit ritual: visitors drag an avatar around a circle,
//! every full revolution counts as one orbit, and every other connected visitor
//! appears as an autonomous worshipper walking the same circle.
//!
//! # Layout
//!
//! - **Angle**: wrap-safe angular arithmetic on the orbit circle
//! - **Gesture**: pointer samples → orbit progress → completion events
//! - **Behavior**: motion policies and their randomized factory
//! - **Participant**: roster entries as the server allocates them
//! - **Worshipper**: per-frame simulation of a remote participant
//! - **Protocol**: realtime events and HTTP bodies on the wire
//! - **Scene**: client-side reconciliation of all of the above
//!
//! Nothing here performs I/O. Randomness is always injected so the server and
//! tests can drive it deterministically.
//!
//! # Example
//!
//! ```
//! use nullism_core::OrbitGesture;
//!
//! let mut gesture = OrbitGesture::new(0.0);
//! gesture.begin(1.0, 0.0);
//!
//! let mut completions = 0;
//! for step in 1..=40 {
//!     let angle = step as f64 * std::f64::consts::TAU / 32.0;
//!     if gesture.update(angle.cos(), angle.sin()).is_some() {
//!         completions += 1;
//!     }
//! }
//! gesture.end();
//!
//! assert_eq!(completions, 1);
//! ```

mod angle;
mod behavior;
mod geometry;
mod gesture;
mod messages;
mod participant;
mod protocol;
mod scene;
mod worshipper;

pub use angle::{angle_of, normalize_delta, point_on_circle, snap_wrap};
pub use behavior::{random_behavior, Behavior, BehaviorKind, Direction};
pub use geometry::OrbitGeometry;
pub use gesture::{OrbitCompleted, OrbitGesture};
pub use messages::{pick_celebration, CELEBRATIONS};
pub use participant::{random_icon, ConnectionId, Participant, ParticipantId, ICONS};
pub use protocol::{
    ClientEvent, CounterResponse, ErrorResponse, HealthResponse, IncrementResponse, ProtocolError,
    ServerEvent,
};
pub use scene::{ClientAction, OrbitScene};
pub use worshipper::{WorshipperActor, MAX_DWELL_MS, MIN_DWELL_MS, STOP_PROBABILITY};

/// One full orbit, in radians.
pub const FULL_ORBIT: f64 = std::f64::consts::TAU;
