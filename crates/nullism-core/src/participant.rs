//! Roster entries.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;

use crate::behavior::{random_behavior, Behavior};

/// Process-scoped participant number, assigned in connection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque session identifier handed out by the realtime transport.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Length of a generated id in random bytes (hex doubles it).
    const RANDOM_BYTES: usize = 10;

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; Self::RANDOM_BYTES];
        rng.fill(&mut bytes[..]);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Avatar glyphs a participant may be assigned.
#[rustfmt::skip]
pub const ICONS: [&str; 20] = [
    "👦", "👧", "👨", "👩", "🧍‍♂️", "🧍‍♀️",
    "👶", "👨‍🦰", "👩‍🦰", "👨‍🦱", "👩‍🦱",
    "👨‍🦲", "👩‍🦲", "👨‍🦳", "👩‍🦳", "👴", "👵",
    "🧍", "👤", "👥",
];

/// Glyph shown when a roster entry arrives without one.
pub const FALLBACK_ICON: &str = "👤";

/// Draw an avatar glyph uniformly from [`ICONS`].
pub fn random_icon<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    ICONS[rng.gen_range(0..ICONS.len())]
}

/// One live connection, as every client sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub connection_id: ConnectionId,
    pub connected_at: DateTime<Utc>,
    /// Radians; nominally `[0, 2π)`.
    pub position: f64,
    #[serde(default = "fallback_icon")]
    pub icon: String,
    #[serde(flatten)]
    pub behavior: Behavior,
    #[serde(default)]
    pub orbits_completed: u64,
}

fn fallback_icon() -> String {
    FALLBACK_ICON.to_string()
}

impl Participant {
    /// Allocate a participant with randomized position, icon and behavior.
    pub fn spawn<R: Rng + ?Sized>(
        id: ParticipantId,
        connection_id: ConnectionId,
        connected_at: DateTime<Utc>,
        rng: &mut R,
    ) -> Self {
        let position = rng.gen_range(0.0..TAU);
        let icon = random_icon(rng).to_string();
        let behavior = random_behavior(rng);
        Self {
            id,
            connection_id,
            connected_at,
            position,
            icon,
            behavior,
            orbits_completed: 0,
        }
    }

    /// Tally one reported orbit and return the new total.
    pub fn record_orbit(&mut self) -> u64 {
        self.orbits_completed += 1;
        self.orbits_completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::Direction;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample(rng: &mut StdRng) -> Participant {
        Participant::spawn(ParticipantId(1), ConnectionId::new("abc"), Utc::now(), rng)
    }

    #[test]
    fn spawn_randomizes_within_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let participant = sample(&mut rng);
            assert!((0.0..TAU).contains(&participant.position));
            assert!(ICONS.contains(&participant.icon.as_str()));
            assert_eq!(participant.orbits_completed, 0);
        }
    }

    #[test]
    fn record_orbit_counts_up() {
        let mut participant = sample(&mut StdRng::seed_from_u64(1));
        assert_eq!(participant.record_orbit(), 1);
        assert_eq!(participant.record_orbit(), 2);
    }

    #[test]
    fn random_connection_ids_differ() {
        let mut rng = StdRng::seed_from_u64(5);
        let a = ConnectionId::random(&mut rng);
        let b = ConnectionId::random(&mut rng);
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 20);
    }

    #[test]
    fn wire_shape_is_flat_camel_case() {
        let participant = Participant {
            id: ParticipantId(4),
            connection_id: ConnectionId::new("c-4"),
            connected_at: Utc::now(),
            position: 1.25,
            icon: "👵".into(),
            behavior: Behavior::Moving {
                speed: 0.03,
                direction: Direction::Forward,
            },
            orbits_completed: 2,
        };

        let json = serde_json::to_value(&participant).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["connectionId"], "c-4");
        assert_eq!(json["type"], "moving");
        assert_eq!(json["direction"], 1);
        assert_eq!(json["orbitsCompleted"], 2);
        assert!(json["connectedAt"].is_string());

        let parsed: Participant = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, participant);
    }

    #[test]
    fn missing_icon_falls_back() {
        let json = serde_json::json!({
            "id": 1,
            "connectionId": "x",
            "connectedAt": "2025-01-01T00:00:00Z",
            "position": 0.5,
            "type": "stationary",
            "speed": 0,
            "direction": 0
        });
        let parsed: Participant = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.icon, FALLBACK_ICON);
        assert_eq!(parsed.behavior, Behavior::Stationary);
        assert_eq!(parsed.orbits_completed, 0);
    }
}
