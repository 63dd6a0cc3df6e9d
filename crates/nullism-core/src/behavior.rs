//! Motion policies for autonomous worshippers.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::protocol::ProtocolError;

/// Direction of travel around the orbit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Increasing angle (clockwise on screen)
    Forward,
    /// Decreasing angle
    Backward,
}

impl Direction {
    /// Multiplier applied to speed: `+1.0` or `-1.0`.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }

    /// Pick either direction with equal probability.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }
}

impl From<Direction> for i8 {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

impl TryFrom<i8> for Direction {
    type Error = ProtocolError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Direction::Forward),
            -1 => Ok(Direction::Backward),
            other => Err(ProtocolError::InvalidDirection(other)),
        }
    }
}

/// Discriminant of a [`Behavior`], as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorKind {
    Moving,
    Stationary,
    Intermittent,
}

/// How a remote participant moves between roster snapshots.
///
/// Speeds are radians per render tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "BehaviorRepr", try_from = "BehaviorRepr")]
pub enum Behavior {
    /// Never moves.
    Stationary,
    /// Advances every tick, unconditionally.
    Moving { speed: f64, direction: Direction },
    /// Advances like `Moving`, but occasionally stops for a dwell period.
    Intermittent { speed: f64, direction: Direction },
}

impl Behavior {
    /// Wire discriminant.
    pub fn kind(&self) -> BehaviorKind {
        match self {
            Behavior::Stationary => BehaviorKind::Stationary,
            Behavior::Moving { .. } => BehaviorKind::Moving,
            Behavior::Intermittent { .. } => BehaviorKind::Intermittent,
        }
    }

    /// Signed per-tick step while the participant is in motion.
    pub fn step(&self) -> f64 {
        match *self {
            Behavior::Stationary => 0.0,
            Behavior::Moving { speed, direction } | Behavior::Intermittent { speed, direction } => {
                speed * direction.sign()
            }
        }
    }
}

/// Flat `{type, speed, direction}` shape that browsers consume.
///
/// Stationary participants carry `speed: 0` and `direction: 0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct BehaviorRepr {
    #[serde(rename = "type")]
    kind: BehaviorKind,
    speed: f64,
    direction: i8,
}

impl From<Behavior> for BehaviorRepr {
    fn from(behavior: Behavior) -> Self {
        match behavior {
            Behavior::Stationary => BehaviorRepr {
                kind: BehaviorKind::Stationary,
                speed: 0.0,
                direction: 0,
            },
            Behavior::Moving { speed, direction } | Behavior::Intermittent { speed, direction } => {
                BehaviorRepr {
                    kind: behavior.kind(),
                    speed,
                    direction: direction.into(),
                }
            }
        }
    }
}

impl TryFrom<BehaviorRepr> for Behavior {
    type Error = ProtocolError;

    fn try_from(repr: BehaviorRepr) -> Result<Self, Self::Error> {
        if !(repr.speed.is_finite() && repr.speed >= 0.0) {
            return Err(ProtocolError::InvalidSpeed(repr.speed));
        }
        Ok(match repr.kind {
            BehaviorKind::Stationary => Behavior::Stationary,
            BehaviorKind::Moving => Behavior::Moving {
                speed: repr.speed,
                direction: Direction::try_from(repr.direction)?,
            },
            BehaviorKind::Intermittent => Behavior::Intermittent {
                speed: repr.speed,
                direction: Direction::try_from(repr.direction)?,
            },
        })
    }
}

/// A weighted slot in the behavior lottery.
struct BehaviorTemplate {
    kind: BehaviorKind,
    min_speed: f64,
    max_speed: f64,
}

/// Every slot is equally likely; three of the five are plain walkers.
const TEMPLATES: [BehaviorTemplate; 5] = [
    BehaviorTemplate {
        kind: BehaviorKind::Moving,
        min_speed: 0.02,
        max_speed: 0.05,
    },
    BehaviorTemplate {
        kind: BehaviorKind::Moving,
        min_speed: 0.01,
        max_speed: 0.03,
    },
    BehaviorTemplate {
        kind: BehaviorKind::Moving,
        min_speed: 0.03,
        max_speed: 0.07,
    },
    BehaviorTemplate {
        kind: BehaviorKind::Stationary,
        min_speed: 0.0,
        max_speed: 0.0,
    },
    BehaviorTemplate {
        kind: BehaviorKind::Intermittent,
        min_speed: 0.015,
        max_speed: 0.04,
    },
];

/// Draw a behavior for a freshly connected participant.
pub fn random_behavior<R: Rng + ?Sized>(rng: &mut R) -> Behavior {
    let template = &TEMPLATES[rng.gen_range(0..TEMPLATES.len())];
    match template.kind {
        BehaviorKind::Stationary => Behavior::Stationary,
        BehaviorKind::Moving => Behavior::Moving {
            speed: rng.gen_range(template.min_speed..template.max_speed),
            direction: Direction::random(rng),
        },
        BehaviorKind::Intermittent => Behavior::Intermittent {
            speed: rng.gen_range(template.min_speed..template.max_speed),
            direction: Direction::random(rng),
        },
    }
}
