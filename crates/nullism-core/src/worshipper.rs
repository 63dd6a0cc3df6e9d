//! Per-frame simulation of remote participants.
//!
//! Purely cosmetic: positions drift locally between roster snapshots and are
//! replaced wholesale by the next one. Nothing here feeds the orbit counter.

use rand::Rng;

use crate::angle::snap_wrap;
use crate::behavior::Behavior;
use crate::participant::Participant;

/// Per-tick chance that a walking intermittent worshipper stops.
pub const STOP_PROBABILITY: f64 = 0.001;

/// Shortest stop of an intermittent worshipper.
pub const MIN_DWELL_MS: u64 = 2_000;

/// Longest stop of an intermittent worshipper.
pub const MAX_DWELL_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    Walking,
    Resting { since_ms: u64 },
}

/// A remote participant walking the orbit on its own.
#[derive(Debug, Clone)]
pub struct WorshipperActor {
    participant: Participant,
    motion: Motion,
    dwell_ms: u64,
}

impl WorshipperActor {
    /// Start simulating `participant` from its snapshot position.
    ///
    /// The dwell length for intermittent stops is drawn once per actor.
    pub fn new<R: Rng + ?Sized>(participant: Participant, rng: &mut R) -> Self {
        let motion = match participant.behavior {
            Behavior::Stationary => Motion::Resting { since_ms: 0 },
            _ => Motion::Walking,
        };
        Self {
            participant,
            motion,
            dwell_ms: rng.gen_range(MIN_DWELL_MS..=MAX_DWELL_MS),
        }
    }

    /// Advance one render tick at wall time `now_ms`.
    pub fn tick<R: Rng + ?Sized>(&mut self, now_ms: u64, rng: &mut R) {
        match self.participant.behavior {
            Behavior::Stationary => return,
            Behavior::Moving { .. } => {}
            Behavior::Intermittent { .. } => {
                self.motion = match self.motion {
                    Motion::Walking if rng.gen_bool(STOP_PROBABILITY) => {
                        Motion::Resting { since_ms: now_ms }
                    }
                    Motion::Resting { since_ms }
                        if now_ms.saturating_sub(since_ms) > self.dwell_ms =>
                    {
                        Motion::Walking
                    }
                    unchanged => unchanged,
                };
            }
        }

        if self.motion == Motion::Walking {
            let step = self.participant.behavior.step();
            self.participant.position = snap_wrap(self.participant.position + step);
        }
    }

    /// Current angle on the orbit.
    pub fn position(&self) -> f64 {
        self.participant.position
    }

    /// Whether the worshipper moved on its last tick (drawn dimmer when not).
    pub fn is_walking(&self) -> bool {
        self.motion == Motion::Walking
    }

    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    /// Stop length for this actor's intermittent pauses.
    pub fn dwell_ms(&self) -> u64 {
        self.dwell_ms
    }
}
