//! Drag gesture → orbit progress state machine.
//!
//! Samples arrive as pointer positions relative to the orbit center. Each
//! sample contributes the unsigned, seam-corrected angular distance from the
//! previous one. Reversing does not undo progress: any angular travel counts.
//!
//! Once accumulated travel reaches `2π`, exactly one [`OrbitCompleted`] is
//! emitted and progress restarts from zero. Overshoot within that sample is
//! discarded.

use crate::angle::{angle_of, normalize_delta};
use crate::FULL_ORBIT;

/// Emitted once per completed revolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrbitCompleted {
    /// Completions recorded by this gesture tracker so far, this one included.
    pub count: u64,
}

/// Tracks one draggable avatar.
#[derive(Debug, Clone)]
pub struct OrbitGesture {
    current_angle: f64,
    previous_angle: f64,
    progress: f64,
    dragging: bool,
    completions: u64,
}

impl OrbitGesture {
    /// Create a tracker with the avatar resting at `initial_angle`.
    pub fn new(initial_angle: f64) -> Self {
        Self {
            current_angle: initial_angle,
            previous_angle: initial_angle,
            progress: 0.0,
            dragging: false,
            completions: 0,
        }
    }

    /// Pointer went down on the avatar at `(x, y)`.
    ///
    /// The pointer angle becomes the reference for the next sample. Progress
    /// carries over from earlier drags.
    pub fn begin(&mut self, x: f64, y: f64) {
        self.previous_angle = angle_of(x, y);
        self.dragging = true;
    }

    /// Pointer moved to `(x, y)`. Ignored unless a drag is active.
    pub fn update(&mut self, x: f64, y: f64) -> Option<OrbitCompleted> {
        if !self.dragging {
            return None;
        }
        self.advance_to(angle_of(x, y))
    }

    /// Feed a raw `atan2`-style angle directly.
    ///
    /// Ignored unless a drag is active.
    pub fn update_angle(&mut self, angle: f64) -> Option<OrbitCompleted> {
        if !self.dragging {
            return None;
        }
        self.advance_to(angle)
    }

    /// Pointer released. Progress and angle are kept.
    pub fn end(&mut self) {
        self.dragging = false;
    }

    fn advance_to(&mut self, angle: f64) -> Option<OrbitCompleted> {
        let delta = normalize_delta(angle - self.previous_angle);
        self.previous_angle = angle;
        self.current_angle = angle;
        self.progress += delta.abs();

        if self.progress >= FULL_ORBIT {
            self.progress = 0.0;
            self.completions += 1;
            tracing::debug!(count = self.completions, "orbit completed");
            return Some(OrbitCompleted {
                count: self.completions,
            });
        }
        None
    }

    /// Angle the avatar should be drawn at.
    pub fn current_angle(&self) -> f64 {
        self.current_angle
    }

    /// Travel accumulated since the last completion, in `[0, 2π)`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Progress as a display percentage, clamped to `[0, 100]`.
    pub fn progress_percent(&self) -> f64 {
        (self.progress / FULL_ORBIT * 100.0).clamp(0.0, 100.0)
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Completions recorded by this tracker.
    pub fn completions(&self) -> u64 {
        self.completions
    }
}

impl Default for OrbitGesture {
    fn default() -> Self {
        Self::new(0.0)
    }
}
