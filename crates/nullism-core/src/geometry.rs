//! Placement of the orbit inside the client viewport.

use crate::angle::point_on_circle;

/// Fraction of the smaller viewport side used as orbit radius.
pub const RADIUS_FRACTION: f64 = 0.375;

/// Radius floor for tiny viewports, in pixels.
pub const MIN_RADIUS: f64 = 100.0;

/// Radius multiplier once the orbit gets crowded.
pub const WIDER_SCALE: f64 = 1.2;

/// Live user count above which the orbit widens.
pub const WIDER_THRESHOLD: usize = 5;

/// Circle the avatars walk on, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitGeometry {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
    pub wider: bool,
}

impl OrbitGeometry {
    /// Fit the orbit into a `width` × `height` viewport.
    pub fn fit(width: f64, height: f64, wider: bool) -> Self {
        let base = (width.min(height) * RADIUS_FRACTION).max(MIN_RADIUS);
        Self {
            center_x: width / 2.0,
            center_y: height / 2.0,
            radius: if wider { base * WIDER_SCALE } else { base },
            wider,
        }
    }

    /// Whether a given live user count calls for the wider orbit.
    pub fn wants_wider(user_count: usize) -> bool {
        user_count > WIDER_THRESHOLD
    }

    /// Translate a viewport point into center-relative coordinates.
    pub fn to_local(&self, x: f64, y: f64) -> (f64, f64) {
        (x - self.center_x, y - self.center_y)
    }

    /// Top-left corner for an element of half-size `offset` centered on the
    /// orbit at `angle`.
    pub fn place(&self, angle: f64, offset: f64) -> (f64, f64) {
        let (x, y) = point_on_circle(self.center_x, self.center_y, self.radius, angle);
        (x - offset, y - offset)
    }
}
