//! Angular arithmetic on the orbit circle.
//!
//! Angles are radians measured from the positive x axis, with y growing
//! downwards as in screen space. Raw `atan2` output lives in `(-π, π]`, so
//! consecutive samples that straddle the ±π seam differ by almost a full
//! turn even though the pointer barely moved. [`normalize_delta`] folds such
//! steps back into the short way round.

use std::f64::consts::{PI, TAU};

/// Angle from the orbit center to a point given relative to that center.
#[inline]
pub fn angle_of(x: f64, y: f64) -> f64 {
    y.atan2(x)
}

/// Fold a signed angular step into `(-π, π]`.
///
/// At most one correction of `2π` is applied, so a single step that covers
/// more than a full turn is undercounted.
///
/// ```
/// use nullism_core::normalize_delta;
///
/// // 3.1 → -3.1 crosses the seam: the real motion is a small forward step.
/// let delta = normalize_delta(-3.1 - 3.1);
/// assert!((delta - (std::f64::consts::TAU - 6.2)).abs() < 1e-12);
/// ```
pub fn normalize_delta(delta: f64) -> f64 {
    if delta > PI {
        delta - TAU
    } else if delta <= -PI {
        delta + TAU
    } else {
        delta
    }
}

/// Snap a position that stepped past either end of `[0, 2π)`.
///
/// Positions at or beyond `2π` restart at `0`; negative positions restart at
/// `2π`. This is a snap, not a modulo: the overshoot is dropped.
pub fn snap_wrap(position: f64) -> f64 {
    if position >= TAU {
        0.0
    } else if position < 0.0 {
        TAU
    } else {
        position
    }
}

/// Point on a circle of `radius` around `(center_x, center_y)` at `angle`.
#[inline]
pub fn point_on_circle(center_x: f64, center_y: f64, radius: f64, angle: f64) -> (f64, f64) {
    (
        center_x + radius * angle.cos(),
        center_y + radius * angle.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn small_steps_pass_through() {
        assert!((normalize_delta(0.1) - 0.1).abs() < EPS);
        assert!((normalize_delta(-0.1) + 0.1).abs() < EPS);
        assert_eq!(normalize_delta(0.0), 0.0);
    }

    #[test]
    fn seam_crossing_is_short() {
        // 3.0 → 3.1 → -3.1: the last raw step is -6.2
        let delta = normalize_delta(-3.1 - 3.1);
        assert!(delta > 0.0);
        assert!(delta < 0.1);

        // And the reverse direction
        let delta = normalize_delta(3.1 - (-3.1));
        assert!(delta < 0.0);
        assert!(delta > -0.1);
    }

    #[test]
    fn boundaries_are_half_open() {
        assert!((normalize_delta(PI) - PI).abs() < EPS);
        assert!((normalize_delta(-PI) - PI).abs() < EPS);
    }

    #[test]
    fn snap_wrap_edges() {
        assert_eq!(snap_wrap(TAU), 0.0);
        assert_eq!(snap_wrap(TAU + 0.3), 0.0);
        assert_eq!(snap_wrap(-0.01), TAU);
        assert_eq!(snap_wrap(1.5), 1.5);
        assert_eq!(snap_wrap(0.0), 0.0);
    }

    #[test]
    fn circle_points() {
        let (x, y) = point_on_circle(100.0, 50.0, 10.0, 0.0);
        assert!((x - 110.0).abs() < EPS);
        assert!((y - 50.0).abs() < EPS);

        let (x, y) = point_on_circle(100.0, 50.0, 10.0, PI / 2.0);
        assert!((x - 100.0).abs() < 1e-9);
        assert!((y - 60.0).abs() < 1e-9);
    }

    #[test]
    fn angle_of_axes() {
        assert_eq!(angle_of(1.0, 0.0), 0.0);
        assert!((angle_of(0.0, 1.0) - PI / 2.0).abs() < EPS);
        assert!((angle_of(-1.0, 0.0) - PI).abs() < EPS);
    }
}
