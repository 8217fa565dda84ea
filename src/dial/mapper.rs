//! Conversions between dial angles and durations.
//!
//! Angles are degrees clockwise from 12 o'clock. A full turn represents the
//! maximum duration of the active [`TimeUnit`].

use crate::state::TimeUnit;

/// Convert a dial angle into a duration in milliseconds
pub fn angle_to_duration(angle: f64, unit: TimeUnit) -> f64 {
    (angle / 360.0) * unit.max_duration_ms()
}

/// Convert a duration into a dial angle, clamped to a single turn
pub fn duration_to_angle(duration_ms: f64, unit: TimeUnit) -> f64 {
    ((duration_ms / unit.max_duration_ms()) * 360.0).clamp(0.0, 360.0)
}

/// Round a duration to the nearest whole unit tick.
///
/// Returns `None` when the duration rounds down to zero, which means
/// "no timer".
pub fn snap(duration_ms: f64, unit: TimeUnit) -> Option<f64> {
    let tick = unit.tick_ms();
    let snapped = (duration_ms / tick).round() * tick;
    if snapped > 0.0 {
        Some(snapped)
    } else {
        None
    }
}

/// Snap an angle through its duration; zero when there is no timer
pub fn snap_angle(angle: f64, unit: TimeUnit) -> f64 {
    snap(angle_to_duration(angle, unit), unit)
        .map(|duration| duration_to_angle(duration, unit))
        .unwrap_or(0.0)
}

/// Wrap an angular delta into (-180, 180]
pub fn wrap_delta(delta: f64) -> f64 {
    let mut wrapped = delta % 360.0;
    if wrapped > 180.0 {
        wrapped -= 360.0;
    } else if wrapped <= -180.0 {
        wrapped += 360.0;
    }
    wrapped
}

/// Interpolate along the shorter arc, result normalized into [0, 360)
pub fn shortest_angle_interpolate(start: f64, end: f64, t: f64) -> f64 {
    let raw = start + wrap_delta(end - start) * t;
    raw.rem_euclid(360.0)
}

/// Plain interpolation, used when moving to a freshly set duration
pub fn linear_interpolate(start: f64, end: f64, t: f64) -> f64 {
    start + (end - start) * t
}

pub fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

pub fn ease_out_quad(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(2)
}

/// Compass bearing of a pointer offset from the dial centre.
///
/// Screen coordinates grow downwards, so `atan2(dy, dx)` is measured
/// clockwise from 3 o'clock; adding 90° moves zero to 12 o'clock.
pub fn pointer_bearing(dx: f64, dy: f64) -> f64 {
    (dy.atan2(dx).to_degrees() + 90.0).rem_euclid(360.0)
}

/// Angle of a quick-set marking (5, 10, ... 60) on the dial face
pub fn quick_set_angle(value: u32) -> f64 {
    (f64::from(value) / 60.0) * 360.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNITS: [TimeUnit; 2] = [TimeUnit::Minute, TimeUnit::Second];

    #[test]
    fn test_round_trip_angle_duration() {
        for unit in UNITS {
            let mut angle = 0.0;
            while angle < 360.0 {
                let back = duration_to_angle(angle_to_duration(angle, unit), unit);
                assert!((back - angle).abs() < 1e-9, "{angle} -> {back} ({unit:?})");
                angle += 7.25;
            }
        }
    }

    #[test]
    fn test_half_turn_is_thirty_minutes() {
        assert_eq!(angle_to_duration(180.0, TimeUnit::Minute), 1_800_000.0);
        assert_eq!(angle_to_duration(180.0, TimeUnit::Second), 30_000.0);
    }

    #[test]
    fn test_duration_to_angle_clamps() {
        assert_eq!(duration_to_angle(7_200_000.0, TimeUnit::Minute), 360.0);
        assert_eq!(duration_to_angle(-10.0, TimeUnit::Second), 0.0);
    }

    #[test]
    fn test_snap_rounds_to_tick() {
        assert_eq!(snap(89_000.0, TimeUnit::Minute), Some(60_000.0));
        assert_eq!(snap(91_000.0, TimeUnit::Minute), Some(120_000.0));
        assert_eq!(snap(1_499.0, TimeUnit::Second), Some(1_000.0));
        assert_eq!(snap(20_000.0, TimeUnit::Minute), None);
        assert_eq!(snap(0.0, TimeUnit::Second), None);
    }

    #[test]
    fn test_snap_is_idempotent() {
        for unit in UNITS {
            for raw in [0.0, 499.0, 12_345.6, 59_999.0, 1_234_567.0, 3_600_000.0] {
                let once = snap(raw, unit);
                let twice = once.and_then(|d| snap(d, unit));
                assert_eq!(once, twice, "{raw} ({unit:?})");
            }
        }
    }

    #[test]
    fn test_snap_angle_zero_for_small_angles() {
        assert_eq!(snap_angle(2.0, TimeUnit::Minute), 0.0);
        assert_eq!(snap_angle(92.0, TimeUnit::Minute), 90.0);
    }

    #[test]
    fn test_shortest_interpolation_wraps_through_zero() {
        let mid = shortest_angle_interpolate(350.0, 10.0, 0.5);
        assert!(mid.abs() < 1e-9 || (mid - 360.0).abs() < 1e-9);
        let quarter = shortest_angle_interpolate(10.0, 350.0, 0.25);
        assert!((quarter - 5.0).abs() < 1e-9);
        let back = shortest_angle_interpolate(10.0, 350.0, 1.0);
        assert!((back - 350.0).abs() < 1e-9);
    }

    #[test]
    fn test_shortest_interpolation_never_jumps_more_than_half_turn() {
        let pairs = [(0.0, 359.0), (359.0, 0.0), (90.0, 271.0), (5.0, 185.0), (180.0, 0.0)];
        for (start, end) in pairs {
            let mut previous = shortest_angle_interpolate(start, end, 0.0);
            for step in 1..=100 {
                let current = shortest_angle_interpolate(start, end, f64::from(step) / 100.0);
                let step_size = wrap_delta(current - previous).abs();
                assert!(step_size <= 180.0, "{start}->{end} stepped {step_size}");
                assert!((0.0..360.0).contains(&current));
                previous = current;
            }
        }
    }

    #[test]
    fn test_linear_interpolation_has_no_wraparound() {
        assert_eq!(linear_interpolate(10.0, 350.0, 0.5), 180.0);
    }

    #[test]
    fn test_pointer_bearing_is_compass_like() {
        let cases = [
            ((0.0, -10.0), 0.0),
            ((10.0, 0.0), 90.0),
            ((0.0, 10.0), 180.0),
            ((-10.0, 0.0), 270.0),
        ];
        for ((dx, dy), expected) in cases {
            let bearing = pointer_bearing(dx, dy);
            assert!((0.0..360.0).contains(&bearing));
            assert!(wrap_delta(bearing - expected).abs() < 1e-9, "({dx},{dy}) -> {bearing}");
        }
    }

    #[test]
    fn test_quick_set_angles() {
        assert_eq!(quick_set_angle(45), 270.0);
        assert_eq!(quick_set_angle(60), 360.0);
        assert_eq!(quick_set_angle(15), 90.0);
    }

    #[test]
    fn test_easing_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert_eq!(ease_out_quad(1.0), 1.0);
        assert!(ease_out_cubic(0.5) > 0.5);
    }
}
