//! Cancellable deferred work polled from the frame callback

use super::mapper::{
    ease_out_cubic, ease_out_quad, linear_interpolate, shortest_angle_interpolate,
};

/// A single pending deadline.
///
/// Arming replaces any previous deadline, so a slot never holds more than one
/// pending callback. Cancelling clears the slot; a cleared slot never fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeout {
    deadline: Option<i64>,
}

impl Timeout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, at: i64) {
        self.deadline = Some(at);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true exactly once when the deadline has passed
    pub fn fire(&mut self, now: i64) -> bool {
        match self.deadline {
            Some(at) if now >= at => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// How an animated angle travels to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationKind {
    /// Quick-set, snap and tap-to-clear: cubic ease, no wraparound
    Set,
    /// Minute-to-second hand-over: quadratic ease along the shorter arc
    AutoSec,
}

impl AnimationKind {
    pub fn duration_ms(self) -> i64 {
        match self {
            AnimationKind::Set => 400,
            AnimationKind::AutoSec => 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleAnimation {
    pub kind: AnimationKind,
    pub from: f64,
    pub to: f64,
    pub started_at: i64,
    pub start_timer_on_complete: bool,
}

impl AngleAnimation {
    pub fn new(
        kind: AnimationKind,
        from: f64,
        to: f64,
        started_at: i64,
        start_timer_on_complete: bool,
    ) -> Self {
        Self {
            kind,
            from,
            to,
            started_at,
            start_timer_on_complete,
        }
    }

    /// Linear progress in [0, 1]
    pub fn progress(&self, now: i64) -> f64 {
        let elapsed = (now - self.started_at).max(0) as f64;
        (elapsed / self.kind.duration_ms() as f64).min(1.0)
    }

    pub fn is_complete(&self, now: i64) -> bool {
        self.progress(now) >= 1.0
    }

    /// Angle at `now`, eased according to the animation kind
    pub fn angle_at(&self, now: i64) -> f64 {
        let progress = self.progress(now);
        match self.kind {
            AnimationKind::Set => linear_interpolate(self.from, self.to, ease_out_cubic(progress)),
            AnimationKind::AutoSec => {
                shortest_angle_interpolate(self.from, self.to, ease_out_quad(progress))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_fires_once() {
        let mut timeout = Timeout::new();
        assert!(!timeout.fire(1_000));

        timeout.arm(1_800);
        assert!(!timeout.fire(1_799));
        assert!(timeout.fire(1_800));
        assert!(!timeout.fire(5_000));
    }

    #[test]
    fn test_rearm_replaces_previous_deadline() {
        let mut timeout = Timeout::new();
        timeout.arm(1_000);
        timeout.arm(2_000);
        assert!(!timeout.fire(1_500));
        assert!(timeout.fire(2_000));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut timeout = Timeout::new();
        timeout.cancel();
        timeout.arm(10);
        timeout.cancel();
        timeout.cancel();
        assert!(!timeout.is_armed());
        assert!(!timeout.fire(100));
    }

    #[test]
    fn test_set_animation_reaches_target() {
        let animation = AngleAnimation::new(AnimationKind::Set, 0.0, 270.0, 1_000, true);
        assert_eq!(animation.angle_at(1_000), 0.0);
        assert!(animation.angle_at(1_200) > 135.0);
        assert_eq!(animation.angle_at(1_400), 270.0);
        assert!(animation.is_complete(1_400));
        assert!(!animation.is_complete(1_399));
    }

    #[test]
    fn test_auto_sec_animation_takes_short_way() {
        let animation = AngleAnimation::new(AnimationKind::AutoSec, 6.0, 350.0, 0, false);
        let halfway = animation.angle_at(100);
        assert!(halfway < 6.0 || halfway > 350.0, "went the long way: {halfway}");
        assert!((animation.angle_at(500) - 350.0).abs() < 1e-9);
    }
}
