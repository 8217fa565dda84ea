//! Drift-free countdown driven by the frame callback
//!
//! Remaining time is recomputed from the session anchor on every frame and
//! never decremented, so late or skipped frames cannot accumulate error.

use super::deferred::{AngleAnimation, AnimationKind};
use super::mapper::duration_to_angle;
use crate::state::{TimeUnit, TimerSession};

/// Remaining time below which a minute timer hands over to the seconds scale
pub const AUTO_SEC_THRESHOLD_MS: i64 = 60_000;
/// Remaining time below which each whole second beeps
pub const BEEP_WINDOW_MS: i64 = 5_000;

/// What a single countdown frame asks the engine to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// No session is running
    Idle,
    /// The session ran out on this frame and has been stopped
    Expired,
    /// Auto-sec hand-over in flight; `started` is set on its first frame
    Transition { angle: f64, started: bool },
    Countdown { angle: f64, beep: bool },
}

/// Owns the running session and the per-session countdown bookkeeping
#[derive(Debug, Default, Clone)]
pub struct CountdownScheduler {
    session: Option<TimerSession>,
    last_tick_second: Option<i64>,
    transition: Option<AngleAnimation>,
}

impl CountdownScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, session: TimerSession) {
        self.session = Some(session);
        self.last_tick_second = None;
        self.transition = None;
    }

    /// Stop counting; safe to call when already stopped
    pub fn stop(&mut self) -> Option<TimerSession> {
        self.last_tick_second = None;
        self.transition = None;
        self.session.take()
    }

    pub fn session(&self) -> Option<TimerSession> {
        self.session
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn remaining_ms(&self, now: i64) -> Option<i64> {
        self.session.map(|session| session.remaining_ms(now))
    }

    /// Advance one frame given the displayed unit and angle
    pub fn step(&mut self, now: i64, unit: TimeUnit, angle: f64) -> Tick {
        let Some(session) = self.session else {
            return Tick::Idle;
        };
        let remaining = session.remaining_ms(now);

        if remaining <= 0 {
            self.stop();
            return Tick::Expired;
        }

        // The hand-over chases the live seconds-scale angle, so it lands
        // exactly where the regular countdown continues.
        let target = duration_to_angle(remaining as f64, TimeUnit::Second);
        if let Some(transition) = self.transition.as_mut() {
            transition.to = target;
            let angle = transition.angle_at(now);
            if transition.is_complete(now) {
                self.transition = None;
                return Tick::Countdown { angle: target, beep: false };
            }
            return Tick::Transition { angle, started: false };
        }

        if unit == TimeUnit::Minute && remaining <= AUTO_SEC_THRESHOLD_MS {
            self.transition = Some(AngleAnimation::new(
                AnimationKind::AutoSec,
                angle,
                target,
                now,
                false,
            ));
            return Tick::Transition { angle, started: true };
        }

        let mut beep = false;
        if unit == TimeUnit::Second && remaining <= BEEP_WINDOW_MS {
            let second = (remaining as f64 / 1_000.0).ceil() as i64;
            if self.last_tick_second != Some(second) {
                self.last_tick_second = Some(second);
                beep = true;
            }
        }

        Tick::Countdown {
            angle: duration_to_angle(remaining as f64, unit),
            beep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(duration_ms: i64) -> CountdownScheduler {
        let mut scheduler = CountdownScheduler::new();
        scheduler.start(TimerSession::new(0, duration_ms).unwrap());
        scheduler
    }

    #[test]
    fn test_idle_without_session() {
        let mut scheduler = CountdownScheduler::new();
        assert_eq!(scheduler.step(100, TimeUnit::Minute, 0.0), Tick::Idle);
    }

    #[test]
    fn test_angle_follows_remaining_time() {
        let mut scheduler = running(1_800_000);
        assert_eq!(
            scheduler.step(900_000, TimeUnit::Minute, 180.0),
            Tick::Countdown { angle: 90.0, beep: false }
        );
    }

    #[test]
    fn test_expiry_stops_the_session() {
        let mut scheduler = running(5_000);
        assert_eq!(scheduler.step(6_000, TimeUnit::Second, 30.0), Tick::Expired);
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.step(6_016, TimeUnit::Second, 0.0), Tick::Idle);
    }

    #[test]
    fn test_each_second_beeps_once() {
        let mut scheduler = running(10_000);
        let mut beeps = Vec::new();
        let mut now = 0;
        while now < 10_000 {
            if let Tick::Countdown { beep: true, .. } = scheduler.step(now, TimeUnit::Second, 0.0) {
                beeps.push(now);
            }
            now += 16;
        }
        // seconds 5, 4, 3, 2 and 1 each beep exactly once
        assert_eq!(beeps.len(), 5);
        assert!(beeps[0] >= 5_000);
    }

    #[test]
    fn test_minute_timer_hands_over_instead_of_beeping() {
        let mut scheduler = running(3_000);
        assert!(matches!(
            scheduler.step(0, TimeUnit::Minute, 0.3),
            Tick::Transition { started: true, .. }
        ));
    }

    #[test]
    fn test_auto_sec_transition_is_continuous() {
        let mut scheduler = running(120_000);
        let mut angle = 360.0 * 120_000.0 / 3_600_000.0;

        // first frame under the threshold starts the hand-over
        let tick = scheduler.step(60_000, TimeUnit::Minute, angle);
        assert_eq!(tick, Tick::Transition { angle, started: true });

        let mut now = 60_016;
        let mut finished_at = None;
        while now <= 61_000 {
            match scheduler.step(now, TimeUnit::Second, angle) {
                Tick::Transition { angle: next, started } => {
                    assert!(!started);
                    let step = crate::dial::mapper::wrap_delta(next - angle).abs();
                    assert!(step < 60.0, "jumped {step} degrees at {now}");
                    angle = next;
                }
                Tick::Countdown { angle: next, .. } => {
                    let step = crate::dial::mapper::wrap_delta(next - angle).abs();
                    assert!(step < 60.0, "jumped {step} degrees at {now}");
                    finished_at.get_or_insert(now);
                    angle = next;
                }
                other => panic!("unexpected {other:?}"),
            }
            now += 16;
        }

        let finished_at = finished_at.unwrap();
        assert!(finished_at <= 60_500 + 16);
        assert!(!scheduler.is_transitioning());
        let expected = 360.0 * (120_000.0 - 61_000.0 + 16.0) / 60_000.0;
        assert!((angle - expected).abs() < 1.0);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut scheduler = running(10_000);
        assert!(scheduler.stop().is_some());
        assert!(scheduler.stop().is_none());
        assert!(scheduler.stop().is_none());
        assert!(!scheduler.is_transitioning());
    }
}
