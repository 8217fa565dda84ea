//! Pointer, quick-set, unit and mute input

use tracing::info;

use super::engine::DialEngine;
use super::mapper::{pointer_bearing, quick_set_angle, snap_angle, wrap_delta};
use super::{Point, Region, Viewport};
use crate::services::notifications::Permission;
use crate::state::{TimeUnit, TimerSession};

/// Releases sooner than this without a move are taps
pub const TAP_THRESHOLD_MS: i64 = 200;
/// Idle time during a drag before the dial snaps to the nearest tick
pub const SNAP_DEBOUNCE_MS: i64 = 800;

/// Opened by a pointer-down on the dial, consumed by the first move or the release
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionSession {
    pub start_time: i64,
    pub start_angle: f64,
    pub was_running: bool,
}

/// A countdown paused by grabbing the dial, kept so a tap can resume it as-is
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PausedRun {
    pub session: TimerSession,
    pub unit: TimeUnit,
    pub auto_switched: bool,
    pub angle: f64,
}

impl DialEngine {
    pub fn pointer_down(&mut self, now: i64, region: Region, at: Point) {
        match region {
            Region::Title => self.title_tap(at),
            _ if self.celebration.in_progress() => {
                self.celebration.interrupt(now, Some(at), &mut self.audio, &mut self.rng);
            }
            Region::DialControl | Region::Page => {}
            Region::Dial => self.grab(now),
        }
        self.log_state("pointer down");
    }

    /// Party-mode toggle; re-bangs instead of interrupting
    fn title_tap(&mut self, at: Point) {
        self.celebration.toggle_party_mode();
        self.audio.bang();
        self.celebration.pop(at, &mut self.rng);
    }

    fn grab(&mut self, now: i64) {
        self.audio.initialize();

        let angle = self.angle;
        self.paused = None;
        if let Some(session) = self.scheduler.stop() {
            info!("Timer paused with {}ms left", session.remaining_ms(now));
            self.keep_awake(false);
            self.persistence.clear();
            self.notifier.cancel();
            self.paused = Some(PausedRun {
                session,
                unit: self.unit,
                auto_switched: self.auto_switched,
                angle,
            });
        }

        self.reset_auto_switch();
        self.cancel_setting_animations();
        self.interaction = Some(InteractionSession {
            start_time: now,
            start_angle: angle,
            was_running: self.paused.is_some(),
        });
        self.dragging = true;
        self.last_bearing = None;
    }

    pub fn pointer_move(&mut self, now: i64, at: Point) {
        if !self.dragging {
            return;
        }
        self.cancel_setting_animations();
        if self.celebration.in_progress() && !self.celebration.is_interrupted() {
            return;
        }
        self.interaction = None;

        let center = self.dial_center();
        let bearing = pointer_bearing(at.x - center.x, at.y - center.y);
        // deltas are taken from the previous sample only, never from the grab
        let Some(last) = self.last_bearing.replace(bearing) else {
            return;
        };
        self.angle = (self.angle + wrap_delta(bearing - last)).clamp(0.0, 360.0);
        self.snap_timeout.arm(now + SNAP_DEBOUNCE_MS);
    }

    pub fn pointer_up(&mut self, now: i64) {
        if !self.dragging {
            return;
        }
        self.dragging = false;
        self.last_bearing = None;
        self.snap_timeout.cancel();

        let grab = self.interaction.take();
        let paused = self.paused.take();

        if let Some(grab) = grab.filter(|g| now - g.start_time < TAP_THRESHOLD_MS) {
            if self.celebration.in_progress() {
                return;
            }
            match paused {
                Some(run) if grab.was_running => self.resume(run),
                _ if grab.was_running => {}
                _ => self.animate_to(now, 0.0, true),
            }
            self.log_state("tap");
            return;
        }

        // a drag released inside the interruption grace period is dropped
        if !self.celebration.is_interrupted() {
            let target = snap_angle(self.angle, self.unit);
            self.animate_to(now, target, true);
        }
        self.log_state("release");
    }

    fn resume(&mut self, run: PausedRun) {
        info!("Timer resumed");
        self.unit = run.unit;
        self.auto_switched = run.auto_switched;
        self.angle = run.angle;
        self.begin_session(run.session);
    }

    /// Jump to a dial marking; `value` is in 1..=60
    pub fn quick_set(&mut self, now: i64, value: u32) -> Result<(), String> {
        if !(1..=60).contains(&value) {
            return Err(format!("Quick-set value {} is outside 1..=60", value));
        }
        info!("Quick-set to {}", value);
        self.celebration.interrupt(now, None, &mut self.audio, &mut self.rng);
        self.cancel_all();
        self.reset_auto_switch();
        self.animate_to(now, quick_set_angle(value), true);
        Ok(())
    }

    pub fn set_unit(&mut self, now: i64, unit: TimeUnit) {
        if self.auto_switched {
            // during the hand-over the dial already shows seconds
            if unit == TimeUnit::Minute {
                return;
            }
        } else if self.unit == unit {
            return;
        }
        info!("Unit set to {}", unit.name());
        self.cancel_all();
        self.celebration.interrupt(now, None, &mut self.audio, &mut self.rng);
        self.auto_switched = false;
        self.unit = unit;
        self.angle = 0.0;
    }

    /// Flip the mute flag; returns the new value
    pub fn toggle_mute(&mut self, now: i64) -> bool {
        if self.celebration.in_progress() {
            self.celebration.interrupt(now, None, &mut self.audio, &mut self.rng);
            return self.audio.is_muted();
        }

        let muted = !self.audio.is_muted();
        self.audio.set_muted(muted);
        self.persistence.save_muted(muted);
        info!("Sound {}", if muted { "muted" } else { "enabled" });

        if muted {
            self.notifier.cancel();
        } else if self.audio.initialize() {
            if self.permission.current() == Permission::Default {
                self.permission.request();
            }
            if let Some(remaining) = self.scheduler.remaining_ms(now) {
                self.notifier.start(now + remaining);
            }
        }
        muted
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.config.viewport = viewport;
    }

    pub fn set_dial_center(&mut self, center: Option<Point>) {
        self.config.dial_center = center;
    }
}
