//! The dial engine: one owner for every piece of timer state

use rand::rngs::StdRng;
use tracing::{debug, info};

use super::celebration::CelebrationMachine;
use super::deferred::{AngleAnimation, AnimationKind, Timeout};
use super::interaction::{InteractionSession, PausedRun};
use super::mapper::{angle_to_duration, duration_to_angle, snap_angle};
use super::particles::ConfettiPiece;
use super::scheduler::{CountdownScheduler, Tick};
use super::{DialConfig, InteractionPhase, Point, Viewport};
use crate::services::{
    audio::{AudioCues, AudioOutput},
    notifications::{NotificationHints, NotificationScheduler, PermissionPrompt},
    persistence::PersistenceGateway,
    system::SleepInhibitor,
};
use crate::state::{DialSnapshot, TimeUnit, TimerSession, UnitMode};

/// Angles at or below this read as an empty dial
const MIN_TIMER_ANGLE: f64 = 0.1;

/// Boundary collaborators injected into the engine
pub struct EngineServices {
    pub persistence: PersistenceGateway,
    pub audio: Box<dyn AudioOutput>,
    pub notifier: NotificationScheduler,
    pub permission: Box<dyn PermissionPrompt>,
    pub hints: NotificationHints,
    pub inhibitor: Box<dyn SleepInhibitor>,
}

/// Timer interaction and celebration engine.
///
/// Every operation receives the current wall-clock time in milliseconds and
/// reads live state only, so nothing acts on a stale copy.
pub struct DialEngine {
    pub(super) config: DialConfig,
    pub(super) angle: f64,
    pub(super) unit: TimeUnit,
    /// Seconds scale was entered by the near-zero hand-over, not by the user
    pub(super) auto_switched: bool,
    pub(super) scheduler: CountdownScheduler,
    pub(super) dragging: bool,
    pub(super) interaction: Option<InteractionSession>,
    pub(super) paused: Option<PausedRun>,
    pub(super) last_bearing: Option<f64>,
    pub(super) snap_timeout: Timeout,
    pub(super) animation: Option<AngleAnimation>,
    pub(super) celebration: CelebrationMachine,
    pub(super) persistence: PersistenceGateway,
    pub(super) audio: AudioCues,
    pub(super) notifier: NotificationScheduler,
    pub(super) permission: Box<dyn PermissionPrompt>,
    pub(super) hints: NotificationHints,
    pub(super) inhibitor: Box<dyn SleepInhibitor>,
    /// The keep-awake lock is held
    pub(super) awake: bool,
    pub(super) rng: StdRng,
}

impl DialEngine {
    pub fn new(config: DialConfig, services: EngineServices, rng: StdRng) -> Self {
        let muted = services.persistence.load_muted();
        Self {
            config,
            angle: 0.0,
            unit: TimeUnit::Minute,
            auto_switched: false,
            scheduler: CountdownScheduler::new(),
            dragging: false,
            interaction: None,
            paused: None,
            last_bearing: None,
            snap_timeout: Timeout::new(),
            animation: None,
            celebration: CelebrationMachine::new(config.grow_ms),
            persistence: services.persistence,
            audio: AudioCues::new(services.audio, muted),
            notifier: services.notifier,
            permission: services.permission,
            hints: services.hints,
            inhibitor: services.inhibitor,
            awake: false,
            rng,
        }
    }

    /// Resume a timer persisted by an earlier process
    pub fn restore(&mut self, now: i64) -> bool {
        let Some(restored) = self.persistence.load(now) else {
            return false;
        };
        self.unit = restored.unit;
        self.auto_switched = false;
        self.angle = duration_to_angle(restored.session.remaining_ms(now) as f64, self.unit);
        self.scheduler.start(restored.session);
        self.keep_awake(true);
        true
    }

    /// Per-frame callback: timeouts, animation, countdown, then particles
    pub fn frame(&mut self, now: i64) {
        if self.snap_timeout.fire(now) && self.dragging {
            let target = snap_angle(self.angle, self.unit);
            self.animate_to(now, target, false);
        }
        self.celebration.poll(now, &mut self.audio, &mut self.rng);
        self.step_animation(now);
        self.step_countdown(now);
        self.celebration.step_particles(now, self.config.viewport);
    }

    fn step_animation(&mut self, now: i64) {
        let Some(animation) = self.animation else {
            return;
        };
        if !animation.is_complete(now) {
            self.angle = animation.angle_at(now);
            return;
        }
        self.animation = None;
        self.angle = animation.to;
        if animation.start_timer_on_complete {
            self.start_timer_from_angle(now, animation.to);
        }
    }

    fn step_countdown(&mut self, now: i64) {
        match self.scheduler.step(now, self.unit, self.angle) {
            Tick::Idle => {}
            Tick::Expired => self.expire(now),
            Tick::Transition { angle, started } => {
                if started {
                    info!("Switching to seconds for the final minute");
                    self.unit = TimeUnit::Second;
                    self.auto_switched = true;
                }
                self.angle = angle;
            }
            Tick::Countdown { angle, beep } => {
                if beep {
                    self.audio.tick();
                }
                self.angle = angle;
            }
        }
    }

    fn expire(&mut self, now: i64) {
        info!("Timer finished");
        self.keep_awake(false);
        self.angle = 0.0;
        self.persistence.clear();
        self.reset_auto_switch();
        if !self.celebration.is_interrupted() {
            let origin = self.dial_center();
            self.celebration.begin(now, origin, &mut self.audio, &mut self.rng);
        }
    }

    /// Animate the dial to `target`, replacing any animation in flight
    pub(super) fn animate_to(&mut self, now: i64, target: f64, start_timer_on_complete: bool) {
        self.cancel_setting_animations();
        self.animation = Some(AngleAnimation::new(
            AnimationKind::Set,
            self.angle,
            target,
            now,
            start_timer_on_complete,
        ));
    }

    pub(super) fn cancel_setting_animations(&mut self) {
        self.snap_timeout.cancel();
        self.animation = None;
    }

    /// Drop the running session, its record and every pending animation
    pub(super) fn cancel_all(&mut self) {
        self.scheduler.stop();
        self.keep_awake(false);
        self.cancel_setting_animations();
        self.paused = None;
        self.notifier.cancel();
        self.persistence.clear();
    }

    /// Unit picked by the user, ignoring the automatic hand-over
    pub(super) fn chosen_unit(&self) -> TimeUnit {
        if self.auto_switched {
            TimeUnit::Minute
        } else {
            self.unit
        }
    }

    pub(super) fn reset_auto_switch(&mut self) {
        if self.auto_switched {
            self.unit = TimeUnit::Minute;
            self.auto_switched = false;
        }
    }

    /// Commit the dial angle as a new session
    pub(super) fn start_timer_from_angle(&mut self, now: i64, angle: f64) {
        self.cancel_all();
        self.celebration.interrupt(now, None, &mut self.audio, &mut self.rng);

        if angle <= MIN_TIMER_ANGLE {
            self.angle = 0.0;
            return;
        }
        let duration = angle_to_duration(angle, self.unit).round() as i64;
        let Some(session) = TimerSession::new(now, duration) else {
            self.angle = 0.0;
            return;
        };
        info!("Timer started for {}ms ({})", duration, self.unit.name());
        self.begin_session(session);
    }

    /// Run `session`, writing it through to storage and the worker
    pub(super) fn begin_session(&mut self, session: TimerSession) {
        self.scheduler.start(session);
        self.keep_awake(true);
        self.persistence.save(&session, self.chosen_unit());
        if !self.audio.is_muted() {
            self.notifier.start(session.end_time());
        }
    }

    /// Hold or drop the keep-awake lock; only changes reach the inhibitor
    pub(super) fn keep_awake(&mut self, on: bool) {
        if on == self.awake {
            return;
        }
        if on {
            match self.inhibitor.acquire() {
                Ok(()) => self.awake = true,
                Err(e) => debug!("Host may sleep during the countdown: {}", e),
            }
        } else {
            self.inhibitor.release();
            self.awake = false;
        }
    }

    pub fn dial_center(&self) -> Point {
        self.config.dial_center.unwrap_or_else(|| self.config.viewport.center())
    }

    pub fn viewport(&self) -> Viewport {
        self.config.viewport
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn session(&self) -> Option<TimerSession> {
        self.scheduler.session()
    }

    pub fn celebration(&self) -> &CelebrationMachine {
        &self.celebration
    }

    pub fn is_muted(&self) -> bool {
        self.audio.is_muted()
    }

    pub fn unit_mode(&self) -> UnitMode {
        match (self.unit, self.auto_switched) {
            (TimeUnit::Second, true) => UnitMode::AutoSec,
            (TimeUnit::Second, false) => UnitMode::Sec,
            (TimeUnit::Minute, _) => UnitMode::Min,
        }
    }

    pub fn phase(&self) -> InteractionPhase {
        if self.dragging {
            InteractionPhase::Dragging
        } else if self.animation.is_some() {
            InteractionPhase::Animating
        } else if self.scheduler.is_running() {
            InteractionPhase::Running
        } else {
            InteractionPhase::Idle
        }
    }

    pub fn pieces(&self) -> Vec<ConfettiPiece> {
        self.celebration.pieces().cloned().collect()
    }

    pub fn snapshot(&self, now: i64) -> DialSnapshot {
        let session = self.scheduler.session();
        let permission = self.permission.current();
        DialSnapshot {
            angle: self.angle,
            unit: self.unit,
            unit_mode: self.unit_mode(),
            phase: self.phase(),
            running: session.is_some(),
            remaining_ms: session.map(|s| s.remaining_ms(now).max(0)),
            duration_ms: session.map(|s| s.duration_ms()),
            end_time: session.map(|s| s.end_time()),
            celebration: self.celebration.state(),
            alarm_playing: self.celebration.alarm_playing(),
            interruption_time: self.celebration.interruption_time(),
            party_mode: self.celebration.party_mode(),
            muted: self.audio.is_muted(),
            particle_count: self.celebration.piece_count(),
            notification_permission: permission,
            hint: self.hints.render(permission, self.notifier.is_enabled()),
            viewport: self.config.viewport,
        }
    }

    pub(super) fn log_state(&self, action: &str) {
        debug!(
            "{}: angle={:.1} unit={} phase={:?} celebration={:?}",
            action,
            self.angle,
            self.unit.name(),
            self.phase(),
            self.celebration.state()
        );
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Harness, T0};
    use super::*;
    use crate::services::notifications::WorkerMessage;
    use crate::state::CelebrationState;

    #[test]
    fn test_angle_commits_half_hour_session() {
        let mut h = Harness::new(600, false);
        h.engine.angle = 180.0;
        h.engine.start_timer_from_angle(T0, 180.0);

        let session = h.engine.session().unwrap();
        assert_eq!(session.duration_ms(), 1_800_000);
        assert!(h.record().unwrap().contains("\"endTime\""));
        assert_eq!(
            h.messages(),
            vec![
                WorkerMessage::CancelTimer,
                WorkerMessage::StartTimer { end_time: T0 + 1_800_000 }
            ]
        );
    }

    #[test]
    fn test_tiny_angle_commits_nothing() {
        let mut h = Harness::new(600, false);
        h.engine.angle = 0.05;
        h.engine.start_timer_from_angle(T0, 0.05);
        assert!(h.engine.session().is_none());
        assert_eq!(h.engine.angle(), 0.0);
        assert!(h.record().is_none());
    }

    #[test]
    fn test_muted_session_skips_worker() {
        let mut h = Harness::new(600, true);
        h.engine.start_timer_from_angle(T0, 90.0);
        assert!(h.engine.session().is_some());
        assert_eq!(h.messages(), vec![WorkerMessage::CancelTimer]);
    }

    #[test]
    fn test_expiry_starts_celebration() {
        let mut h = Harness::new(600, false);
        h.engine.unit = TimeUnit::Second;
        h.engine.begin_session(TimerSession::new(T0, 5_000).unwrap());
        h.engine.angle = 30.0;

        h.run(T0, T0 + 4_000);
        assert!(h.engine.angle() > 0.0);
        assert_eq!(h.engine.celebration().state(), CelebrationState::Idle);

        h.run(T0 + 4_000, T0 + 6_000);
        assert!(h.engine.session().is_none());
        assert_eq!(h.engine.angle(), 0.0);
        assert!(h.record().is_none());
        // five beeps, then the lead-in has already grown into the burst
        assert_eq!(h.audio.count("tick"), 5);
        assert_eq!(h.audio.count("ramp"), 1);
        assert_eq!(h.engine.celebration().state(), CelebrationState::Bursting);
        assert!(h.engine.celebration().alarm_playing());
    }

    #[test]
    fn test_expiry_enters_growing_first() {
        let mut h = Harness::new(600, false);
        h.engine.begin_session(TimerSession::new(T0, 5_000).unwrap());
        h.engine.frame(T0 + 6_000);
        assert_eq!(h.engine.celebration().state(), CelebrationState::Growing);
        assert_eq!(h.engine.angle(), 0.0);

        let mut burst = Harness::new(0, false);
        burst.engine.begin_session(TimerSession::new(T0, 5_000).unwrap());
        burst.engine.frame(T0 + 6_000);
        assert_eq!(burst.engine.celebration().state(), CelebrationState::Bursting);
        assert_eq!(burst.engine.celebration().piece_count(), 150);
    }

    #[test]
    fn test_auto_sec_hand_over() {
        let mut h = Harness::new(600, false);
        h.engine.begin_session(TimerSession::new(T0, 90_000).unwrap());
        h.run(T0, T0 + 29_984);
        assert_eq!(h.engine.unit(), TimeUnit::Minute);
        assert_eq!(h.engine.unit_mode(), UnitMode::Min);

        h.run(T0 + 29_984, T0 + 30_000);
        assert_eq!(h.engine.unit(), TimeUnit::Second);
        assert_eq!(h.engine.unit_mode(), UnitMode::AutoSec);

        h.run(T0 + 30_000, T0 + 30_600);
        let expected = 360.0 * (90_000.0 - 30_600.0) / 60_000.0;
        assert!((h.engine.angle() - expected).abs() < 1e-6);

        // the record keeps the unit the user chose
        assert!(h.record().unwrap().contains("\"unit\":\"min\""));

        h.run(T0 + 30_600, T0 + 90_000);
        assert_eq!(h.engine.unit(), TimeUnit::Minute);
        assert_eq!(h.engine.unit_mode(), UnitMode::Min);
        assert_eq!(h.audio.count("tick"), 5);
    }

    #[test]
    fn test_restore_resumes_countdown() {
        let store = crate::services::storage::testing::SharedStore::default();
        {
            let mut first = Harness::with_store(store.clone(), 600, false);
            first.engine.unit = TimeUnit::Second;
            first.engine.start_timer_from_angle(T0, 60.0);
        }

        let mut second = Harness::with_store(store, 600, false);
        assert!(second.engine.restore(T0 + 3_000));
        assert_eq!(second.engine.unit(), TimeUnit::Second);
        let session = second.engine.session().unwrap();
        assert_eq!(session.remaining_ms(T0 + 3_000), 7_000);
        assert!((second.engine.angle() - 42.0).abs() < 1e-6);
        assert_eq!(second.engine.phase(), InteractionPhase::Running);
    }

    #[test]
    fn test_snapshot_reports_live_state() {
        let mut h = Harness::new(600, false);
        h.engine.start_timer_from_angle(T0, 90.0);
        let snapshot = h.engine.snapshot(T0 + 1_000);
        assert!(snapshot.running);
        assert_eq!(snapshot.remaining_ms, Some(899_000));
        assert_eq!(snapshot.unit_mode, UnitMode::Min);
        assert_eq!(snapshot.celebration, CelebrationState::Idle);
        assert!(!snapshot.muted);
        assert!(snapshot.hint.contains("tab"));

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["unitMode"], "min");
        assert_eq!(json["phase"], "running");
    }
}
