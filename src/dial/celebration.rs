//! Post-expiry celebration: grow, burst, optional rain, interruption

use rand::rngs::StdRng;
use tracing::{debug, info};

use super::deferred::Timeout;
use super::particles::{fork_rng, ConfettiPiece, ParticleField};
use super::{Point, Viewport};
use crate::services::audio::AudioCues;
use crate::state::CelebrationState;

/// Delay between the burst and the looping alarm
pub const ALARM_DELAY_MS: i64 = 200;
/// Time from the first interruption until everything is torn down
pub const INTERRUPT_GRACE_MS: i64 = 2_000;
/// Time the burn-off line needs to sweep the whole viewport
pub const BURN_OFF_MS: i64 = 1_500;

/// Owns one celebration episode and every particle field on screen
#[derive(Debug)]
pub struct CelebrationMachine {
    grow_ms: i64,
    party_mode: bool,
    growing: bool,
    celebrating: bool,
    alarm_playing: bool,
    raining: bool,
    interruption_time: Option<i64>,
    origin: Point,
    grow_timeout: Timeout,
    alarm_timeout: Timeout,
    teardown_timeout: Timeout,
    burst: Option<ParticleField>,
    rain: Option<ParticleField>,
    pops: Vec<ParticleField>,
}

impl CelebrationMachine {
    pub fn new(grow_ms: i64) -> Self {
        Self {
            grow_ms: grow_ms.max(0),
            party_mode: false,
            growing: false,
            celebrating: false,
            alarm_playing: false,
            raining: false,
            interruption_time: None,
            origin: Point::default(),
            grow_timeout: Timeout::new(),
            alarm_timeout: Timeout::new(),
            teardown_timeout: Timeout::new(),
            burst: None,
            rain: None,
            pops: Vec::new(),
        }
    }

    pub fn state(&self) -> CelebrationState {
        if self.interruption_time.is_some() {
            CelebrationState::Interrupted
        } else if self.growing {
            CelebrationState::Growing
        } else if self.burst.is_some() {
            CelebrationState::Bursting
        } else if self.raining {
            CelebrationState::Raining
        } else if self.celebrating || self.alarm_playing {
            CelebrationState::Bursting
        } else {
            CelebrationState::Idle
        }
    }

    /// An episode is running and has not been interrupted yet
    pub fn in_progress(&self) -> bool {
        self.growing || self.celebrating || self.alarm_playing || self.raining
    }

    pub fn is_interrupted(&self) -> bool {
        self.interruption_time.is_some()
    }

    pub fn interruption_time(&self) -> Option<i64> {
        self.interruption_time
    }

    pub fn alarm_playing(&self) -> bool {
        self.alarm_playing
    }

    pub fn is_raining(&self) -> bool {
        self.raining
    }

    pub fn party_mode(&self) -> bool {
        self.party_mode
    }

    pub fn toggle_party_mode(&mut self) -> bool {
        self.party_mode = !self.party_mode;
        info!("Party mode {}", if self.party_mode { "on" } else { "off" });
        self.party_mode
    }

    /// Start an episode at `origin`; ignored while one is active or winding down
    pub fn begin(
        &mut self,
        now: i64,
        origin: Point,
        audio: &mut AudioCues,
        rng: &mut StdRng,
    ) -> bool {
        if self.in_progress() || self.is_interrupted() {
            debug!("Celebration already active, ignoring trigger");
            return false;
        }
        self.origin = origin;
        if self.grow_ms > 0 {
            info!("Celebration growing for {}ms", self.grow_ms);
            self.growing = true;
            audio.ramp(self.grow_ms);
            self.grow_timeout.arm(now + self.grow_ms);
        } else {
            self.burst(now, audio, rng);
        }
        true
    }

    fn burst(&mut self, now: i64, audio: &mut AudioCues, rng: &mut StdRng) {
        info!("Celebration burst at ({:.0}, {:.0})", self.origin.x, self.origin.y);
        self.growing = false;
        self.celebrating = true;
        audio.bang();
        self.burst = Some(ParticleField::burst(self.origin, fork_rng(rng)));
        if self.party_mode {
            self.raining = true;
            self.rain = Some(ParticleField::rain(fork_rng(rng)));
        }
        self.alarm_timeout.arm(now + ALARM_DELAY_MS);
    }

    /// Cut the running episode short.
    ///
    /// The interruption time is kept from the first interruption of an
    /// episode, so repeated clicks do not extend the grace period.
    pub fn interrupt(
        &mut self,
        now: i64,
        at: Option<Point>,
        audio: &mut AudioCues,
        rng: &mut StdRng,
    ) -> bool {
        if !self.in_progress() {
            return false;
        }
        audio.bang();
        if let Some(point) = at {
            self.pop(point, rng);
        }

        self.grow_timeout.cancel();
        self.alarm_timeout.cancel();
        audio.stop_alarm();
        self.growing = false;
        self.celebrating = false;
        self.alarm_playing = false;
        self.raining = false;

        let since = *self.interruption_time.get_or_insert(now);
        self.teardown_timeout.arm(since + INTERRUPT_GRACE_MS);
        info!("Celebration interrupted");
        true
    }

    /// Small burst at a point, independent of any episode
    pub fn pop(&mut self, at: Point, rng: &mut StdRng) {
        self.pops.push(ParticleField::pop(at, fork_rng(rng)));
    }

    /// Run due timeouts
    pub fn poll(&mut self, now: i64, audio: &mut AudioCues, rng: &mut StdRng) {
        if self.grow_timeout.fire(now) && self.growing {
            self.burst(now, audio, rng);
        }
        if self.alarm_timeout.fire(now) && self.celebrating && !self.is_interrupted() {
            info!("Alarm ringing");
            self.alarm_playing = true;
            audio.start_alarm();
        }
        if self.teardown_timeout.fire(now) {
            debug!("Celebration torn down");
            self.burst = None;
            self.rain = None;
            self.interruption_time = None;
        }
    }

    /// Advance every particle field by one frame
    pub fn step_particles(&mut self, now: i64, viewport: Viewport) {
        let burn_off = self
            .interruption_time
            .map(|at| (now - at).max(0) as f64 / BURN_OFF_MS as f64 * viewport.height);

        if let Some(burst) = self.burst.as_mut() {
            if burst.step(viewport, burn_off, false) {
                debug!("Burst finished");
                self.burst = None;
            }
        }
        if let Some(rain) = self.rain.as_mut() {
            let spawning = self.raining && self.interruption_time.is_none();
            rain.step(viewport, burn_off, spawning);
        }
        self.pops.retain_mut(|pop| !pop.step(viewport, None, false));
    }

    pub fn pieces(&self) -> impl Iterator<Item = &ConfettiPiece> {
        self.burst
            .iter()
            .chain(self.rain.iter())
            .chain(self.pops.iter())
            .flat_map(|field| field.pieces().iter())
    }

    pub fn piece_count(&self) -> usize {
        self.pieces().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::audio::testing::RecordingOutput;
    use rand::SeedableRng;

    fn fixture(grow_ms: i64) -> (CelebrationMachine, AudioCues, RecordingOutput, StdRng) {
        let output = RecordingOutput::default();
        let audio = AudioCues::new(Box::new(output.clone()), false);
        (CelebrationMachine::new(grow_ms), audio, output, StdRng::seed_from_u64(3))
    }

    fn run_frames(
        machine: &mut CelebrationMachine,
        audio: &mut AudioCues,
        rng: &mut StdRng,
        from: i64,
        to: i64,
    ) {
        let viewport = Viewport::new(1000.0, 800.0);
        let mut now = from;
        while now <= to {
            machine.poll(now, audio, rng);
            machine.step_particles(now, viewport);
            now += 16;
        }
    }

    #[test]
    fn test_growing_leads_into_burst() {
        let (mut machine, mut audio, output, mut rng) = fixture(600);
        assert!(machine.begin(0, Point::new(500.0, 400.0), &mut audio, &mut rng));
        assert_eq!(machine.state(), CelebrationState::Growing);
        assert_eq!(output.names(), vec!["ramp"]);

        machine.poll(599, &mut audio, &mut rng);
        assert_eq!(machine.state(), CelebrationState::Growing);
        machine.poll(600, &mut audio, &mut rng);
        assert_eq!(machine.state(), CelebrationState::Bursting);
        assert_eq!(machine.piece_count(), 150);

        machine.poll(800, &mut audio, &mut rng);
        assert!(machine.alarm_playing());
        assert_eq!(output.names(), vec!["ramp", "bang", "loop:alarm"]);
    }

    #[test]
    fn test_zero_lead_in_bursts_directly() {
        let (mut machine, mut audio, output, mut rng) = fixture(0);
        machine.begin(0, Point::new(500.0, 400.0), &mut audio, &mut rng);
        assert_eq!(machine.state(), CelebrationState::Bursting);
        assert_eq!(output.names(), vec!["bang"]);
    }

    #[test]
    fn test_second_trigger_is_ignored() {
        let (mut machine, mut audio, _output, mut rng) = fixture(0);
        assert!(machine.begin(0, Point::default(), &mut audio, &mut rng));
        assert!(!machine.begin(10, Point::default(), &mut audio, &mut rng));
        assert_eq!(machine.piece_count(), 150);
    }

    #[test]
    fn test_party_mode_rains_after_burst() {
        let (mut machine, mut audio, _output, mut rng) = fixture(0);
        machine.toggle_party_mode();
        machine.begin(0, Point::new(500.0, 400.0), &mut audio, &mut rng);
        assert!(machine.is_raining());

        // the burst ring has landed long before twenty seconds
        run_frames(&mut machine, &mut audio, &mut rng, 16, 20_000);
        assert_eq!(machine.state(), CelebrationState::Raining);
        assert!(machine.piece_count() > 0);
    }

    #[test]
    fn test_interruption_tears_down_after_grace() {
        let (mut machine, mut audio, output, mut rng) = fixture(0);
        machine.toggle_party_mode();
        machine.begin(0, Point::new(500.0, 400.0), &mut audio, &mut rng);
        run_frames(&mut machine, &mut audio, &mut rng, 16, 3_000);
        assert!(machine.alarm_playing());

        assert!(machine.interrupt(3_000, Some(Point::new(10.0, 10.0)), &mut audio, &mut rng));
        assert_eq!(machine.state(), CelebrationState::Interrupted);
        assert_eq!(machine.interruption_time(), Some(3_000));
        assert!(!machine.is_raining());
        assert!(!machine.alarm_playing());
        assert!(output.names().ends_with(&["bang".to_string(), "stop".to_string()]));

        // a second interruption neither moves the marker nor re-bangs
        assert!(!machine.interrupt(3_500, None, &mut audio, &mut rng));
        assert_eq!(machine.interruption_time(), Some(3_000));

        // burn-off has swept the whole viewport by 1.5s; only pops remain
        run_frames(&mut machine, &mut audio, &mut rng, 3_016, 4_600);
        assert!(machine.burst.is_none());
        assert!(machine.rain.as_ref().map_or(true, |r| r.is_empty()));
        assert_eq!(machine.state(), CelebrationState::Interrupted);

        machine.poll(4_999, &mut audio, &mut rng);
        assert_eq!(machine.state(), CelebrationState::Interrupted);
        machine.poll(5_000, &mut audio, &mut rng);
        assert_eq!(machine.state(), CelebrationState::Idle);
        assert!(machine.rain.is_none());
        assert!(!machine.in_progress());
    }

    #[test]
    fn test_interrupt_during_growing_never_bursts() {
        let (mut machine, mut audio, output, mut rng) = fixture(600);
        machine.begin(0, Point::default(), &mut audio, &mut rng);
        machine.interrupt(100, None, &mut audio, &mut rng);
        run_frames(&mut machine, &mut audio, &mut rng, 116, 1_000);
        assert_eq!(output.count("bang"), 1);
        assert_eq!(output.count("loop:alarm"), 0);
        assert!(machine.burst.is_none());
    }

    #[test]
    fn test_no_new_episode_while_interrupted() {
        let (mut machine, mut audio, _output, mut rng) = fixture(0);
        machine.begin(0, Point::default(), &mut audio, &mut rng);
        machine.interrupt(50, None, &mut audio, &mut rng);
        assert!(!machine.begin(60, Point::default(), &mut audio, &mut rng));
        machine.poll(2_050, &mut audio, &mut rng);
        assert!(machine.begin(2_060, Point::default(), &mut audio, &mut rng));
    }

    #[test]
    fn test_pops_fade_out_on_their_own() {
        let (mut machine, mut audio, _output, mut rng) = fixture(0);
        machine.pop(Point::new(200.0, 100.0), &mut rng);
        assert_eq!(machine.state(), CelebrationState::Idle);
        assert_eq!(machine.piece_count(), 150);
        run_frames(&mut machine, &mut audio, &mut rng, 0, 16 * 200);
        assert_eq!(machine.piece_count(), 0);
    }
}
