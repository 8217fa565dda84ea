//! Procedural audio cues
//!
//! Every cue is synthesized into a mono sample buffer and handed to an
//! [`AudioOutput`]. Output failures are logged and otherwise ignored: a
//! missing sound device only means a silent celebration.

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

pub const SAMPLE_RATE: u32 = 44_100;

const TICK_FREQUENCY: f64 = 880.0;
const TICK_SECONDS: f64 = 0.15;
const TICK_ATTACK_SECONDS: f64 = 0.01;
const BANG_SECONDS: f64 = 0.3;
const ALARM_SECONDS: f64 = 1.0;

/// A synthesized sound ready for playback
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub name: &'static str,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl Clip {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

fn sample_count(seconds: f64) -> usize {
    (f64::from(SAMPLE_RATE) * seconds).round() as usize
}

/// Exponential gain ramp from `from` to `to` over `progress` in [0, 1]
fn exponential_ramp(from: f64, to: f64, progress: f64) -> f64 {
    from * (to / from).powf(progress)
}

/// Short 880 Hz beep used for the last five seconds
pub fn synth_tick() -> Clip {
    let count = sample_count(TICK_SECONDS);
    let attack = sample_count(TICK_ATTACK_SECONDS);
    let samples = (0..count)
        .map(|i| {
            let t = i as f64 / f64::from(SAMPLE_RATE);
            let gain = if i < attack {
                0.5 * i as f64 / attack as f64
            } else {
                let release = (i - attack) as f64 / (count - attack) as f64;
                exponential_ramp(0.5, 0.0001, release)
            };
            ((t * TICK_FREQUENCY * std::f64::consts::TAU).sin() * gain) as f32
        })
        .collect();
    Clip {
        name: "tick",
        sample_rate: SAMPLE_RATE,
        samples,
    }
}

/// Burst of white noise with a fast exponential decay
pub fn synth_bang(rng: &mut StdRng) -> Clip {
    let count = sample_count(BANG_SECONDS);
    let samples = (0..count)
        .map(|i| {
            let gain = exponential_ramp(0.5, 0.001, i as f64 / count as f64);
            (rng.gen_range(-1.0..1.0) * gain) as f32
        })
        .collect();
    Clip {
        name: "bang",
        sample_rate: SAMPLE_RATE,
        samples,
    }
}

/// Rising sweep played while the celebration grows
pub fn synth_ramp(duration_ms: i64) -> Clip {
    let count = sample_count(duration_ms.max(1) as f64 / 1_000.0);
    let mut phase = 0.0_f64;
    let samples = (0..count)
        .map(|i| {
            let progress = i as f64 / count as f64;
            let frequency = exponential_ramp(220.0, 880.0, progress);
            let gain = 0.05 + 0.35 * progress;
            phase += frequency / f64::from(SAMPLE_RATE);
            ((phase * std::f64::consts::TAU).sin() * gain) as f32
        })
        .collect();
    Clip {
        name: "ramp",
        sample_rate: SAMPLE_RATE,
        samples,
    }
}

/// One second of a two-tone horn, looped while the alarm rings
pub fn synth_alarm() -> Clip {
    let count = sample_count(ALARM_SECONDS);
    let quarter = count / 4;
    let samples = (0..count)
        .map(|i| {
            let t = i as f64 / f64::from(SAMPLE_RATE);
            let frequency = if (i / quarter.max(1)) % 2 == 0 { 523.25 } else { 659.25 };
            let carrier = (t * frequency * std::f64::consts::TAU).sin();
            let overtone = (t * frequency * 2.0 * std::f64::consts::TAU).sin() * 0.3;
            ((carrier + overtone) * 0.25) as f32
        })
        .collect();
    Clip {
        name: "alarm",
        sample_rate: SAMPLE_RATE,
        samples,
    }
}

/// Destination for synthesized clips
pub trait AudioOutput: Send {
    /// Prepare the device; called before every cue and must be cheap once ready
    fn init(&mut self) -> Result<(), String>;
    fn play(&mut self, clip: Clip) -> Result<(), String>;
    fn play_loop(&mut self, clip: Clip) -> Result<(), String>;
    fn stop_loop(&mut self) -> Result<(), String>;
}

/// Output that only logs what would have been played
#[derive(Debug, Default)]
pub struct SilentOutput;

impl AudioOutput for SilentOutput {
    fn init(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn play(&mut self, clip: Clip) -> Result<(), String> {
        debug!("Cue {} ({:.2}s)", clip.name, clip.duration_secs());
        Ok(())
    }

    fn play_loop(&mut self, clip: Clip) -> Result<(), String> {
        debug!("Looping cue {}", clip.name);
        Ok(())
    }

    fn stop_loop(&mut self) -> Result<(), String> {
        debug!("Loop stopped");
        Ok(())
    }
}

/// Mute-aware front end for the audio output
pub struct AudioCues {
    output: Box<dyn AudioOutput>,
    muted: bool,
    ready: bool,
    looping: bool,
    rng: StdRng,
}

impl AudioCues {
    pub fn new(output: Box<dyn AudioOutput>, muted: bool) -> Self {
        Self {
            output,
            muted,
            ready: false,
            looping: false,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            self.stop_alarm();
        }
    }

    /// Initialize the output; false means the cues stay silent
    pub fn initialize(&mut self) -> bool {
        if self.ready {
            return true;
        }
        match self.output.init() {
            Ok(()) => {
                self.ready = true;
                true
            }
            Err(e) => {
                debug!("Audio output unavailable: {}", e);
                false
            }
        }
    }

    fn play(&mut self, clip: Clip) {
        if self.muted || !self.initialize() {
            return;
        }
        if let Err(e) = self.output.play(clip) {
            debug!("Failed to play cue: {}", e);
        }
    }

    pub fn tick(&mut self) {
        self.play(synth_tick());
    }

    pub fn bang(&mut self) {
        if self.muted {
            return;
        }
        let clip = synth_bang(&mut self.rng);
        self.play(clip);
    }

    pub fn ramp(&mut self, duration_ms: i64) {
        if self.muted {
            return;
        }
        self.play(synth_ramp(duration_ms));
    }

    pub fn start_alarm(&mut self) {
        if self.muted || self.looping || !self.initialize() {
            return;
        }
        match self.output.play_loop(synth_alarm()) {
            Ok(()) => self.looping = true,
            Err(e) => debug!("Failed to start alarm: {}", e),
        }
    }

    pub fn stop_alarm(&mut self) {
        if !self.looping {
            return;
        }
        self.looping = false;
        if let Err(e) = self.output.stop_loop() {
            debug!("Failed to stop alarm: {}", e);
        }
    }
}
