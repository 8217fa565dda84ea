//! Timer interaction and celebration engine
//!
//! Everything in here is synchronous and takes the current time as an
//! argument. The server drives it from a frame loop and from API handlers,
//! always through the same lock, so input events and frames never interleave.

pub mod celebration;
pub mod deferred;
pub mod engine;
pub mod interaction;
pub mod mapper;
pub mod particles;
pub mod scheduler;

use serde::{Deserialize, Serialize};

pub use celebration::CelebrationMachine;
pub use engine::{DialEngine, EngineServices};
pub use particles::{ConfettiPiece, ParticleVariant};
pub use scheduler::CountdownScheduler;

/// Default length of the growing lead-in before the burst
pub const DEFAULT_GROW_MS: i64 = 600;

/// Screen-space position in CSS-like pixels, y growing downwards
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

/// Where a pointer-down landed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Region {
    /// The dial face itself
    Dial,
    /// A control nested in the dial (unit switch, mute button, quick-set marks)
    DialControl,
    /// The page title, which toggles party mode
    Title,
    /// Anywhere else
    Page,
}

/// Coarse phase of the interaction controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum InteractionPhase {
    #[default]
    Idle,
    Dragging,
    Animating,
    Running,
}

/// Tunables fixed at engine construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DialConfig {
    pub viewport: Viewport,
    /// Dial centre; defaults to the viewport centre
    pub dial_center: Option<Point>,
    /// Growing lead-in before the burst; 0 bursts straight away
    pub grow_ms: i64,
}

impl Default for DialConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            dial_center: None,
            grow_ms: DEFAULT_GROW_MS,
        }
    }
}
