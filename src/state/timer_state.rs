//! Timer unit and session structures

use serde::{Deserialize, Serialize};

/// Scale of the dial: a full turn is one hour or one minute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TimeUnit {
    #[default]
    #[serde(rename = "min")]
    Minute,
    #[serde(rename = "sec")]
    Second,
}

impl TimeUnit {
    /// Duration represented by a full turn of the dial
    pub fn max_duration_ms(self) -> f64 {
        match self {
            TimeUnit::Minute => 3_600_000.0,
            TimeUnit::Second => 60_000.0,
        }
    }

    /// Granularity a released dial snaps to
    pub fn tick_ms(self) -> f64 {
        match self {
            TimeUnit::Minute => 60_000.0,
            TimeUnit::Second => 1_000.0,
        }
    }

    /// Parse the wire name used by the persisted record and the API
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "min" => Some(TimeUnit::Minute),
            "sec" => Some(TimeUnit::Second),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TimeUnit::Minute => "min",
            TimeUnit::Second => "sec",
        }
    }
}

/// What the unit switch displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitMode {
    #[serde(rename = "min")]
    Min,
    #[serde(rename = "sec")]
    Sec,
    /// Seconds scale entered automatically in the last minute of a minute timer
    #[serde(rename = "auto-sec")]
    AutoSec,
}

/// A running countdown, anchored to wall-clock time.
///
/// Remaining time is always derived from `start_time`, never stored, so a
/// session survives the process being suspended mid-countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSession {
    start_time: i64,
    duration_ms: i64,
}

impl TimerSession {
    /// Create a session; a non-positive duration is not a timer
    pub fn new(start_time: i64, duration_ms: i64) -> Option<Self> {
        if duration_ms <= 0 {
            return None;
        }
        Some(Self {
            start_time,
            duration_ms,
        })
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    /// Absolute end of the countdown
    pub fn end_time(&self) -> i64 {
        self.start_time + self.duration_ms
    }

    /// Remaining milliseconds at `now`; negative once expired
    pub fn remaining_ms(&self, now: i64) -> i64 {
        self.duration_ms - (now - self.start_time)
    }
}
