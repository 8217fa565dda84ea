//! Persistence of the running timer across process restarts
//!
//! Only `{endTime, duration, unit}` survives a restart. On load the session's
//! start anchor is re-synthesized from the end time, so a countdown that kept
//! running while the process was gone resumes at the right place.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::storage::KeyValueStore;
use crate::state::{TimeUnit, TimerSession};

pub const TIMER_STORAGE_KEY: &str = "rainbowTimerData";
pub const MUTED_STORAGE_KEY: &str = "rainbowTimerMuted";

/// The record written to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTimer {
    pub end_time: f64,
    pub duration: f64,
    #[serde(default)]
    pub unit: TimeUnit,
}

/// A session reconstructed from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoredTimer {
    pub session: TimerSession,
    pub unit: TimeUnit,
}

/// Best-effort gateway over a [`KeyValueStore`]; never surfaces failures
pub struct PersistenceGateway {
    store: Box<dyn KeyValueStore>,
}

impl PersistenceGateway {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn save(&mut self, session: &TimerSession, unit: TimeUnit) {
        let record = PersistedTimer {
            end_time: session.end_time() as f64,
            duration: session.duration_ms() as f64,
            unit,
        };
        let raw = match serde_json::to_string(&record) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Failed to encode timer record: {}", e);
                return;
            }
        };
        match self.store.set(TIMER_STORAGE_KEY, &raw) {
            Ok(()) => debug!("Persisted timer ending at {}", session.end_time()),
            Err(e) => debug!("Timer not persisted: {:#}", e),
        }
    }

    /// Restore a session still running at `now`.
    ///
    /// Absent, malformed and non-positive records read as "no timer"; an
    /// expired record is also removed from the store.
    pub fn load(&mut self, now: i64) -> Option<RestoredTimer> {
        let raw = match self.store.get(TIMER_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                debug!("Persisted timer unreadable: {:#}", e);
                return None;
            }
        };
        let record: PersistedTimer = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                debug!("Discarding malformed timer record: {}", e);
                return None;
            }
        };
        if !record.end_time.is_finite() || !record.duration.is_finite() || record.duration <= 0.0 {
            debug!("Discarding timer record with unusable numbers");
            return None;
        }

        let end_time = record.end_time.round() as i64;
        let duration = record.duration.round() as i64;
        let Some(remaining) = end_time.checked_sub(now) else {
            debug!("Discarding timer record with out-of-range end time");
            return None;
        };
        if remaining <= 0 {
            info!("Persisted timer already expired, clearing it");
            self.clear();
            return None;
        }

        let start_time = duration
            .checked_sub(remaining)
            .and_then(|elapsed| now.checked_sub(elapsed))?;
        let session = TimerSession::new(start_time, duration)?;
        info!("Restored timer with {}ms remaining", remaining);
        Some(RestoredTimer {
            session,
            unit: record.unit,
        })
    }

    pub fn clear(&mut self) {
        if let Err(e) = self.store.remove(TIMER_STORAGE_KEY) {
            debug!("Failed to clear persisted timer: {:#}", e);
        }
    }

    pub fn save_muted(&mut self, muted: bool) {
        if let Err(e) = self.store.set(MUTED_STORAGE_KEY, if muted { "true" } else { "false" }) {
            debug!("Mute state not persisted: {:#}", e);
        }
    }

    /// Stored mute flag; muted unless the user has unmuted before
    pub fn load_muted(&self) -> bool {
        match self.store.get(MUTED_STORAGE_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or(true),
            _ => true,
        }
    }
}
