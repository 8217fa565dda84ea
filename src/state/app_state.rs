//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::warn;

use super::DialSnapshot;
use crate::dial::{ConfettiPiece, DialEngine};

/// Current wall-clock time in epoch milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Shared state: the engine behind one lock plus server metadata.
///
/// Input events and frame callbacks all go through `engine`, so they never
/// interleave.
pub struct AppState {
    pub engine: Arc<Mutex<DialEngine>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Latest snapshot, refreshed after every input and frame
    pub snapshot_tx: watch::Sender<DialSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    pub _snapshot_rx: watch::Receiver<DialSnapshot>,
}

impl AppState {
    pub fn new(engine: DialEngine, port: u16, host: String) -> Self {
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot(now_ms()));

        Self {
            engine: Arc::new(Mutex::new(engine)),
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            snapshot_tx,
            _snapshot_rx: snapshot_rx,
        }
    }

    /// Apply an input event to the engine and publish the resulting snapshot
    pub fn update_engine<F, T>(&self, action: &str, updater: F) -> Result<(T, DialSnapshot), String>
    where
        F: FnOnce(&mut DialEngine, i64) -> T,
    {
        let mut engine = self.engine.lock()
            .map_err(|e| format!("Failed to lock dial engine: {}", e))?;

        let now = now_ms();
        let output = updater(&mut engine, now);
        let snapshot = engine.snapshot(now);
        drop(engine); // Release the lock early

        // Update last action tracking
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }

        self.publish(snapshot.clone());
        Ok((output, snapshot))
    }

    /// Run one frame at the current time
    pub fn frame(&self) -> Result<DialSnapshot, String> {
        let mut engine = self.engine.lock()
            .map_err(|e| format!("Failed to lock dial engine: {}", e))?;

        let now = now_ms();
        engine.frame(now);
        let snapshot = engine.snapshot(now);
        drop(engine);

        self.publish(snapshot.clone());
        Ok(snapshot)
    }

    fn publish(&self, snapshot: DialSnapshot) {
        if let Err(e) = self.snapshot_tx.send(snapshot) {
            warn!("Failed to publish dial snapshot: {}", e);
        }
    }

    /// Get current dial snapshot
    pub fn get_snapshot(&self) -> Result<DialSnapshot, String> {
        self.engine.lock()
            .map(|engine| engine.snapshot(now_ms()))
            .map_err(|e| format!("Failed to lock dial engine: {}", e))
    }

    /// Get every live confetti piece
    pub fn get_pieces(&self) -> Result<Vec<ConfettiPiece>, String> {
        self.engine.lock()
            .map(|engine| engine.pieces())
            .map_err(|e| format!("Failed to lock dial engine: {}", e))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::app_state;
    use crate::dial::InteractionPhase;

    #[test]
    fn test_update_records_action_and_publishes() {
        let state = app_state();
        let mut rx = state.snapshot_tx.subscribe();

        let (result, snapshot) = state
            .update_engine("quick-set", |engine, now| engine.quick_set(now, 30))
            .unwrap();
        assert!(result.is_ok());
        assert_eq!(snapshot.phase, InteractionPhase::Animating);

        let (action, time) = state.get_last_action();
        assert_eq!(action.as_deref(), Some("quick-set"));
        assert!(time.is_some());

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().phase, InteractionPhase::Animating);
    }

    #[test]
    fn test_frame_does_not_touch_last_action() {
        let state = app_state();
        let snapshot = state.frame().unwrap();
        assert_eq!(snapshot.phase, InteractionPhase::Idle);
        assert_eq!(state.get_last_action(), (None, None));
        assert!(state.get_pieces().unwrap().is_empty());
    }

    #[test]
    fn test_uptime_format() {
        let state = app_state();
        assert!(state.get_uptime().ends_with('s'));
    }
}
