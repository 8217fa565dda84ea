//! Frame loop background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::state::AppState;

/// Roughly one display frame at 60 Hz
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Background task that drives timeouts, animations, countdown and particles
pub async fn frame_loop_task(state: Arc<AppState>) {
    info!("Starting frame loop ({}ms)", FRAME_INTERVAL.as_millis());

    let mut ticker = interval(FRAME_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut was_running = false;

    loop {
        ticker.tick().await;

        match state.frame() {
            Ok(snapshot) => {
                if snapshot.running != was_running {
                    debug!("Countdown running: {}", snapshot.running);
                    was_running = snapshot.running;
                }
            }
            Err(e) => {
                error!("Frame failed: {}", e);
            }
        }
    }
}
