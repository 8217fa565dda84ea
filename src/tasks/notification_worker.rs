//! Notification worker background task
//!
//! Receives worker messages from the engine and turns them into scheduled
//! desktop alerts. Failures are logged and otherwise ignored.

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::{
    services::{AlertBackend, WorkerMessage},
    state::app_state::now_ms,
};

/// Apply one message to the backend at time `now`
pub fn handle_message<B: AlertBackend>(backend: &mut B, message: WorkerMessage, now: i64) {
    match message {
        WorkerMessage::StartTimer { end_time } => {
            let delay = end_time - now;
            if delay <= 0 {
                debug!("Ignoring START_TIMER for an end time already passed");
                return;
            }
            match backend.schedule(delay) {
                Ok(()) => info!("Notification scheduled in {}ms", delay),
                Err(e) => warn!("Failed to schedule notification: {}", e),
            }
        }
        WorkerMessage::CancelTimer => {
            if let Err(e) = backend.cancel_latest() {
                warn!("Failed to cancel notification: {}", e);
            }
        }
    }
}

/// Background task that serves the notification channel until it closes
pub async fn notification_worker_task<B: AlertBackend>(
    mut rx: UnboundedReceiver<WorkerMessage>,
    mut backend: B,
) {
    info!("Starting notification worker");

    while let Some(message) = rx.recv().await {
        debug!("Worker received {:?}", message);
        handle_message(&mut backend, message, now_ms());
    }

    info!("Notification channel closed, worker stopping");
}
