//! System operations: desktop notifications and sleep inhibition

use std::path::PathBuf;

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::notifications::{NOTIFICATION_BODY, NOTIFICATION_TITLE};

pub const NOTIFY_SEND: &str = "notify-send";
pub const SYSTEMD_INHIBIT: &str = "systemd-inhibit";

/// Locate an executable on `PATH`
pub fn find_in_path(program: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Check if notify-send is available on the system
pub async fn check_notify_send_available() -> Result<(), String> {
    Command::new(NOTIFY_SEND)
        .arg("--version")
        .output()
        .await
        .map_err(|_| format!("{} is not available, desktop notifications disabled", NOTIFY_SEND))?;

    info!("{} is available", NOTIFY_SEND);
    Ok(())
}

/// Spawn a detached shell that sleeps and then shows the notification.
///
/// The shell is not tied to this process, so the alert still fires if the
/// server exits first. Killing the shell before it wakes cancels the alert.
pub fn spawn_delayed_notification(delay_ms: i64, title: &str, body: &str) -> Result<Child, String> {
    let seconds = format!("{:.3}", delay_ms.max(0) as f64 / 1_000.0);
    debug!("Scheduling notification in {}s", seconds);

    Command::new("sh")
        .arg("-c")
        .arg(format!("sleep \"$0\" && {} \"$1\" \"$2\"", NOTIFY_SEND))
        .arg(&seconds)
        .arg(title)
        .arg(body)
        .kill_on_drop(false)
        .spawn()
        .map_err(|e| format!("Failed to spawn notification shell: {}", e))
}

/// Where the notification worker sends its alerts
pub trait AlertBackend: Send {
    fn schedule(&mut self, delay_ms: i64) -> Result<(), String>;
    /// Best-effort cancel of the most recently scheduled alert
    fn cancel_latest(&mut self) -> Result<(), String>;
}

/// Desktop alerts through `notify-send`
#[derive(Debug, Default)]
pub struct DesktopAlerts {
    pending: Vec<Child>,
}

impl DesktopAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget shells that already exited
    fn reap(&mut self) {
        self.pending.retain_mut(|child| matches!(child.try_wait(), Ok(None)));
    }
}

impl AlertBackend for DesktopAlerts {
    fn schedule(&mut self, delay_ms: i64) -> Result<(), String> {
        self.reap();
        let child = spawn_delayed_notification(delay_ms, NOTIFICATION_TITLE, NOTIFICATION_BODY)?;
        self.pending.push(child);
        Ok(())
    }

    fn cancel_latest(&mut self) -> Result<(), String> {
        self.reap();
        let Some(mut child) = self.pending.pop() else {
            debug!("No pending notification to cancel");
            return Ok(());
        };
        child.start_kill().map_err(|e| {
            warn!("Failed to cancel pending notification: {}", e);
            format!("Failed to kill notification shell: {}", e)
        })
    }
}

/// Keeps the host awake while a countdown runs
pub trait SleepInhibitor: Send {
    fn acquire(&mut self) -> Result<(), String>;
    fn release(&mut self);
}

/// Inhibitor that never holds anything
#[derive(Debug, Default)]
pub struct NoInhibitor;

impl SleepInhibitor for NoInhibitor {
    fn acquire(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn release(&mut self) {}
}

/// Sleep and idle lock held through a `systemd-inhibit` child.
///
/// The lock lives as long as the child; dropping or killing it releases the
/// lock, including when the server itself exits.
#[derive(Debug)]
pub struct SystemdInhibitor {
    program: String,
    hold: Option<Child>,
}

impl SystemdInhibitor {
    pub fn new() -> Self {
        Self::with_program(SYSTEMD_INHIBIT)
    }

    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
            hold: None,
        }
    }

    pub fn is_held(&self) -> bool {
        self.hold.is_some()
    }
}

impl Default for SystemdInhibitor {
    fn default() -> Self {
        Self::new()
    }
}

impl SleepInhibitor for SystemdInhibitor {
    fn acquire(&mut self) -> Result<(), String> {
        if let Some(child) = self.hold.as_mut() {
            if matches!(child.try_wait(), Ok(None)) {
                return Ok(());
            }
            debug!("Inhibitor exited on its own, acquiring again");
            self.hold = None;
        }
        if find_in_path(&self.program).is_none() {
            return Err(format!("{} is not available", self.program));
        }

        let child = Command::new(&self.program)
            .arg("--what=sleep:idle")
            .arg("--who=rainbow-dial")
            .arg("--why=Countdown running")
            .arg("sleep")
            .arg("infinity")
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("Failed to spawn {}: {}", self.program, e))?;
        info!("Holding sleep inhibitor while the countdown runs");
        self.hold = Some(child);
        Ok(())
    }

    fn release(&mut self) {
        let Some(mut child) = self.hold.take() else {
            return;
        };
        if let Err(e) = child.start_kill() {
            debug!("Failed to release sleep inhibitor: {}", e);
        } else {
            info!("Released sleep inhibitor");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Records acquire/release calls for assertions
    #[derive(Debug, Clone, Default)]
    pub struct RecordingInhibitor {
        pub calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl RecordingInhibitor {
        pub fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }

    impl SleepInhibitor for RecordingInhibitor {
        fn acquire(&mut self) -> Result<(), String> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push("acquire");
            }
            Ok(())
        }

        fn release(&mut self) {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push("release");
            }
        }
    }
}
