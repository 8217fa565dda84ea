//! Out-of-process end-of-timer notifications
//!
//! The engine only ever posts messages; it never learns whether a worker
//! received them. Dropped or late messages leave the foreground countdown
//! untouched.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use super::system::{find_in_path, NOTIFY_SEND};

pub const NOTIFICATION_TITLE: &str = "Rainbow Timer";
pub const NOTIFICATION_BODY: &str = "Your timer is up!";

/// Message contract with the background worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    #[serde(rename_all = "camelCase")]
    StartTimer { end_time: i64 },
    CancelTimer,
}

/// Fire-and-forget sender towards the worker
#[derive(Debug, Clone, Default)]
pub struct NotificationScheduler {
    tx: Option<UnboundedSender<WorkerMessage>>,
}

impl NotificationScheduler {
    pub fn new(tx: UnboundedSender<WorkerMessage>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn channel() -> (Self, UnboundedReceiver<WorkerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Scheduler with no worker behind it
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    pub fn start(&self, end_time: i64) {
        self.post(WorkerMessage::StartTimer { end_time });
    }

    pub fn cancel(&self) {
        self.post(WorkerMessage::CancelTimer);
    }

    fn post(&self, message: WorkerMessage) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(message).is_err() {
            debug!("Notification worker gone, dropped {:?}", message);
        }
    }
}

/// System notification permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    Default,
}

/// Source of notification permission, asked lazily on first unmute
pub trait PermissionPrompt: Send {
    fn current(&self) -> Permission;
    fn request(&mut self) -> Permission;
}

/// Grants permission when the desktop notifier is installed
#[derive(Debug)]
pub struct DesktopPrompt {
    state: Permission,
}

impl DesktopPrompt {
    pub fn new() -> Self {
        Self {
            state: Permission::Default,
        }
    }

    /// Prompt that has already been refused, used with `--no-notifications`
    pub fn denied() -> Self {
        Self {
            state: Permission::Denied,
        }
    }
}

impl Default for DesktopPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionPrompt for DesktopPrompt {
    fn current(&self) -> Permission {
        self.state
    }

    fn request(&mut self) -> Permission {
        if self.state == Permission::Default {
            self.state = match find_in_path(NOTIFY_SEND) {
                Some(path) => {
                    info!("Notifications granted via {}", path.display());
                    Permission::Granted
                }
                None => {
                    info!("{} not found, notifications denied", NOTIFY_SEND);
                    Permission::Denied
                }
            };
        }
        self.state
    }
}

/// Language of user-facing hints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    #[default]
    En,
    De,
}

impl Lang {
    /// German for any `de*` locale, English otherwise
    pub fn from_locale(locale: &str) -> Self {
        if locale.trim().to_ascii_lowercase().starts_with("de") {
            Lang::De
        } else {
            Lang::En
        }
    }

    /// Locale from the usual environment variables
    pub fn detect() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|value| !value.is_empty())
            .map(|value| Self::from_locale(&value))
            .unwrap_or_default()
    }
}

struct HintText {
    sound: &'static str,
    persistent: &'static str,
    fallback: &'static str,
    disabled: &'static str,
}

const EN: HintText = HintText {
    sound: "The alarm sound will only play if this tab is active.",
    persistent: "A system notification will be sent when the timer ends, even if the tab is closed.",
    fallback: "Background notifications may only work for a short time after you leave the tab.",
    disabled: "Notifications are disabled.",
};

const DE: HintText = HintText {
    sound: "Der Alarmton wird nur abgespielt, wenn dieser Tab aktiv ist.",
    persistent: "Eine Systembenachrichtigung wird gesendet, wenn der Timer endet, auch wenn der Tab geschlossen ist.",
    fallback: "Hintergrundbenachrichtigungen funktionieren möglicherweise nur für kurze Zeit, nachdem Sie den Tab verlassen haben.",
    disabled: "Benachrichtigungen sind deaktiviert.",
};

/// Renders the hint shown next to the mute button
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationHints {
    lang: Lang,
}

impl NotificationHints {
    pub fn new(lang: Lang) -> Self {
        Self { lang }
    }

    /// `persistent` tells whether a worker outlives the foreground process
    pub fn render(&self, permission: Permission, persistent: bool) -> String {
        let text = match self.lang {
            Lang::En => &EN,
            Lang::De => &DE,
        };
        match permission {
            Permission::Granted if persistent => format!("{} {}", text.persistent, text.sound),
            Permission::Granted => format!("{} {}", text.fallback, text.sound),
            Permission::Denied => format!("{} {}", text.disabled, text.sound),
            Permission::Default => text.sound.to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Prompt answering every request with a fixed permission
    #[derive(Debug)]
    pub struct FixedPrompt {
        pub state: Permission,
        pub answer: Permission,
        pub requests: usize,
    }

    impl FixedPrompt {
        pub fn new(answer: Permission) -> Self {
            Self {
                state: Permission::Default,
                answer,
                requests: 0,
            }
        }
    }

    impl PermissionPrompt for FixedPrompt {
        fn current(&self) -> Permission {
            self.state
        }

        fn request(&mut self) -> Permission {
            self.requests += 1;
            self.state = self.answer;
            self.state
        }
    }
}
