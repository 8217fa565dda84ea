//! Boundary adapters
//!
//! Storage, audio output, notifications, sleep inhibition and the system
//! commands behind them.
//! Every adapter degrades silently: a failure disables its feature, never the
//! countdown.

pub mod audio;
pub mod notifications;
pub mod persistence;
#[cfg(feature = "playback")]
pub mod playback;
pub mod storage;
pub mod system;

// Re-export main types
pub use audio::{AudioCues, AudioOutput, SilentOutput};
pub use notifications::{
    DesktopPrompt, Lang, NotificationHints, NotificationScheduler, Permission, PermissionPrompt,
    WorkerMessage,
};
pub use persistence::{PersistedTimer, PersistenceGateway};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use system::{
    check_notify_send_available, AlertBackend, DesktopAlerts, NoInhibitor, SleepInhibitor,
    SystemdInhibitor,
};
