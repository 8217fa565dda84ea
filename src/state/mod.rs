//! State management module
//!
//! Serialisable state types and the shared application state.

pub mod app_state;
pub mod celebration_state;
pub mod snapshot;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use celebration_state::CelebrationState;
pub use snapshot::DialSnapshot;
pub use timer_state::{TimeUnit, TimerSession, UnitMode};
