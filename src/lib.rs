//! Rainbow Dial - A drag-to-set visual countdown dial served over HTTP
//! 
//! The dial engine maps drag gestures to a duration, counts it down, and
//! celebrates expiry with confetti and sound. Timers survive restarts through
//! a small key-value store, and a background worker can raise a desktop
//! notification even after the server has gone away.

pub mod config;
pub mod dial;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use dial::DialEngine;
pub use state::{AppState, DialSnapshot};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
