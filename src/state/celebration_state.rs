//! Celebration state reported to clients

use serde::{Deserialize, Serialize};

/// Phase of the post-expiry celebration.
///
/// `Interrupted` is reachable from every other non-idle phase and always
/// returns to `Idle` once the grace period has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum CelebrationState {
    #[default]
    Idle,
    Growing,
    Bursting,
    Raining,
    Interrupted,
}
