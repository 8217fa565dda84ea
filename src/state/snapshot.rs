//! Read-only view of the dial published to clients

use serde::{Deserialize, Serialize};

use super::{CelebrationState, TimeUnit, UnitMode};
use crate::dial::{InteractionPhase, Viewport};
use crate::services::notifications::Permission;

/// Everything a renderer needs to draw one frame of the dial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialSnapshot {
    pub angle: f64,
    pub unit: TimeUnit,
    pub unit_mode: UnitMode,
    pub phase: InteractionPhase,
    pub running: bool,
    pub remaining_ms: Option<i64>,
    pub duration_ms: Option<i64>,
    pub end_time: Option<i64>,
    pub celebration: CelebrationState,
    pub alarm_playing: bool,
    pub interruption_time: Option<i64>,
    pub party_mode: bool,
    pub muted: bool,
    pub particle_count: usize,
    pub notification_permission: Permission,
    pub hint: String,
    pub viewport: Viewport,
}
