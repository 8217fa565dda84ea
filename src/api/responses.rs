//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    dial::{ConfettiPiece, Point, Region},
    state::DialSnapshot,
};

/// Body of POST /pointer/down
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointerDownRequest {
    pub region: Region,
    pub x: f64,
    pub y: f64,
}

/// Body of POST /pointer/move
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointerMoveRequest {
    pub x: f64,
    pub y: f64,
}

/// Body of POST /viewport
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportRequest {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub dial_center: Option<Point>,
}

/// API response structure for input endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub dial: DialSnapshot,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, dial: DialSnapshot) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            dial,
        }
    }

    pub fn ok(message: String, dial: DialSnapshot) -> Self {
        Self::new("ok".to_string(), message, dial)
    }
}

/// Status response with server metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub dial: DialSnapshot,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Live confetti, for renderers that draw the particle layer
#[derive(Debug, Clone, Serialize)]
pub struct ParticlesResponse {
    pub count: usize,
    pub timestamp: DateTime<Utc>,
    pub pieces: Vec<ConfettiPiece>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
