//! HTTP endpoint handlers
//!
//! Each input endpoint feeds one event into the engine under the shared lock
//! and answers with the snapshot taken right after it.

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::{
    dial::{Point, Viewport},
    state::{AppState, TimeUnit},
};
use super::responses::{
    ApiResponse, HealthResponse, ParticlesResponse, PointerDownRequest, PointerMoveRequest,
    StatusResponse, ViewportRequest,
};

/// Handle POST /pointer/down - Press on a region of the page
pub async fn pointer_down_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PointerDownRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let at = Point::new(request.x, request.y);
    let result = state.update_engine("pointer-down", |engine, now| {
        engine.pointer_down(now, request.region, at)
    });
    match result {
        Ok(((), dial)) => Ok(Json(ApiResponse::ok(
            format!("Pointer down on {:?}", request.region),
            dial,
        ))),
        Err(e) => {
            error!("Failed to handle pointer down: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /pointer/move - Drag the pointer
pub async fn pointer_move_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PointerMoveRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let at = Point::new(request.x, request.y);
    match state.update_engine("pointer-move", |engine, now| engine.pointer_move(now, at)) {
        Ok(((), dial)) => Ok(Json(ApiResponse::ok("Pointer moved".to_string(), dial))),
        Err(e) => {
            error!("Failed to handle pointer move: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /pointer/up - Release the pointer
pub async fn pointer_up_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.update_engine("pointer-up", |engine, now| engine.pointer_up(now)) {
        Ok(((), dial)) => Ok(Json(ApiResponse::ok("Pointer released".to_string(), dial))),
        Err(e) => {
            error!("Failed to handle pointer up: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /quick-set/:value - Jump to a 5-step dial mark and start
pub async fn quick_set_handler(
    State(state): State<Arc<AppState>>,
    Path(value): Path<u32>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.update_engine("quick-set", |engine, now| engine.quick_set(now, value)) {
        Ok((Ok(()), dial)) => {
            info!("Quick-set endpoint called with {}", value);
            Ok(Json(ApiResponse::ok(format!("Quick-set to {}", value), dial)))
        }
        Ok((Err(e), _)) => {
            warn!("Rejected quick-set: {}", e);
            Err(StatusCode::BAD_REQUEST)
        }
        Err(e) => {
            error!("Failed to handle quick-set: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /unit/:unit - Switch between "min" and "sec"
pub async fn unit_handler(
    State(state): State<Arc<AppState>>,
    Path(unit): Path<String>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let Some(unit) = TimeUnit::from_name(&unit) else {
        warn!("Unknown time unit: {}", unit);
        return Err(StatusCode::BAD_REQUEST);
    };

    match state.update_engine("unit", |engine, now| engine.set_unit(now, unit)) {
        Ok(((), dial)) => Ok(Json(ApiResponse::ok(format!("Unit set to {}", unit.name()), dial))),
        Err(e) => {
            error!("Failed to switch unit: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /mute - Toggle sound and notifications
pub async fn mute_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.update_engine("mute", |engine, now| engine.toggle_mute(now)) {
        Ok((muted, dial)) => {
            let message = if muted { "Muted" } else { "Unmuted" };
            info!("Mute endpoint called - {}", message);
            Ok(Json(ApiResponse::ok(message.to_string(), dial)))
        }
        Err(e) => {
            error!("Failed to toggle mute: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /viewport - Report a resize
pub async fn viewport_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ViewportRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    if !(request.width > 0.0 && request.height > 0.0) {
        warn!("Rejected viewport {}x{}", request.width, request.height);
        return Err(StatusCode::BAD_REQUEST);
    }

    let viewport = Viewport::new(request.width, request.height);
    let result = state.update_engine("viewport", |engine, _| {
        engine.set_viewport(viewport);
        engine.set_dial_center(request.dial_center);
    });
    match result {
        Ok(((), dial)) => Ok(Json(ApiResponse::ok(
            format!("Viewport set to {}x{}", request.width, request.height),
            dial,
        ))),
        Err(e) => {
            error!("Failed to set viewport: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - Current dial snapshot and server metadata
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let dial = match state.get_snapshot() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to get dial snapshot: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        dial,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /particles - Live confetti pieces
pub async fn particles_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ParticlesResponse>, StatusCode> {
    match state.get_pieces() {
        Ok(pieces) => Ok(Json(ParticlesResponse {
            count: pieces.len(),
            timestamp: chrono::Utc::now(),
            pieces,
        })),
        Err(e) => {
            error!("Failed to get particles: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
