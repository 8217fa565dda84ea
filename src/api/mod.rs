//! HTTP API module
//! 
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/pointer/down", post(pointer_down_handler))
        .route("/pointer/move", post(pointer_move_handler))
        .route("/pointer/up", post(pointer_up_handler))
        .route("/quick-set/:value", post(quick_set_handler))
        .route("/unit/:unit", post(unit_handler))
        .route("/mute", post(mute_handler))
        .route("/viewport", post(viewport_handler))
        .route("/status", get(status_handler))
        .route("/particles", get(particles_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
