//! HTTP API module
//! 
//! This module contains the endpoints through which a gesture source drives
//! the countdown and a rendering surface observes it.

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
        // Gesture source
        .route("/drag/start", post(drag_start_handler))
        .route("/drag/move", post(drag_move_handler))
        .route("/drag/end", post(drag_end_handler))
        // Controls
        .route("/toggle", post(toggle_handler))
        .route("/reset", post(reset_handler))
        .route("/duration", post(duration_handler))
        // Rendering surface
        .route("/status", get(status_handler))
        .route("/events", get(events_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
