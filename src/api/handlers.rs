//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream, StreamExt};
use tracing::{info, warn};

use crate::{
    dial::Offset,
    error::{Result as TimerResult, TimerError},
    state::{AppState, Countdown, TimerSnapshot},
};
use super::responses::{
    ApiError, ApiResponse, DragMoveRequest, DragStartRequest, DurationRequest, HealthResponse,
    StatusResponse,
};

type ApiResult = Result<Json<ApiResponse>, ApiError>;

/// Run an operation on the countdown and turn the outcome into a response
fn respond<F>(state: &AppState, action: &str, operation: F) -> ApiResult
where
    F: FnOnce(&Countdown) -> TimerResult<TimerSnapshot>,
{
    match state.apply(action, operation) {
        Ok(timer) => Ok(Json(ApiResponse::ok(format!("{} applied", action), timer))),
        Err(error) => {
            warn!("Rejected {}: {}", action, error);
            Err(ApiError {
                error,
                timer: state.countdown.snapshot(),
            })
        }
    }
}

/// Unwrap a JSON body; a malformed one is reported as invalid input
fn parse_body<T>(
    state: &AppState,
    action: &str,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    match payload {
        Ok(Json(request)) => Ok(request),
        Err(rejection) => {
            let reason = rejection.body_text();
            warn!("Rejected {} body: {}", action, reason);
            Err(ApiError {
                error: TimerError::InvalidInput(reason),
                timer: state.countdown.snapshot(),
            })
        }
    }
}

/// Handle POST /drag/start - Begin adjusting the duration
pub async fn drag_start_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DragStartRequest>, JsonRejection>,
) -> ApiResult {
    let request = parse_body(&state, "drag-start", payload)?;
    respond(&state, "drag-start", |countdown| match request {
        DragStartRequest::Angle(start) => countdown.begin_adjust(start.angle),
        DragStartRequest::Position(at) => countdown.drag_start(Offset::new(at.x, at.y)),
    })
}

/// Handle POST /drag/move - Rotate the dial pointer
pub async fn drag_move_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DragMoveRequest>, JsonRejection>,
) -> ApiResult {
    let request = parse_body(&state, "drag-move", payload)?;
    respond(&state, "drag-move", |countdown| match request {
        DragMoveRequest::Angle(step) => countdown.adjust(step.delta),
        DragMoveRequest::Offset(step) => countdown.drag_move(Offset::new(step.dx, step.dy)),
    })
}

/// Handle POST /drag/end - Finish adjusting the duration
pub async fn drag_end_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    respond(&state, "drag-end", |countdown| countdown.end_adjust())
}

/// Handle POST /toggle - Start or pause the countdown
pub async fn toggle_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    let response = respond(&state, "toggle", |countdown| countdown.toggle())?;
    info!("Toggle endpoint called - timer {}", response.timer.status);
    Ok(response)
}

/// Handle POST /reset - Clear the countdown
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    respond(&state, "reset", |countdown| countdown.reset())
}

/// Handle POST /duration - Load a duration from the picker
pub async fn duration_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DurationRequest>, JsonRejection>,
) -> ApiResult {
    let request = parse_body(&state, "duration", payload)?;
    respond(&state, "duration", |countdown| match request {
        DurationRequest::Hms(picker) => {
            countdown.set_duration_hms(picker.hours, picker.minutes, picker.seconds)
        }
        DurationRequest::Seconds(plain) => countdown.set_duration(plain.seconds),
    })
}

/// Handle GET /status - Return current timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer: state.countdown.snapshot(),
        tick_active: state.countdown.has_active_tick(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /events - Stream a snapshot on every timer change
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut updates = state.countdown.subscribe();
    let current = updates.borrow_and_update().clone();

    let changes = stream::unfold(updates, |mut updates| async move {
        updates.changed().await.ok()?;
        let snapshot = updates.borrow_and_update().clone();
        Some((snapshot, updates))
    });

    let events = stream::once(async move { current })
        .chain(changes)
        .map(|snapshot| Ok::<_, Infallible>(snapshot_event(&snapshot)));

    Sse::new(events).keep_alive(KeepAlive::default())
}

fn snapshot_event(snapshot: &TimerSnapshot) -> Event {
    match Event::default().event("timer").json_data(snapshot) {
        Ok(event) => event,
        Err(e) => {
            warn!("Failed to encode timer event: {}", e);
            Event::default().event("timer").data(snapshot.formatted.clone())
        }
    }
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
