//! API request and response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::TimerError, state::TimerSnapshot};

/// Pointer position on the dial, relative to its center
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointerPosition {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointerAngle {
    pub angle: f32,
}

/// Body of `POST /drag/start`: an angle or a pointer position
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DragStartRequest {
    Position(PointerPosition),
    Angle(PointerAngle),
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointerStep {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AngleStep {
    pub delta: f32,
}

/// Body of `POST /drag/move`: an angle delta or a pointer delta
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DragMoveRequest {
    Offset(PointerStep),
    Angle(AngleStep),
}

/// Picker columns; all three are required
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PickerDuration {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlainDuration {
    pub seconds: i64,
}

/// Body of `POST /duration`: picker columns or plain seconds.
///
/// Unknown or partial field sets match neither shape and are rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationRequest {
    Hms(PickerDuration),
    Seconds(PlainDuration),
}

/// API response structure for timer operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerSnapshot,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, timer: TimerSnapshot) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            timer,
        }
    }

    /// Create a success response
    pub fn ok(message: impl Into<String>, timer: TimerSnapshot) -> Self {
        Self::new("ok".to_string(), message.into(), timer)
    }

    /// Create an error response
    pub fn error(message: String, timer: TimerSnapshot) -> Self {
        Self::new("error".to_string(), message, timer)
    }
}

/// A rejected timer operation, rendered with the unchanged timer state
#[derive(Debug)]
pub struct ApiError {
    pub error: TimerError,
    pub timer: TimerSnapshot,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self.error {
            TimerError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
            TimerError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ApiResponse::error(self.error.to_string(), self.timer);
        (status, Json(body)).into_response()
    }
}

/// Status response with server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub tick_active: bool,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_request_shapes() {
        let hms: DurationRequest =
            serde_json::from_str(r#"{"hours": 1, "minutes": 2, "seconds": 3}"#).unwrap();
        assert!(matches!(
            hms,
            DurationRequest::Hms(PickerDuration { hours: 1, minutes: 2, seconds: 3 })
        ));

        let plain: DurationRequest = serde_json::from_str(r#"{"seconds": 90}"#).unwrap();
        assert!(matches!(plain, DurationRequest::Seconds(PlainDuration { seconds: 90 })));
    }

    #[test]
    fn test_partial_picker_is_rejected() {
        for body in [
            r#"{"hours": 1, "seconds": 5}"#,
            r#"{"minutes": 2}"#,
            r#"{"seconds": 5, "extra": true}"#,
        ] {
            assert!(serde_json::from_str::<DurationRequest>(body).is_err(), "{}", body);
        }
    }

    #[test]
    fn test_drag_request_shapes() {
        let start: DragStartRequest = serde_json::from_str(r#"{"angle": 179.0}"#).unwrap();
        assert!(matches!(start, DragStartRequest::Angle(_)));
        let start: DragStartRequest = serde_json::from_str(r#"{"x": -1.0, "y": 0.5}"#).unwrap();
        assert!(matches!(start, DragStartRequest::Position(_)));

        let step: DragMoveRequest = serde_json::from_str(r#"{"dx": 0.0, "dy": -2.0}"#).unwrap();
        assert!(matches!(step, DragMoveRequest::Offset(_)));
        let step: DragMoveRequest = serde_json::from_str(r#"{"delta": 2.5}"#).unwrap();
        assert!(matches!(step, DragMoveRequest::Angle(AngleStep { delta }) if delta == 2.5));
    }

    #[test]
    fn test_mixed_drag_fields_are_rejected() {
        assert!(serde_json::from_str::<DragStartRequest>(r#"{"angle": 10, "x": 1}"#).is_err());
        assert!(serde_json::from_str::<DragMoveRequest>(r#"{"delta": 1, "dx": 1}"#).is_err());
        assert!(serde_json::from_str::<DragMoveRequest>(r#"{"dx": 1}"#).is_err());
    }
}
