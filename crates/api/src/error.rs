//! Domain error to HTTP response translation.
//!
//! Conflict rejections become a structured "blocked" response carrying the
//! conflict list. Unexpected internal failures translate into a generic
//! message; the detail stays in the log trail, never in the response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use taskbridge_domain::TaskBridgeError;
use tracing::error;

/// Wrapper turning [`TaskBridgeError`] into an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub TaskBridgeError);

impl From<TaskBridgeError> for ApiError {
    fn from(err: TaskBridgeError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            TaskBridgeError::Conflict(details) => (
                StatusCode::CONFLICT,
                Json(json!({
                    "outcome": "blocked",
                    "candidate": details.candidate,
                    "conflicts": details.conflicts,
                })),
            )
                .into_response(),
            TaskBridgeError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            TaskBridgeError::InvalidInput(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            TaskBridgeError::Unauthorized(message) => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": message }))).into_response()
            }
            other => {
                error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use taskbridge_domain::{ConflictDetails, TaskSummary};

    use super::*;

    fn summary(id: &str) -> TaskSummary {
        TaskSummary {
            id: id.to_string(),
            name: format!("task {id}"),
            start_time: None,
            end_time: None,
            completed: false,
        }
    }

    #[test]
    fn conflict_maps_to_409_blocked() {
        let err = ApiError(TaskBridgeError::Conflict(ConflictDetails {
            candidate: summary("c"),
            conflicts: vec![summary("a")],
        }));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn status_codes_follow_the_error_taxonomy() {
        let cases = [
            (TaskBridgeError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (TaskBridgeError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (TaskBridgeError::Unauthorized("x".into()), StatusCode::FORBIDDEN),
            (TaskBridgeError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (TaskBridgeError::Network("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (domain_err, expected) in cases {
            assert_eq!(ApiError(domain_err).into_response().status(), expected);
        }
    }
}
