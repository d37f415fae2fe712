// HTTP error mapping
use crate::application::error::ServiceError;
use crate::domain::error::StatusError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Error type for HTTP handlers; renders `{ "error": <kind>, "message": <text> }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    /// Malformed client input; `kind` names what was wrong.
    #[error("{message}")]
    BadRequest { kind: &'static str, message: String },

    /// The data reached the core but had the wrong shape.
    #[error(transparent)]
    Status(#[from] StatusError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(kind: &'static str, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            kind,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(_) => ApiError::NotFound(err.to_string()),
            ServiceError::Range(e) => ApiError::bad_request("invalid_range", e.to_string()),
            ServiceError::Status(e) => ApiError::Status(e),
            ServiceError::Source(e) => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest { kind, message } => (StatusCode::BAD_REQUEST, *kind, message.clone()),
            ApiError::Status(e) => {
                tracing::warn!(error = %e, "rejected telemetry data");
                (StatusCode::UNPROCESSABLE_ENTITY, e.kind(), e.to_string())
            }
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "an internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": kind,
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::error::RangeError;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status_of(ServiceError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(ServiceError::Range(RangeError::Inverted)), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(ServiceError::Status(StatusError::InvalidValue {
                metric_id: Some("hydraulic.temp_out".into()),
                value: f64::NAN,
            })),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(ServiceError::Source(anyhow::anyhow!("store offline"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ApiError::bad_request("unknown_topic", "nope")),
            StatusCode::BAD_REQUEST
        );
    }
}
