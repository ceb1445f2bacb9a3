// ============================
// crates/hub-lib/src/error.rs
// ============================
//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Hub error taxonomy.
///
/// Every variant is recovered at the boundary of the triggering event and
/// reported back to the originating connection as a failure ack; none of
/// them crash the process or touch other connections' state.
#[derive(Error, Debug)]
pub enum HubError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Full(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HubError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            HubError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            HubError::NotFound(_) => StatusCode::NOT_FOUND,
            HubError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            HubError::Conflict(_) => StatusCode::CONFLICT,
            HubError::Full(_) => StatusCode::CONFLICT,
            HubError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            HubError::InvalidArgument(_) => "INVALID_ARGUMENT",
            HubError::NotFound(_) => "NOT_FOUND",
            HubError::Unauthorized(_) => "UNAUTHORIZED",
            HubError::Conflict(_) => "CONFLICT",
            HubError::Full(_) => "FULL",
            HubError::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for HubError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        HubError::Internal("Failed to send message".to_string())
    }
}

impl From<String> for HubError {
    fn from(msg: String) -> Self {
        HubError::Internal(msg)
    }
}

impl From<&str> for HubError {
    fn from(msg: &str) -> Self {
        HubError::Internal(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_hub_error_display() {
        let err = HubError::Full("room lobby is full".to_string());
        assert_eq!(err.to_string(), "room lobby is full");

        let err = HubError::Internal("boom".to_string());
        assert_eq!(err.to_string(), "Internal error: boom");
    }

    #[test]
    fn test_hub_error_status_codes() {
        assert_eq!(
            HubError::InvalidArgument("bad seats".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            HubError::NotFound("no such room".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            HubError::Unauthorized("wrong password".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            HubError::Conflict("name taken".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            HubError::Full("full".to_string()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_hub_error_codes() {
        assert_eq!(
            HubError::Unauthorized("nope".to_string()).error_code(),
            "UNAUTHORIZED"
        );
        assert_eq!(HubError::Full("full".to_string()).error_code(), "FULL");
    }

    #[test]
    fn test_hub_error_into_response() {
        let response = HubError::NotFound("room gone".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_from_impls() {
        let app_err: HubError = "send failed".into();
        assert!(matches!(app_err, HubError::Internal(_)));

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<u8>();
        drop(rx);
        let app_err: HubError = tx.send(1).unwrap_err().into();
        assert!(matches!(app_err, HubError::Internal(_)));
    }
}
