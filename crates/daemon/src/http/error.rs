//! API error responses with stable machine-readable codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use vault::VaultError;

/// An error ready to be rendered as an HTTP response.
///
/// Every response body has the shape `{"error": <human>, "code": <CODE>}`.
/// Internal faults never leak detail; the underlying error is logged
/// instead.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

/// Result type alias for HTTP handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// 401 for bad credentials at login.
    pub fn auth_failed() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "AUTH_FAILED",
            message: "Invalid credentials".to_string(),
        }
    }

    /// 401 for a missing, expired, or invalid session.
    pub fn unauthorized(message: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "UNAUTHORIZED",
            message: message.to_string(),
        }
    }

    /// 400 for an upload without a usable filename.
    pub fn invalid_filename(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "INVALID_FILENAME",
            message: message.to_string(),
        }
    }

    /// 500 with no detail exposed.
    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR",
            message: "Internal server error".to_string(),
        }
    }

    /// The stable machine code carried in the body.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// The HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        // Exhaustive on purpose: a new vault variant without a status mapping
        // must not compile.
        let (status, message) = match &err {
            VaultError::PathEscape { .. } => (StatusCode::FORBIDDEN, "Access denied".to_string()),
            VaultError::RootDeletion => (
                StatusCode::FORBIDDEN,
                "Cannot delete home directory".to_string(),
            ),
            VaultError::NotFound { .. } => (StatusCode::NOT_FOUND, "Not found".to_string()),
            VaultError::NotADirectory { .. } => {
                (StatusCode::BAD_REQUEST, "Not a directory".to_string())
            }
            VaultError::IsADirectory { .. } => {
                (StatusCode::BAD_REQUEST, "Is a directory".to_string())
            }
            VaultError::InvalidFilename { .. } => {
                (StatusCode::BAD_REQUEST, "Invalid filename".to_string())
            }
            VaultError::TooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "File too large".to_string())
            }
            VaultError::StorageExhausted => (
                StatusCode::INSUFFICIENT_STORAGE,
                "Insufficient storage".to_string(),
            ),
            VaultError::Io(io_err) => {
                tracing::error!(error = %io_err, "internal filesystem error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        Self {
            status,
            code: err.code(),
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "code": self.code,
        }));
        (self.status, body).into_response()
    }
}
