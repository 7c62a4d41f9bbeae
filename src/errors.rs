use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type AppResult<T> = Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("token error: {0}")]
    Token(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn token(err: impl Into<String>) -> Self {
        Self::Token(err.into())
    }
}

/// The access token cookie was present but could not be verified
/// (bad signature, expired, wrong shape, unknown role).
///
/// The page gate never surfaces this; it routes the request as anonymous.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("access token could not be decoded: {0}")]
pub struct ClaimDecodeError(pub String);

impl From<ClaimDecodeError> for AppError {
    fn from(value: ClaimDecodeError) -> Self {
        Self::Token(value.0)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Token(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = self.to_string();
        let error = match &self {
            AppError::Unauthorized(_) => "unauthorized",
            AppError::BadRequest(_) => "bad_request",
            AppError::Configuration(_) => "configuration",
            AppError::Token(_) => "token",
            AppError::Internal(_) => "internal",
        };

        let payload = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(payload)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}
