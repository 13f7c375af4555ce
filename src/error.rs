use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Missing fields")]
    MissingFields,
    #[error("Missing refresh token")]
    MissingToken,
    #[error("User exists")]
    DuplicateUsername,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    #[error("Refresh token revoked")]
    RefreshTokenRevoked,
    #[error("Refresh token expired")]
    RefreshTokenExpired,
    #[error("Invalid user")]
    UserMissing,
    #[error("No token")]
    NoToken,
    #[error("Bad token")]
    MalformedHeader,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Not found")]
    NotFound,
    #[error("Internal server error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_)
            | Self::MissingFields
            | Self::MissingToken
            | Self::DuplicateUsername
            | Self::InvalidCredentials => StatusCode::BAD_REQUEST,
            Self::InvalidRefreshToken
            | Self::RefreshTokenRevoked
            | Self::RefreshTokenExpired
            | Self::UserMissing
            | Self::NoToken
            | Self::MalformedHeader
            | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "Internal server error".to_string()
            }
            Self::Internal => {
                tracing::error!("Internal server error occurred");
                "Internal server error".to_string()
            }
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                msg.clone()
            }
            Self::NotFound => {
                tracing::debug!("Resource not found");
                self.to_string()
            }
            other => {
                tracing::debug!(reason = %other, "Request rejected");
                other.to_string()
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
