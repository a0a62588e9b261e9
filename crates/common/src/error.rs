//! Error types for tipline.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    /// No report exists for the presented ticket.
    ///
    /// Renders identically to [`AppError::InvalidCredential`] so a response
    /// never confirms whether a ticket exists.
    #[error("Report not found")]
    ReportNotFound,

    /// The presented access code does not match the stored hash.
    #[error("Invalid access code")]
    InvalidCredential,

    /// No access code was presented at all.
    #[error("Missing access code")]
    MissingCredential,

    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested status change is not a legal transition.
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Rate limited")]
    RateLimited,

    // === Internal Errors ===
    /// Freshly minted ticket collided with an existing one. Retried by the
    /// report service; never surfaced to a client.
    #[error("Duplicate ticket")]
    DuplicateTicket,

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::ReportNotFound | Self::InvalidCredential => StatusCode::NOT_FOUND,
            Self::MissingCredential => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidTransition(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,

            // 5xx Server Errors
            Self::DuplicateTicket
            | Self::Database(_)
            | Self::Config(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses.
    ///
    /// Unknown ticket and wrong code intentionally share a code: an attacker
    /// probing tickets learns nothing from the response body.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ReportNotFound | Self::InvalidCredential => "REPORT_NOT_FOUND",
            Self::MissingCredential => "MISSING_CODE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::RateLimited => "RATE_LIMITED",
            Self::DuplicateTicket | Self::Internal(_) => "INTERNAL_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Returns the message exposed in API responses.
    ///
    /// Authorization failures use a fixed message rather than the Display
    /// impl so the two variants stay byte-identical on the wire.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::ReportNotFound | Self::InvalidCredential => {
                "No report matches that ticket and access code".to_string()
            }
            Self::DuplicateTicket => "Internal error".to_string(),
            other => other.to_string(),
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log server errors
        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.public_message(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_and_invalid_credential_are_indistinguishable() {
        let not_found = AppError::ReportNotFound;
        let bad_code = AppError::InvalidCredential;

        assert_eq!(not_found.status_code(), bad_code.status_code());
        assert_eq!(not_found.error_code(), bad_code.error_code());
        assert_eq!(not_found.public_message(), bad_code.public_message());
    }

    #[test]
    fn test_missing_credential_is_distinct_client_error() {
        let err = AppError::MissingCredential;

        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.error_code(), "MISSING_CODE");
    }

    #[test]
    fn test_duplicate_ticket_never_leaks_detail() {
        let err = AppError::DuplicateTicket;

        assert!(err.is_server_error());
        assert_eq!(err.public_message(), "Internal error");
    }
}
