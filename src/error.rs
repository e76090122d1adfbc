use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tokio_postgres::error::SqlState;

use crate::models::session::Session;

/// The application's error type.
///
/// Every variant maps to a stable snake_case `code` so clients can branch on
/// failures without parsing messages.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A referenced entity is absent.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The actor lacks rights over the target.
    #[error("Unauthorized")]
    Unauthorized,

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The coach is inactive or absent.
    #[error("Coach not available")]
    CoachUnavailable,

    /// The package purchase is not in `active` status.
    #[error("Package is not active")]
    PackageNotActive,

    /// The package purchase has no sessions remaining.
    #[error("No sessions remaining in package")]
    PackageDepleted,

    /// The package purchase is past its expiry date.
    #[error("Package has expired")]
    PackageExpired,

    /// The requested time slot overlaps an existing scheduled session.
    /// Carries the conflicting session so callers can report it.
    #[error("Time slot is already booked")]
    SlotConflict(Box<Session>),

    /// The operation is not valid for the session's current status.
    #[error("{0}")]
    InvalidTransition(&'static str),

    /// A transaction lost a serialization conflict twice in a row.
    #[error("Temporary scheduling conflict, please retry")]
    Transient,

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// The stable error code reported to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) | AppError::Pool(_) | AppError::Internal(_) => "internal",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized => "unauthorized",
            AppError::Validation(_) => "validation",
            AppError::CoachUnavailable => "coach_unavailable",
            AppError::PackageNotActive => "not_active",
            AppError::PackageDepleted => "depleted",
            AppError::PackageExpired => "expired",
            AppError::SlotConflict(_) => "slot_conflict",
            AppError::InvalidTransition(_) => "invalid_transition",
            AppError::Transient => "transient",
        }
    }

    /// Whether this error is a store-level serialization conflict that may
    /// succeed on retry (SQLSTATE 40001 or 40P01).
    pub fn is_serialization_conflict(&self) -> bool {
        match self {
            AppError::Database(e) => e.code().is_some_and(|c| {
                *c == SqlState::T_R_SERIALIZATION_FAILURE || *c == SqlState::T_R_DEADLOCK_DETECTED
            }),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();

        let (status, body) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_body("Database error", code),
                )
            }

            AppError::Pool(ref e) => {
                tracing::error!("Pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_body("Database error", code),
                )
            }

            AppError::NotFound(entity) => {
                tracing::debug!("{} not found", entity);
                (
                    StatusCode::NOT_FOUND,
                    error_body(&format!("{} not found", entity), code),
                )
            }

            AppError::Unauthorized => {
                tracing::warn!("Authorization failed");
                (StatusCode::FORBIDDEN, error_body("Unauthorized", code))
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, error_body(msg, code))
            }

            AppError::CoachUnavailable => {
                tracing::debug!("Coach not available");
                (StatusCode::BAD_REQUEST, error_body("Coach not available", code))
            }

            AppError::PackageNotActive => (
                StatusCode::BAD_REQUEST,
                error_body("Package is not active", code),
            ),

            AppError::PackageDepleted => (
                StatusCode::BAD_REQUEST,
                error_body("No sessions remaining in package", code),
            ),

            AppError::PackageExpired => (
                StatusCode::BAD_REQUEST,
                error_body("Package has expired", code),
            ),

            AppError::SlotConflict(ref conflicting) => {
                tracing::debug!(
                    "Slot conflict with session {} ({} {}-{})",
                    conflicting.id,
                    conflicting.session_date,
                    conflicting.start_time.format("%H:%M"),
                    conflicting.end_time.format("%H:%M"),
                );
                let body = sonic_rs::to_string(&sonic_rs::json!({
                    "error": "Time slot is already booked",
                    "code": code,
                    "conflicting_session": conflicting.payload(),
                }))
                .unwrap_or_else(|_| r#"{"error":"Time slot is already booked","code":"slot_conflict"}"#.to_string());
                (StatusCode::CONFLICT, body)
            }

            AppError::InvalidTransition(msg) => {
                tracing::debug!("Invalid transition: {}", msg);
                (StatusCode::BAD_REQUEST, error_body(msg, code))
            }

            AppError::Transient => {
                tracing::warn!("Transaction retry exhausted");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    error_body("Temporary scheduling conflict, please retry", code),
                )
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_body("Internal server error", code),
                )
            }
        };

        (status, body).into_response()
    }
}

fn error_body(message: &str, code: &str) -> String {
    sonic_rs::to_string(&sonic_rs::json!({
        "error": message,
        "code": code,
    }))
    .unwrap_or_else(|_| r#"{"error":"Internal server error","code":"internal"}"#.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(AppError::NotFound("Session").code(), "not_found");
        assert_eq!(AppError::Unauthorized.code(), "unauthorized");
        assert_eq!(AppError::PackageDepleted.code(), "depleted");
        assert_eq!(AppError::PackageExpired.code(), "expired");
        assert_eq!(AppError::PackageNotActive.code(), "not_active");
        assert_eq!(AppError::CoachUnavailable.code(), "coach_unavailable");
        assert_eq!(
            AppError::InvalidTransition("Can only cancel scheduled sessions").code(),
            "invalid_transition"
        );
        assert_eq!(AppError::Transient.code(), "transient");
    }

    #[test]
    fn not_found_message_names_the_entity() {
        let err = AppError::NotFound("Package purchase");
        assert_eq!(err.to_string(), "Package purchase not found");
    }
}
