//! Application-wide error types.
//!
//! Every failure a handler can surface ends up as an [`AppError`]. Client
//! errors carry a message safe to show in the UI; backend errors keep their
//! detail for the log and show a generic line instead.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Shown in place of backend error details.
pub const GENERIC_FAILURE: &str = "An error occurred";

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// The caller may not perform the action (e.g. a member deleting a farmer).
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Record missing, or outside the caller's organization.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or incomplete input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The caller's profile carries no organization, so nothing can be scoped.
    #[error("Missing organization: {0}")]
    MissingOrganization(String),

    /// Input is well formed but breaks a bookkeeping rule, such as returning
    /// more bags than are out.
    #[error("{0}")]
    BusinessRule(String),

    /// Database read or write failed.
    #[error("Database error: {0}")]
    Database(String),

    /// The spreadsheet endpoint failed or was unreachable.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Anything else, including rows that violate domain invariants.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::MissingOrganization(_) => 412,
            Self::BusinessRule(_) => 422,
            Self::ExternalService(_) => 502,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Whether the error came from a backend read or write rather than the caller.
    #[must_use]
    pub const fn is_server_side(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::ExternalService(_) | Self::Internal(_)
        )
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::MissingOrganization(_) => "MISSING_ORGANIZATION",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Database(_) => "DATABASE_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The message the caller sees.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.is_server_side() {
            GENERIC_FAILURE.to_string()
        } else {
            self.to_string()
        }
    }
}
