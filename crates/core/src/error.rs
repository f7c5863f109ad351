//! Domain error types.
//!
//! Every rule in this crate fails with a `DomainError`. The API layer maps
//! them onto `AppError` so callers see one taxonomy.

use rust_decimal::Decimal;
use thiserror::Error;

use khata_shared::AppError;

use crate::tenancy::AdminAction;

/// Errors raised by domain rules before any backend call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The caller has no profile, or the profile has no organization.
    #[error("No organization found for the current user; cannot {action}")]
    MissingOrganization {
        /// What the caller tried to do.
        action: &'static str,
    },

    /// The caller is not an admin of their organization.
    #[error("Only admins may {0}")]
    AdminRequired(AdminAction),

    /// A required text field is blank.
    #[error("{field} is required")]
    Required {
        /// Field name.
        field: &'static str,
    },

    /// Transaction amounts must be strictly positive.
    #[error("Amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    /// Recording a return would push returned bags past given bags.
    #[error("Cannot return {requested} bags; only {outstanding} are outstanding")]
    ReturnExceedsOutstanding {
        /// Bags the caller tried to return.
        requested: u32,
        /// Bags still with the farmer.
        outstanding: u32,
    },

    /// A stored value does not fit the domain type.
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl DomainError {
    /// Shorthand for [`DomainError::InvalidField`].
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::MissingOrganization { .. } => Self::MissingOrganization(err.to_string()),
            DomainError::AdminRequired(_) => Self::Forbidden(err.to_string()),
            DomainError::ReturnExceedsOutstanding { .. } => Self::BusinessRule(err.to_string()),
            DomainError::Required { .. }
            | DomainError::NonPositiveAmount(_)
            | DomainError::InvalidField { .. } => Self::Validation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_missing_organization_maps_to_precondition() {
        let err: AppError = DomainError::MissingOrganization {
            action: "record a transaction",
        }
        .into();
        assert_eq!(err.status_code(), 412);
        assert_eq!(
            err.to_string(),
            "Missing organization: No organization found for the current user; cannot record a transaction"
        );
    }

    #[test]
    fn test_admin_required_maps_to_forbidden() {
        let err: AppError = DomainError::AdminRequired(AdminAction::DeleteFarmer).into();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_validation_errors() {
        let err: AppError = DomainError::NonPositiveAmount(dec!(-5)).into();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err: AppError = DomainError::Required { field: "name" }.into();
        assert_eq!(err.to_string(), "Validation error: name is required");
    }

    #[test]
    fn test_return_overflow_is_business_rule() {
        let err: AppError = DomainError::ReturnExceedsOutstanding {
            requested: 5,
            outstanding: 2,
        }
        .into();
        assert_eq!(err.status_code(), 422);
    }
}
