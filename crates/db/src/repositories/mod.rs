//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every org-scoped call runs inside an RLS transaction opened for the caller
//! and additionally filters by the caller's organization.

pub mod bill;
pub mod dashboard;
pub mod farmer;
pub mod inventory;
pub mod notification_log;
pub mod organization;
pub mod profile;
pub mod transaction;


pub use bill::BillRepository;
pub use dashboard::DashboardRepository;
pub use farmer::FarmerRepository;
pub use inventory::InventoryRepository;
pub use notification_log::NotificationLogRepository;
pub use organization::OrganizationRepository;
pub use profile::ProfileRepository;
pub use transaction::TransactionRepository;

use sea_orm::DbErr;

use khata_core::DomainError;
use khata_shared::AppError;

use crate::convert::RowError;

/// Error types for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Record not found in the caller's organization.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity name.
        entity: &'static str,
        /// Requested identifier.
        id: String,
    },

    /// A stored row violates a domain invariant.
    #[error("Invalid row: {0}")]
    Row(#[from] RowError),

    /// Input rejected before touching the database.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl RepositoryError {
    pub(crate) fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { .. } => Self::NotFound(err.to_string()),
            RepositoryError::Row(e) => Self::Internal(e.to_string()),
            RepositoryError::Domain(e) => e.into(),
            RepositoryError::Database(e) => Self::Database(e.to_string()),
        }
    }
}
