//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions mirroring the hosted schema
//! - Repositories that run every call inside the caller's RLS context
//! - The Postgres `LISTEN` realtime transport
//! - The spreadsheet bill client

pub mod convert;
pub mod entities;
pub mod realtime;
pub mod repositories;
pub mod rls;
pub mod sheets;

pub use realtime::PgNotifyTransport;
pub use repositories::{
    BillRepository, DashboardRepository, FarmerRepository, InventoryRepository,
    NotificationLogRepository, OrganizationRepository, ProfileRepository, RepositoryError,
    TransactionRepository,
};
pub use rls::{RlsConnection, RlsExt};
pub use sheets::{SheetBillClient, SheetError};

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use khata_shared::config::DatabaseConfig;

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    Database::connect(options).await
}
