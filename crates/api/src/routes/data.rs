//! Data export and import. Admin only.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use khata_core::farmer::{Farmer, NewFarmer};
use khata_core::inventory::InventoryItem;
use khata_core::ledger::Transaction;
use khata_core::sync::{ChangeKind, Resource};
use khata_core::tenancy::AdminAction;
use khata_db::{FarmerRepository, InventoryRepository, TransactionRepository};
use khata_shared::types::OrganizationId;

use crate::{AppState, error::ApiError, middleware::AuthSession};

/// Creates the data management routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/data/export", get(export))
        .route("/data/import", post(import))
}

/// A snapshot of an organization's records.
#[derive(Debug, Serialize)]
pub struct DataExport {
    /// Exported organization.
    pub org_id: OrganizationId,
    /// When the snapshot was taken.
    pub exported_at: DateTime<Utc>,
    /// Farmers.
    pub farmers: Vec<Farmer>,
    /// Transactions.
    pub transactions: Vec<Transaction>,
    /// Inventory.
    pub inventory: Vec<InventoryItem>,
}

/// Request body for a bulk farmer import.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    /// Farmers to create.
    pub farmers: Vec<NewFarmer>,
}

/// Response for a bulk farmer import.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    /// Number of farmers created.
    pub imported: usize,
    /// Created farmers.
    pub farmers: Vec<Farmer>,
}

/// GET `/data/export` - JSON snapshot of farmers, transactions, and inventory.
async fn export(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<DataExport>, ApiError> {
    let scope = auth.require_admin(AdminAction::ExportData)?;
    let db = Arc::clone(&state.db);

    let farmer_repo = FarmerRepository::new(Arc::clone(&db));
    let transaction_repo = TransactionRepository::new(Arc::clone(&db));
    let inventory_repo = InventoryRepository::new(db);

    let (farmers, transactions, inventory) = tokio::try_join!(
        farmer_repo.list(&scope),
        transaction_repo.list(&scope),
        inventory_repo.list(&scope),
    )?;

    info!(
        org_id = %scope.org_id,
        farmers = farmers.len(),
        transactions = transactions.len(),
        inventory = inventory.len(),
        "Data exported"
    );

    Ok(Json(DataExport {
        org_id: scope.org_id,
        exported_at: Utc::now(),
        farmers,
        transactions,
        inventory,
    }))
}

/// POST `/data/import` - Bulk farmer creation. All or nothing.
async fn import(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(payload): Json<ImportRequest>,
) -> Result<(StatusCode, Json<ImportResponse>), ApiError> {
    let scope = auth.require_admin(AdminAction::ImportData)?;
    let farmers = FarmerRepository::new(Arc::clone(&state.db))
        .import(&scope, &payload.farmers)
        .await?;

    info!(org_id = %scope.org_id, imported = farmers.len(), "Farmers imported");
    if !farmers.is_empty() {
        state.after_write(scope.org_id, Resource::Farmers, ChangeKind::Insert);
    }

    Ok((
        StatusCode::CREATED,
        Json(ImportResponse {
            imported: farmers.len(),
            farmers,
        }),
    ))
}
