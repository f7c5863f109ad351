//! Farmer routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use tracing::info;

use khata_core::cache::QueryName;
use khata_core::farmer::{BalanceReport, Farmer, FarmerUpdate, NewFarmer};
use khata_core::sync::{ChangeKind, Resource};
use khata_core::tenancy::AdminAction;
use khata_db::FarmerRepository;
use khata_shared::types::FarmerId;

use super::{SearchQuery, cached};
use crate::{AppState, error::ApiError, middleware::AuthSession};

/// Creates the farmer routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/farmers", get(list_farmers).post(create_farmer))
        .route("/farmers/balance-report", get(balance_report))
        .route(
            "/farmers/{farmer_id}",
            get(get_farmer).put(update_farmer).delete(delete_farmer),
        )
}

/// GET `/farmers` - Farmers of the caller's organization, newest first.
async fn list_farmers(
    State(state): State<AppState>,
    auth: AuthSession,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Farmer>>, ApiError> {
    let scope = auth.scope("list farmers")?;
    let repo = FarmerRepository::new(Arc::clone(&state.db));
    let farmers = cached(&state, scope.org_id, QueryName::Farmers, || repo.list(&scope)).await?;

    Ok(Json(
        farmers
            .iter()
            .filter(|f| f.matches_search(query.term()))
            .cloned()
            .collect(),
    ))
}

/// POST `/farmers` - Add a farmer.
async fn create_farmer(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(payload): Json<NewFarmer>,
) -> Result<(StatusCode, Json<Farmer>), ApiError> {
    let scope = auth.scope("add a farmer")?;
    let farmer = FarmerRepository::new(Arc::clone(&state.db))
        .create(&scope, &payload)
        .await?;

    info!(org_id = %scope.org_id, farmer_id = %farmer.id, "Farmer created");
    state.after_write(scope.org_id, Resource::Farmers, ChangeKind::Insert);
    Ok((StatusCode::CREATED, Json(farmer)))
}

/// GET `/farmers/{farmer_id}` - One farmer.
async fn get_farmer(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(farmer_id): Path<FarmerId>,
) -> Result<Json<Farmer>, ApiError> {
    let scope = auth.scope("view a farmer")?;
    let farmer = FarmerRepository::new(Arc::clone(&state.db))
        .find(&scope, farmer_id)
        .await?;
    Ok(Json(farmer))
}

/// PUT `/farmers/{farmer_id}` - Partial update.
async fn update_farmer(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(farmer_id): Path<FarmerId>,
    Json(payload): Json<FarmerUpdate>,
) -> Result<Json<Farmer>, ApiError> {
    let scope = auth.scope("update a farmer")?;
    let farmer = FarmerRepository::new(Arc::clone(&state.db))
        .update(&scope, farmer_id, &payload)
        .await?;

    state.after_write(scope.org_id, Resource::Farmers, ChangeKind::Update);
    Ok(Json(farmer))
}

/// DELETE `/farmers/{farmer_id}` - Admin only.
async fn delete_farmer(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(farmer_id): Path<FarmerId>,
) -> Result<StatusCode, ApiError> {
    let scope = auth.require_admin(AdminAction::DeleteFarmer)?;
    FarmerRepository::new(Arc::clone(&state.db))
        .delete(&scope, farmer_id)
        .await?;

    info!(org_id = %scope.org_id, farmer_id = %farmer_id, "Farmer deleted");
    state.after_write(scope.org_id, Resource::Farmers, ChangeKind::Delete);
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/farmers/balance-report` - Stored versus derived balances.
async fn balance_report(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<Vec<BalanceReport>>, ApiError> {
    let scope = auth.scope("check farmer balances")?;
    let reports = FarmerRepository::new(Arc::clone(&state.db))
        .balance_report(&scope)
        .await?;
    Ok(Json(reports))
}
