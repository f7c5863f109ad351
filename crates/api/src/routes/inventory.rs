//! Inventory routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;
use validator::Validate;

use khata_core::cache::QueryName;
use khata_core::inventory::{InventoryItem, InventorySummary, InventoryUpdate, NewInventoryItem};
use khata_core::sync::{ChangeKind, Resource};
use khata_db::InventoryRepository;
use khata_shared::types::InventoryItemId;

use super::{SearchQuery, cached};
use crate::{AppState, error::ApiError, middleware::AuthSession};

/// Creates the inventory routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list_inventory).post(create_item))
        .route("/inventory/summary", get(summary))
        .route("/inventory/{item_id}", put(update_item))
        .route("/inventory/{item_id}/returns", post(record_return))
}

/// Request body for recording returned bags.
#[derive(Debug, Deserialize, Validate)]
pub struct ReturnRequest {
    /// Bags coming back.
    #[validate(range(min = 1))]
    pub bags: u32,
}

/// GET `/inventory` - Items with farmer names.
async fn list_inventory(
    State(state): State<AppState>,
    auth: AuthSession,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let scope = auth.scope("list inventory")?;
    let repo = InventoryRepository::new(Arc::clone(&state.db));
    let items = cached(&state, scope.org_id, QueryName::Inventory, || repo.list(&scope)).await?;

    Ok(Json(
        items
            .iter()
            .filter(|i| i.matches_search(query.term()))
            .cloned()
            .collect(),
    ))
}

/// GET `/inventory/summary` - Totals and return percentage.
async fn summary(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<InventorySummary>, ApiError> {
    let scope = auth.scope("summarize inventory")?;
    let repo = InventoryRepository::new(Arc::clone(&state.db));
    let items = cached(&state, scope.org_id, QueryName::Inventory, || repo.list(&scope)).await?;

    Ok(Json(InventorySummary::from_items(items.iter())))
}

/// POST `/inventory` - Lend bags to a farmer.
async fn create_item(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(payload): Json<NewInventoryItem>,
) -> Result<(StatusCode, Json<InventoryItem>), ApiError> {
    let scope = auth.scope("add inventory")?;
    let item = InventoryRepository::new(Arc::clone(&state.db))
        .create(&scope, &payload)
        .await?;

    state.after_write(scope.org_id, Resource::Inventory, ChangeKind::Insert);
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT `/inventory/{item_id}` - Partial update.
async fn update_item(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(item_id): Path<InventoryItemId>,
    Json(payload): Json<InventoryUpdate>,
) -> Result<Json<InventoryItem>, ApiError> {
    let scope = auth.scope("update inventory")?;
    let item = InventoryRepository::new(Arc::clone(&state.db))
        .update(&scope, item_id, &payload)
        .await?;

    state.after_write(scope.org_id, Resource::Inventory, ChangeKind::Update);
    Ok(Json(item))
}

/// POST `/inventory/{item_id}/returns` - Record bags coming back.
async fn record_return(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(item_id): Path<InventoryItemId>,
    Json(payload): Json<ReturnRequest>,
) -> Result<Json<InventoryItem>, ApiError> {
    payload.validate()?;
    let scope = auth.scope("record returned bags")?;
    let item = InventoryRepository::new(Arc::clone(&state.db))
        .record_return(&scope, item_id, payload.bags)
        .await?;

    state.after_write(scope.org_id, Resource::Inventory, ChangeKind::Update);
    Ok(Json(item))
}
