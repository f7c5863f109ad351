//! Transaction routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};

use khata_core::cache::QueryName;
use khata_core::ledger::{MonthlyTotals, NewTransaction, Transaction, TransactionFilter, monthly_totals};
use khata_core::sync::{ChangeKind, Resource};
use khata_db::TransactionRepository;

use super::cached;
use crate::{AppState, error::ApiError, middleware::AuthSession};

/// Creates the transaction routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions).post(record_transaction))
        .route("/transactions/monthly", get(monthly))
}

/// GET `/transactions?tab=given&search=kumar` - Newest first.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthSession,
    Query(filter): Query<TransactionFilter>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let scope = auth.scope("list transactions")?;
    let repo = TransactionRepository::new(Arc::clone(&state.db));
    let all = cached(&state, scope.org_id, QueryName::Transactions, || repo.list(&scope)).await?;

    Ok(Json(
        all.iter().filter(|t| filter.matches(t)).cloned().collect(),
    ))
}

/// POST `/transactions` - Record a transaction and move the farmer's balance.
async fn record_transaction(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(payload): Json<NewTransaction>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let scope = auth.scope("record a transaction")?;
    let txn = TransactionRepository::new(Arc::clone(&state.db))
        .record(&scope, &payload)
        .await?;

    // The balance moved too.
    state.after_write(scope.org_id, Resource::Transactions, ChangeKind::Insert);
    state.after_write(scope.org_id, Resource::Farmers, ChangeKind::Update);
    Ok((StatusCode::CREATED, Json(txn)))
}

/// GET `/transactions/monthly` - Given and received per calendar month.
async fn monthly(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<Vec<MonthlyTotals>>, ApiError> {
    let scope = auth.scope("view monthly totals")?;
    let repo = TransactionRepository::new(Arc::clone(&state.db));
    let all = cached(&state, scope.org_id, QueryName::Transactions, || repo.list(&scope)).await?;

    Ok(Json(monthly_totals(&all)))
}
