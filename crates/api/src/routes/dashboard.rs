//! Dashboard routes.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use chrono::Utc;

use khata_core::cache::QueryName;
use khata_core::dashboard::{DashboardOverview, DashboardStats};
use khata_db::DashboardRepository;

use super::cached;
use crate::{AppState, error::ApiError, middleware::AuthSession};

/// Creates the dashboard routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(stats))
        .route("/dashboard/overview", get(overview))
}

/// GET `/dashboard` - Farmer count, pending amount, active bags, and this
/// month's transaction count.
async fn stats(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<DashboardStats>, ApiError> {
    let scope = auth.scope("view the dashboard")?;
    let repo = DashboardRepository::new(Arc::clone(&state.db));
    let stats = cached(&state, scope.org_id, QueryName::DashboardStats, || {
        repo.stats(&scope, Utc::now())
    })
    .await?;

    Ok(Json((*stats).clone()))
}

/// GET `/dashboard/overview` - Stats plus recent activity and monthly totals.
async fn overview(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<DashboardOverview>, ApiError> {
    let scope = auth.scope("view the dashboard")?;
    let overview = DashboardRepository::new(Arc::clone(&state.db))
        .overview(&scope, Utc::now())
        .await?;
    Ok(Json(overview))
}
