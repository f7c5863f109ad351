//! Organization settings routes.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use tracing::info;

use khata_core::cache::QueryName;
use khata_core::sync::{ChangeKind, Resource};
use khata_core::tenancy::{AdminAction, OrgSettings, Organization};
use khata_db::OrganizationRepository;

use super::cached;
use crate::{AppState, error::ApiError, middleware::AuthSession};

/// Creates the settings routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}

/// GET `/settings` - Any member may read.
async fn get_settings(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<Organization>, ApiError> {
    let scope = auth.scope("view organization settings")?;
    let repo = OrganizationRepository::new(Arc::clone(&state.db));
    let org = cached(&state, scope.org_id, QueryName::OrgSettings, || repo.find(&scope)).await?;

    Ok(Json((*org).clone()))
}

/// PUT `/settings` - Admin only. Replaces the whole settings document.
async fn update_settings(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(payload): Json<OrgSettings>,
) -> Result<Json<Organization>, ApiError> {
    let scope = auth.require_admin(AdminAction::UpdateSettings)?;
    let org = OrganizationRepository::new(Arc::clone(&state.db))
        .update_settings(&scope, &payload)
        .await?;

    info!(org_id = %scope.org_id, "Organization settings updated");
    state.after_write(scope.org_id, Resource::Organizations, ChangeKind::Update);
    Ok(Json(org))
}
