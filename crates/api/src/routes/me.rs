//! The caller's own identity and organization.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use khata_core::tenancy::Profile;
use khata_shared::types::UserId;

use crate::{AppState, middleware::AuthSession};

/// Response for `GET /me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// Authenticated user.
    pub user_id: UserId,
    /// Email from the token, when present.
    pub email: Option<String>,
    /// Profile, absent until the user joins an organization.
    pub profile: Option<Profile>,
    /// Whether the caller may perform admin actions.
    pub is_admin: bool,
}

async fn me(auth: AuthSession) -> Json<MeResponse> {
    let session = auth.session();
    Json(MeResponse {
        user_id: session.user_id(),
        email: auth.claims().email.clone(),
        profile: session.profile().cloned(),
        is_admin: session.is_admin(),
    })
}

/// Creates the identity routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}
