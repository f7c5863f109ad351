//! API route definitions.

use std::future::Future;
use std::sync::Arc;

use axum::{Router, middleware};
use serde::Deserialize;

use khata_core::cache::{QueryKey, QueryName};
use khata_shared::types::OrganizationId;

use crate::{AppState, error::ApiError, middleware::auth::auth_middleware};

pub mod bills;
pub mod dashboard;
pub mod data;
pub mod farmers;
pub mod functions;
pub mod health;
pub mod inventory;
pub mod live;
pub mod me;
pub mod settings;
pub mod transactions;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(me::routes())
        .merge(farmers::routes())
        .merge(transactions::routes())
        .merge(inventory::routes())
        .merge(bills::routes())
        .merge(dashboard::routes())
        .merge(settings::routes())
        .merge(data::routes())
        .merge(functions::routes())
        .merge(live::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

/// `?search=` on the list screens.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Case-insensitive search term.
    pub search: Option<String>,
}

impl SearchQuery {
    fn term(&self) -> &str {
        self.search.as_deref().unwrap_or_default()
    }
}

/// Serves a result set from the query cache, loading it on a miss.
async fn cached<T, E, F, Fut>(
    state: &AppState,
    org: OrganizationId,
    name: QueryName,
    fetch: F,
) -> Result<Arc<T>, ApiError>
where
    T: Send + Sync + 'static,
    E: Into<ApiError>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    state
        .cache()
        .get_or_fetch(QueryKey::new(org, name), fetch)
        .await
        .map_err(Into::into)
}
