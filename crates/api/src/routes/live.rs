//! Live screens over server-sent events.
//!
//! `GET /live/{screen}` mounts a [`LiveView`] for the caller's organization
//! and streams every state it passes through as a `state` event. The view
//! is dropped, and its channels closed, when the client disconnects.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Path, State},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use chrono::Utc;
use futures::{FutureExt, StreamExt, stream::BoxStream};
use serde::Serialize;
use tracing::{debug, warn};

use khata_core::cache::QueryState;
use khata_core::sync::{Fetcher, LiveView, Screen, SyncContext};
use khata_core::tenancy::TenantScope;
use khata_db::{
    BillRepository, DashboardRepository, FarmerRepository, InventoryRepository,
    TransactionRepository,
};
use khata_shared::AppError;

use crate::{AppState, error::ApiError, middleware::AuthSession};

const KEEP_ALIVE: Duration = Duration::from_secs(15);

type EventStream = BoxStream<'static, Result<Event, Infallible>>;

/// Creates the live routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/live/{screen}", get(live))
}

/// GET `/live/{screen}` - Stream a screen's result set as it changes.
async fn live(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(screen): Path<String>,
) -> Result<Response, ApiError> {
    let screen: Screen = screen.parse().map_err(AppError::NotFound)?;
    let scope = auth.scope("open a live screen")?;
    let db = Arc::clone(&state.db);

    let stream = match screen {
        Screen::Dashboard => {
            let repo = DashboardRepository::new(db);
            let fetch = fetcher(scope, move |scope| {
                let repo = repo.clone();
                async move { repo.stats(&scope, Utc::now()).await }
            });
            mount(&state.sync, scope, screen, fetch).await
        }
        Screen::Farmers => {
            let repo = FarmerRepository::new(db);
            let fetch = fetcher(scope, move |scope| {
                let repo = repo.clone();
                async move { repo.list(&scope).await }
            });
            mount(&state.sync, scope, screen, fetch).await
        }
        Screen::Transactions => {
            let repo = TransactionRepository::new(db);
            let fetch = fetcher(scope, move |scope| {
                let repo = repo.clone();
                async move { repo.list(&scope).await }
            });
            mount(&state.sync, scope, screen, fetch).await
        }
        Screen::Inventory => {
            let repo = InventoryRepository::new(db);
            let fetch = fetcher(scope, move |scope| {
                let repo = repo.clone();
                async move { repo.list(&scope).await }
            });
            mount(&state.sync, scope, screen, fetch).await
        }
        Screen::Bills => {
            let repo = BillRepository::new(db);
            let fetch = fetcher(scope, move |scope| {
                let repo = repo.clone();
                async move { repo.list(&scope).await }
            });
            mount(&state.sync, scope, screen, fetch).await
        }
    };

    Ok(Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE))
        .into_response())
}

/// Binds a repository call to the caller's scope.
fn fetcher<T, E, F, Fut>(scope: TenantScope, load: F) -> Fetcher<T>
where
    T: Send + 'static,
    E: Into<AppError> + 'static,
    F: Fn(TenantScope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Arc::new(move || {
        load(scope)
            .map(|result| -> Result<T, AppError> { result.map_err(Into::into) })
            .boxed()
    })
}

async fn mount<T>(
    ctx: &SyncContext,
    scope: TenantScope,
    screen: Screen,
    fetch: Fetcher<T>,
) -> EventStream
where
    T: Serialize + Send + Sync + 'static,
{
    let view = LiveView::mount(ctx, scope.org_id, screen, fetch).await;
    if !view.is_live() {
        debug!(%screen, org_id = %scope.org_id, "Live screen has no open channels");
    }

    let rx = view.state();
    futures::stream::unfold((view, rx, true), |(view, mut rx, first)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let event = state_event(&rx.borrow_and_update());
        Some((Ok(event), (view, rx, false)))
    })
    .boxed()
}

fn state_event<T: Serialize>(state: &QueryState<T>) -> Event {
    Event::default()
        .event("state")
        .json_data(state)
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to encode live state");
            Event::default().event("error").data("encoding failed")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_screen_is_not_found() {
        let err = ApiError::from(
            "ledger"
                .parse::<Screen>()
                .map_err(AppError::NotFound)
                .unwrap_err(),
        );
        assert_eq!(err.inner().status_code(), 404);
    }
}
