//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for farmers, transactions, inventory, bills, and settings
//! - Authentication middleware that resolves the caller's organization
//! - Server-Sent Event live views backed by the query cache
//! - The JSON error response type

pub mod error;
pub mod middleware;
pub mod routes;


use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use khata_core::cache::QueryCache;
use khata_core::sync::{ChangeKind, ChangeNotification, InMemoryTransport, Resource, SyncContext, written_by};
use khata_db::SheetBillClient;
use khata_shared::types::OrganizationId;
use khata_shared::{BillBackend, JwtService};

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Query cache and realtime transport.
    pub sync: SyncContext,
    /// In-process transport the API publishes its own writes to, when
    /// realtime runs in local mode.
    pub local_hub: Option<Arc<InMemoryTransport>>,
    /// Active bill store.
    pub bill_backend: BillBackend,
    /// Spreadsheet bill endpoint (optional).
    pub sheets: Option<Arc<SheetBillClient>>,
}

impl AppState {
    /// The shared query cache.
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        self.sync.cache()
    }

    /// Marks every result set a write to `resource` affects as stale and,
    /// in local realtime mode, notifies open live views.
    pub fn after_write(&self, org: OrganizationId, resource: Resource, kind: ChangeKind) {
        self.cache().invalidate_many(org, &written_by(resource));
        if let Some(hub) = &self.local_hub {
            let delivered = hub.publish(&ChangeNotification::new(resource, kind));
            debug!(table = %resource, kind = kind.as_str(), delivered, "Published local change");
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sync", &self.sync)
            .field("bill_backend", &self.bill_backend)
            .field("local_realtime", &self.local_hub.is_some())
            .field("sheets", &self.sheets.is_some())
            .finish_non_exhaustive()
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
