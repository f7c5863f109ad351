//! Callable functions.
//!
//! These keep the response shape of the hosted functions they replace:
//! failures are `500 {success: false, error}` rather than the usual error
//! body.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info};

use khata_core::notification::{MessageReceipt, WhatsAppMessage};
use khata_db::NotificationLogRepository;

use crate::{AppState, middleware::AuthSession};

/// Creates the function routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/functions/send-whatsapp", post(send_whatsapp))
}

/// POST `/functions/send-whatsapp` - Log an outbound message.
///
/// No provider is called; the message is recorded with status `sent`.
async fn send_whatsapp(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(payload): Json<WhatsAppMessage>,
) -> Response {
    info!(
        user_id = %auth.session().user_id(),
        phone = %payload.phone,
        bill_id = ?payload.bill_id,
        "Sending WhatsApp message"
    );

    let now = Utc::now();
    match NotificationLogRepository::new(Arc::clone(&state.db))
        .record(&payload, now)
        .await
    {
        Ok(_) => (StatusCode::OK, Json(MessageReceipt::queued(now))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to send WhatsApp message");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
