//! Bill routes.
//!
//! Bills live either in the `bills` table or on the spreadsheet endpoint,
//! depending on `billing.backend`. Both stores are served from the same
//! paths; the request and response bodies follow the active store.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use khata_core::billing::{Bill, BillQuote, NewBill, NewSheetBill, SheetBill};
use khata_core::cache::QueryName;
use khata_core::sync::{ChangeKind, Resource};
use khata_db::{BillRepository, SheetBillClient, SheetError};
use khata_shared::{AppError, BillBackend};

use super::{SearchQuery, cached};
use crate::{AppState, error::ApiError, middleware::AuthSession};

/// Creates the bill routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bills", get(list_bills).post(create_bill))
        .route("/bills/quote", post(quote))
}

/// Bills from the active store.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BillList {
    /// Rows of the `bills` table.
    Relational(Vec<Bill>),
    /// Rows of the bill sheet.
    Sheet(Vec<SheetBill>),
}

/// A bill just written to the active store.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CreatedBill {
    /// Inserted row.
    Relational(Bill),
    /// Appended sheet record and the endpoint's reply.
    Sheet {
        /// Record as sent.
        bill: SheetBill,
        /// Text returned by the endpoint.
        reply: String,
    },
}

/// Response for `POST /bills/quote`.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    /// `price_per_bag * quantity`.
    pub subtotal: Decimal,
    /// Cess on the subtotal.
    pub cess: Decimal,
    /// Amount due.
    pub total: Decimal,
}

fn sheet_client(state: &AppState) -> Result<Arc<SheetBillClient>, ApiError> {
    state
        .sheets
        .clone()
        .ok_or_else(|| SheetError::NotConfigured.into())
}

fn parse_body<T: serde::de::DeserializeOwned>(payload: Value) -> Result<T, ApiError> {
    serde_json::from_value(payload).map_err(|e| AppError::Validation(e.to_string()).into())
}

/// GET `/bills` - Bills from the active store, filtered by `search`.
async fn list_bills(
    State(state): State<AppState>,
    auth: AuthSession,
    Query(query): Query<SearchQuery>,
) -> Result<Json<BillList>, ApiError> {
    let scope = auth.scope("list bills")?;

    let list = match state.bill_backend {
        BillBackend::Relational => {
            let repo = BillRepository::new(Arc::clone(&state.db));
            let bills = cached(&state, scope.org_id, QueryName::Bills, || repo.list(&scope)).await?;
            BillList::Relational(
                bills
                    .iter()
                    .filter(|b| b.matches_search(query.term()))
                    .cloned()
                    .collect(),
            )
        }
        BillBackend::Sheet => {
            let client = sheet_client(&state)?;
            let bills =
                cached(&state, scope.org_id, QueryName::SheetBills, || client.list()).await?;
            BillList::Sheet(
                bills
                    .iter()
                    .filter(|b| b.matches_search(query.term()))
                    .cloned()
                    .collect(),
            )
        }
    };

    Ok(Json(list))
}

/// POST `/bills` - Store a bill in the active store.
async fn create_bill(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<CreatedBill>), ApiError> {
    let scope = auth.scope("create a bill")?;

    let created = match state.bill_backend {
        BillBackend::Relational => {
            let input: NewBill = parse_body(payload)?;
            let bill = BillRepository::new(Arc::clone(&state.db))
                .create(&scope, &input)
                .await?;
            state.after_write(scope.org_id, Resource::Bills, ChangeKind::Insert);
            CreatedBill::Relational(bill)
        }
        BillBackend::Sheet => {
            let input: NewSheetBill = parse_body(payload)?;
            let bill = input.into_record(Utc::now())?;
            let reply = sheet_client(&state)?.append(&bill).await?;
            state
                .cache()
                .invalidate_many(scope.org_id, &[QueryName::SheetBills]);
            info!(org_id = %scope.org_id, bill_id = %bill.bill_id, "Sheet bill created");
            CreatedBill::Sheet { bill, reply }
        }
    };

    Ok((StatusCode::CREATED, Json(created)))
}

/// POST `/bills/quote` - Price a bill before saving it.
async fn quote(Json(payload): Json<BillQuote>) -> Result<Json<QuoteResponse>, ApiError> {
    payload.validate()?;
    Ok(Json(QuoteResponse {
        subtotal: payload.subtotal(),
        cess: payload.cess(),
        total: payload.total(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_quote_adds_cess() {
        let Json(priced) = quote(Json(BillQuote {
            price_per_bag: dec!(1200),
            quantity: 10,
            cess_rate: dec!(5),
        }))
        .await
        .unwrap();

        assert_eq!(priced.subtotal, dec!(12000));
        assert_eq!(priced.cess, dec!(600));
        assert_eq!(priced.total, dec!(12600));
    }

    #[tokio::test]
    async fn test_quote_rejects_negative_price() {
        let err = quote(Json(BillQuote {
            price_per_bag: dec!(-1),
            quantity: 1,
            cess_rate: dec!(5),
        }))
        .await
        .unwrap_err();

        assert_eq!(err.inner().status_code(), 400);
    }

    #[test]
    fn test_sheet_body_shape() {
        let input: NewSheetBill = parse_body(serde_json::json!({
            "customer": "Ramesh Kumar",
            "total": "1250.50"
        }))
        .unwrap();
        assert_eq!(input.customer, "Ramesh Kumar");
        assert!(parse_body::<NewBill>(serde_json::json!({"content": {}})).is_err());
    }
}
