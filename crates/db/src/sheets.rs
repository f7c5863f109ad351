//! Client for the spreadsheet-backed bill endpoint.
//!
//! The endpoint is a published script: `GET` returns every row of the bill
//! sheet, header first, and `POST` appends one record.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use khata_core::billing::SheetBill;
use khata_shared::AppError;

/// Errors talking to the spreadsheet endpoint.
#[derive(Debug, Error)]
pub enum SheetError {
    /// No endpoint URL is configured.
    #[error("spreadsheet endpoint is not configured")]
    NotConfigured,

    /// The request failed or the endpoint answered with a non-success status.
    #[error("spreadsheet request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<SheetError> for AppError {
    fn from(err: SheetError) -> Self {
        match err {
            SheetError::NotConfigured => Self::Internal(err.to_string()),
            SheetError::Http(_) => Self::ExternalService(err.to_string()),
        }
    }
}

/// `GET` body. The published script answers with the bare 2D array of the
/// sheet; some deployments wrap it as `{"data": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SheetRows {
    Bare(Vec<Vec<Value>>),
    Wrapped {
        #[serde(default)]
        data: Vec<Vec<Value>>,
    },
}

impl SheetRows {
    fn into_rows(self) -> Vec<Vec<Value>> {
        match self {
            Self::Bare(rows) | Self::Wrapped { data: rows } => rows,
        }
    }
}

/// Reads and appends bills on the spreadsheet endpoint.
#[derive(Debug, Clone)]
pub struct SheetBillClient {
    http: reqwest::Client,
    url: String,
}

impl SheetBillClient {
    /// Creates a client for `url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SheetError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches every bill. The header row is skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is not a success,
    /// or the body is not the expected JSON.
    pub async fn list(&self) -> Result<Vec<SheetBill>, SheetError> {
        let rows: SheetRows = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let bills = decode_rows(rows.into_rows());
        debug!(count = bills.len(), "Fetched sheet bills");
        Ok(bills)
    }

    /// Appends one bill and returns the endpoint's text reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the status is not a success.
    pub async fn append(&self, bill: &SheetBill) -> Result<String, SheetError> {
        let reply = self
            .http
            .post(&self.url)
            .json(bill)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        info!(bill_id = %bill.bill_id, "Sheet bill appended");
        Ok(reply)
    }
}

fn decode_rows(rows: Vec<Vec<Value>>) -> Vec<SheetBill> {
    rows.into_iter()
        .skip(1)
        .map(|row| {
            let cells: Vec<String> = row.into_iter().map(cell_text).collect();
            SheetBill::from_row(&cells)
        })
        .collect()
}

fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}
