//! Ledger domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use khata_shared::types::{FarmerId, OrganizationId, TransactionId};

use crate::error::DomainError;
use crate::search::matches_any;

use super::validation::validate_amount;

/// Direction of a money movement, seen from the vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Vendor paid the farmer (advance, loan). Increases what the farmer owes.
    Given,
    /// Farmer paid the vendor. Decreases what the farmer owes.
    Received,
}

impl TransactionType {
    /// Returns the value stored in the `type` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::Received => "Received",
        }
    }

    /// Applies the direction to an amount.
    #[must_use]
    pub fn sign(self, amount: Decimal) -> Decimal {
        match self {
            Self::Given => amount,
            Self::Received => -amount,
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Given" => Ok(Self::Given),
            "Received" => Ok(Self::Received),
            other => Err(DomainError::invalid(
                "type",
                format!("unknown transaction type '{other}'"),
            )),
        }
    }
}

/// A recorded transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// Owning organization.
    pub org_id: OrganizationId,
    /// Counterparty.
    pub farmer_id: FarmerId,
    /// Counterparty name, when loaded with the farmer.
    pub farmer_name: Option<String>,
    /// Direction.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Positive amount.
    pub amount: Decimal,
    /// Free-text note.
    pub note: Option<String>,
    /// Business date of the movement.
    pub trans_date: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Amount with the direction applied.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.kind.sign(self.amount)
    }
}

/// Input for recording a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTransaction {
    /// Counterparty.
    pub farmer_id: FarmerId,
    /// Direction.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Positive amount.
    pub amount: Decimal,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
    /// Business date. Defaults to the time of recording.
    #[serde(default)]
    pub trans_date: Option<DateTime<Utc>>,
}

impl NewTransaction {
    /// Validates the amount, trims the note, and fills in the date.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NonPositiveAmount` for zero or negative amounts.
    pub fn prepare(&self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        validate_amount(self.amount)?;
        Ok(Self {
            farmer_id: self.farmer_id,
            kind: self.kind,
            amount: self.amount,
            note: self
                .note
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(ToString::to_string),
            trans_date: Some(self.trans_date.unwrap_or(now)),
        })
    }

    /// Change this transaction makes to the farmer's balance.
    #[must_use]
    pub fn balance_delta(&self) -> Decimal {
        self.kind.sign(self.amount)
    }
}

/// Tabs of the transaction list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionTab {
    /// Everything.
    #[default]
    All,
    /// Only money given.
    Given,
    /// Only money received.
    Received,
}

impl TransactionTab {
    /// Whether a transaction of `kind` shows on this tab.
    #[must_use]
    pub const fn admits(self, kind: TransactionType) -> bool {
        matches!(
            (self, kind),
            (Self::All, _)
                | (Self::Given, TransactionType::Given)
                | (Self::Received, TransactionType::Received)
        )
    }
}

/// Tab plus free-text search over farmer name, note, and amount.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionFilter {
    /// Selected tab.
    #[serde(default)]
    pub tab: TransactionTab,
    /// Search term.
    #[serde(default)]
    pub search: Option<String>,
}

impl TransactionFilter {
    /// Whether a transaction passes the filter.
    #[must_use]
    pub fn matches(&self, txn: &Transaction) -> bool {
        if !self.tab.admits(txn.kind) {
            return false;
        }
        let Some(term) = self.search.as_deref() else {
            return true;
        };
        let amount = txn.amount.to_string();
        matches_any(
            term,
            [
                txn.farmer_name.as_deref().unwrap_or_default(),
                txn.note.as_deref().unwrap_or_default(),
                amount.as_str(),
            ],
        )
    }

    /// Applies the filter, keeping order.
    #[must_use]
    pub fn apply(&self, transactions: Vec<Transaction>) -> Vec<Transaction> {
        transactions.into_iter().filter(|t| self.matches(t)).collect()
    }
}
