//! Balance derivation and drift reporting.
//!
//! The stored `balance` column is writable on its own, so it can disagree
//! with the sum of the farmer's transactions. Drift is reported, never
//! corrected here.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use khata_shared::types::FarmerId;

use crate::ledger::Transaction;

use super::types::Farmer;

/// Sign of a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceDirection {
    /// The farmer owes the vendor.
    Owes,
    /// The vendor owes the farmer.
    Credit,
    /// Nothing outstanding.
    Settled,
}

impl BalanceDirection {
    /// Classifies a balance.
    #[must_use]
    pub fn of(balance: Decimal) -> Self {
        if balance > Decimal::ZERO {
            Self::Owes
        } else if balance < Decimal::ZERO {
            Self::Credit
        } else {
            Self::Settled
        }
    }
}

/// Sums signed transaction amounts: `Given` adds, `Received` subtracts.
#[must_use]
pub fn derived_balance<'a, I>(transactions: I) -> Decimal
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions
        .into_iter()
        .map(Transaction::signed_amount)
        .sum()
}

/// Stored versus derived balance for one farmer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceReport {
    /// Farmer ID.
    pub farmer_id: FarmerId,
    /// Farmer name.
    pub name: String,
    /// Value of the `balance` column.
    pub stored: Decimal,
    /// Sum of the farmer's transactions.
    pub derived: Decimal,
    /// `stored - derived`.
    pub drift: Decimal,
}

impl BalanceReport {
    /// Whether the two balances disagree.
    #[must_use]
    pub fn has_drift(&self) -> bool {
        !self.drift.is_zero()
    }
}

/// Builds one report per farmer, in the farmers' order.
#[must_use]
pub fn reconcile(farmers: &[Farmer], transactions: &[Transaction]) -> Vec<BalanceReport> {
    let mut derived: HashMap<FarmerId, Decimal> = HashMap::new();
    for txn in transactions {
        *derived.entry(txn.farmer_id).or_default() += txn.signed_amount();
    }

    farmers
        .iter()
        .map(|farmer| {
            let derived = derived.get(&farmer.id).copied().unwrap_or_default();
            BalanceReport {
                farmer_id: farmer.id,
                name: farmer.name.clone(),
                stored: farmer.balance,
                derived,
                drift: farmer.balance - derived,
            }
        })
        .collect()
}
