//! Dashboard data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{MonthlyTotals, Transaction};

/// Headline counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Number of farmers.
    pub total_farmers: u64,
    /// Sum of stored farmer balances.
    pub pending_amount: Decimal,
    /// Bags still out: sum of `given - returned`.
    pub active_bags: i64,
    /// Transactions dated in the current calendar month.
    pub monthly_transactions: u64,
}

/// Counters plus the activity panels.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardOverview {
    /// Headline counters.
    pub stats: DashboardStats,
    /// Latest transactions.
    pub recent_transactions: Vec<Transaction>,
    /// Given/received per month.
    pub monthly: Vec<MonthlyTotals>,
}
