//! Monthly totals and recent activity for the dashboard.

use std::collections::BTreeMap;

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;

use super::types::{Transaction, TransactionType};

/// Given and received sums for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTotals {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
    /// Sum of `Given` amounts.
    pub given: Decimal,
    /// Sum of `Received` amounts.
    pub received: Decimal,
}

/// Groups transactions by the month of their `trans_date`, oldest first.
#[must_use]
pub fn monthly_totals(transactions: &[Transaction]) -> Vec<MonthlyTotals> {
    let mut buckets: BTreeMap<(i32, u32), (Decimal, Decimal)> = BTreeMap::new();
    for txn in transactions {
        let key = (txn.trans_date.year(), txn.trans_date.month());
        let (given, received) = buckets.entry(key).or_default();
        match txn.kind {
            TransactionType::Given => *given += txn.amount,
            TransactionType::Received => *received += txn.amount,
        }
    }

    buckets
        .into_iter()
        .map(|((year, month), (given, received))| MonthlyTotals {
            year,
            month,
            given,
            received,
        })
        .collect()
}

/// The `limit` most recent transactions by `trans_date`, newest first.
#[must_use]
pub fn recent(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut sorted = transactions.to_vec();
    sorted.sort_by(|a, b| b.trans_date.cmp(&a.trans_date));
    sorted.truncate(limit);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use khata_shared::types::{FarmerId, OrganizationId, TransactionId};
    use rust_decimal_macros::dec;

    fn txn(id: i64, kind: TransactionType, amount: Decimal, y: i32, m: u32, d: u32) -> Transaction {
        let date = Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap();
        Transaction {
            id: TransactionId::new(id),
            org_id: OrganizationId::new(),
            farmer_id: FarmerId::new(),
            farmer_name: None,
            kind,
            amount,
            note: None,
            trans_date: date,
            created_at: date,
        }
    }

    #[test]
    fn test_monthly_totals_grouped_and_ordered() {
        let txns = vec![
            txn(1, TransactionType::Given, dec!(5000), 2025, 4, 21),
            txn(2, TransactionType::Received, dec!(7500), 2025, 4, 20),
            txn(3, TransactionType::Given, dec!(1500), 2025, 3, 10),
            txn(4, TransactionType::Received, dec!(3500), 2024, 12, 1),
        ];

        let totals = monthly_totals(&txns);
        assert_eq!(totals.len(), 3);
        assert_eq!((totals[0].year, totals[0].month), (2024, 12));
        assert_eq!(totals[0].received, dec!(3500));
        assert_eq!(totals[1].given, dec!(1500));
        assert_eq!(totals[2].given, dec!(5000));
        assert_eq!(totals[2].received, dec!(7500));
    }

    #[test]
    fn test_recent_newest_first_and_limited() {
        let txns = vec![
            txn(1, TransactionType::Given, dec!(1), 2025, 4, 1),
            txn(2, TransactionType::Given, dec!(2), 2025, 4, 18),
            txn(3, TransactionType::Given, dec!(3), 2025, 4, 21),
        ];

        let latest = recent(&txns, 2);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].id, TransactionId::new(3));
        assert_eq!(latest[1].id, TransactionId::new(2));
    }
}
