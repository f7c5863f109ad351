//! Dashboard repository.
//!
//! Loads the raw rows behind the dashboard tiles and hands them to the
//! aggregations in `khata_core::dashboard`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use khata_core::dashboard::{DashboardOverview, DashboardStats, month_window};
use khata_core::ledger::{monthly_totals, recent};
use khata_core::tenancy::TenantScope;

use crate::convert::{RowError, count, transaction_from_row};
use crate::entities::{farmers, inventory, transactions};
use crate::rls::RlsExt;

use super::RepositoryError;

/// Transactions shown in the overview's activity list.
const RECENT_LIMIT: usize = 5;

/// Dashboard repository.
#[derive(Debug, Clone)]
pub struct DashboardRepository {
    db: Arc<DatabaseConnection>,
}

impl DashboardRepository {
    /// Creates a new dashboard repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Headline numbers for the organization as of `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn stats(
        &self,
        scope: &TenantScope,
        now: DateTime<Utc>,
    ) -> Result<DashboardStats, RepositoryError> {
        let rls = self.db.with_rls(scope.user_id).await?;
        let stats = load_stats(rls.transaction(), scope, now).await?;
        rls.commit().await?;

        Ok(stats)
    }

    /// Stats plus recent activity and monthly given/received totals.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails or a transaction row is invalid.
    pub async fn overview(
        &self,
        scope: &TenantScope,
        now: DateTime<Utc>,
    ) -> Result<DashboardOverview, RepositoryError> {
        let rls = self.db.with_rls(scope.user_id).await?;
        let stats = load_stats(rls.transaction(), scope, now).await?;
        let rows = transactions::Entity::find()
            .find_also_related(farmers::Entity)
            .filter(transactions::Column::OrgId.eq(scope.org_id.into_inner()))
            .order_by_desc(transactions::Column::CreatedAt)
            .all(rls.transaction())
            .await?;
        rls.commit().await?;

        let txns = rows
            .into_iter()
            .map(|(row, farmer)| transaction_from_row(row, farmer))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DashboardOverview {
            stats,
            recent_transactions: recent(&txns, RECENT_LIMIT),
            monthly: monthly_totals(&txns),
        })
    }
}

async fn load_stats(
    txn: &DatabaseTransaction,
    scope: &TenantScope,
    now: DateTime<Utc>,
) -> Result<DashboardStats, RepositoryError> {
    let org_id = scope.org_id.into_inner();
    let (start, end) = month_window(now);

    let balances: Vec<Option<rust_decimal::Decimal>> = farmers::Entity::find()
        .select_only()
        .column(farmers::Column::Balance)
        .filter(farmers::Column::OrgId.eq(org_id))
        .into_tuple()
        .all(txn)
        .await?;

    let bags: Vec<(i32, i32)> = inventory::Entity::find()
        .select_only()
        .column(inventory::Column::BagsGiven)
        .column(inventory::Column::BagsReturned)
        .filter(inventory::Column::OrgId.eq(org_id))
        .into_tuple()
        .all(txn)
        .await?;

    // Rows without a trans_date count by their creation time.
    let in_month = Condition::any()
        .add(
            Condition::all()
                .add(transactions::Column::TransDate.gte(start))
                .add(transactions::Column::TransDate.lt(end)),
        )
        .add(
            Condition::all()
                .add(transactions::Column::TransDate.is_null())
                .add(transactions::Column::CreatedAt.gte(start))
                .add(transactions::Column::CreatedAt.lt(end)),
        );
    let monthly = transactions::Entity::find()
        .filter(transactions::Column::OrgId.eq(org_id))
        .filter(in_month)
        .count(txn)
        .await?;

    Ok(DashboardStats::from_parts(balances, bag_counts(bags)?, monthly))
}

/// Checks the raw bag columns. A negative count fails the load rather than
/// being read as zero.
fn bag_counts(rows: Vec<(i32, i32)>) -> Result<Vec<(u32, u32)>, RowError> {
    rows.into_iter()
        .map(|(given, returned)| {
            Ok((count("bags_given", given)?, count("bags_returned", returned)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bag_counts_pass_through() {
        assert_eq!(bag_counts(vec![(30, 12), (5, 5)]).unwrap(), [(30, 12), (5, 5)]);
    }

    #[test]
    fn test_negative_bag_count_fails_load() {
        assert!(matches!(
            bag_counts(vec![(30, 12), (4, -2)]),
            Err(RowError::NegativeCount {
                field: "bags_returned",
                value: -2,
            })
        ));
    }
}
