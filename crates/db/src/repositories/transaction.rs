//! Transaction repository.
//!
//! Transactions are append-only. Recording one also moves the farmer's stored
//! balance by the signed amount, in the same database transaction. The
//! balance is adjusted in SQL so concurrent recordings for one farmer both
//! land.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::info;

use khata_core::ledger::{NewTransaction, Transaction};
use khata_core::tenancy::TenantScope;

use crate::convert::transaction_from_row;
use crate::entities::{farmers, transactions};
use crate::rls::RlsExt;

use super::RepositoryError;

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: Arc<DatabaseConnection>,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists the organization's transactions with farmer names, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row has an unknown type.
    pub async fn list(&self, scope: &TenantScope) -> Result<Vec<Transaction>, RepositoryError> {
        self.fetch(scope, None).await
    }

    /// The `limit` most recent transactions.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row has an unknown type.
    pub async fn recent(
        &self,
        scope: &TenantScope,
        limit: u64,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        self.fetch(scope, Some(limit)).await
    }

    async fn fetch(
        &self,
        scope: &TenantScope,
        limit: Option<u64>,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let rls = self.db.with_rls(scope.user_id).await?;
        let rows = transactions::Entity::find()
            .find_also_related(farmers::Entity)
            .filter(transactions::Column::OrgId.eq(scope.org_id.into_inner()))
            .order_by_desc(transactions::Column::CreatedAt)
            .limit(limit)
            .all(rls.transaction())
            .await?;
        rls.commit().await?;

        rows.into_iter()
            .map(|(row, farmer)| transaction_from_row(row, farmer).map_err(RepositoryError::from))
            .collect()
    }

    /// Records a transaction and adjusts the farmer's balance.
    ///
    /// # Errors
    ///
    /// Returns a domain error for a non-positive amount, `NotFound` if the
    /// farmer is not in the caller's organization, or an error if a write
    /// fails. Nothing is written on error.
    pub async fn record(
        &self,
        scope: &TenantScope,
        input: &NewTransaction,
    ) -> Result<Transaction, RepositoryError> {
        let now = Utc::now();
        let input = input.prepare(now)?;
        let org_id = scope.org_id.into_inner();

        let rls = self.db.with_rls(scope.user_id).await?;
        let farmer = farmers::Entity::find_by_id(input.farmer_id.into_inner())
            .filter(farmers::Column::OrgId.eq(org_id))
            .one(rls.transaction())
            .await?
            .ok_or_else(|| RepositoryError::not_found("Farmer", input.farmer_id))?;

        let row = transactions::ActiveModel {
            org_id: Set(org_id),
            farmer_id: Set(farmer.id),
            kind: Set(input.kind.as_str().to_string()),
            amount: Set(input.amount),
            note: Set(input.note.clone()),
            trans_date: Set(input.trans_date.map(|d| d.fixed_offset())),
            created_at: Set(now.fixed_offset()),
            ..Default::default()
        }
        .insert(rls.transaction())
        .await?;

        // balance = coalesce(balance, 0) + delta, evaluated by the database.
        let adjusted = Expr::expr(Func::coalesce([
            Expr::col(farmers::Column::Balance).into(),
            Expr::val(Decimal::ZERO).into(),
        ]))
        .add(input.balance_delta());
        let result = farmers::Entity::update_many()
            .col_expr(farmers::Column::Balance, adjusted)
            .col_expr(farmers::Column::UpdatedAt, Expr::value(now.fixed_offset()))
            .filter(farmers::Column::Id.eq(farmer.id))
            .filter(farmers::Column::OrgId.eq(org_id))
            .exec(rls.transaction())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found("Farmer", input.farmer_id));
        }
        rls.commit().await?;

        info!(
            org_id = %scope.org_id,
            farmer_id = %input.farmer_id,
            kind = input.kind.as_str(),
            amount = %input.amount,
            "Transaction recorded"
        );

        Ok(transaction_from_row(row, Some(farmer))?)
    }
}
