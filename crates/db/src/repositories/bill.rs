//! Relational bill store.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use khata_core::billing::{Bill, NewBill};
use khata_core::tenancy::TenantScope;

use crate::entities::{bills, farmers};
use crate::rls::RlsExt;

use super::RepositoryError;

/// Bill repository.
#[derive(Debug, Clone)]
pub struct BillRepository {
    db: Arc<DatabaseConnection>,
}

impl BillRepository {
    /// Creates a new bill repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists the organization's bills, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, scope: &TenantScope) -> Result<Vec<Bill>, RepositoryError> {
        let rls = self.db.with_rls(scope.user_id).await?;
        let rows = bills::Entity::find()
            .filter(bills::Column::OrgId.eq(scope.org_id.into_inner()))
            .order_by_desc(bills::Column::CreatedAt)
            .all(rls.transaction())
            .await?;
        rls.commit().await?;

        Ok(rows.into_iter().map(Bill::from).collect())
    }

    /// Stores a bill for a farmer, created by the caller.
    ///
    /// # Errors
    ///
    /// Returns a domain error for empty content, `NotFound` if the farmer is
    /// not in the caller's organization, or an error if the insert fails.
    pub async fn create(&self, scope: &TenantScope, input: &NewBill) -> Result<Bill, RepositoryError> {
        input.validate()?;
        let org_id = scope.org_id.into_inner();

        let rls = self.db.with_rls(scope.user_id).await?;
        farmers::Entity::find_by_id(input.farmer_id.into_inner())
            .filter(farmers::Column::OrgId.eq(org_id))
            .one(rls.transaction())
            .await?
            .ok_or_else(|| RepositoryError::not_found("Farmer", input.farmer_id))?;

        let row = bills::ActiveModel {
            org_id: Set(org_id),
            farmer_id: Set(input.farmer_id.into_inner()),
            content: Set(input.content.to_string()),
            created_by: Set(Some(scope.user_id.into_inner())),
            created_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .insert(rls.transaction())
        .await?;
        rls.commit().await?;

        info!(org_id = %scope.org_id, bill_id = row.id, "Bill created");
        Ok(Bill::from(row))
    }
}
