//! Inventory repository.
//!
//! Returns lock the inventory row for the rest of the transaction, so the
//! outstanding check and the write see the same count.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use khata_core::inventory::{InventoryItem, InventorySummary, InventoryUpdate, NewInventoryItem};
use khata_core::tenancy::TenantScope;
use khata_shared::types::InventoryItemId;

use crate::convert::{count_column, inventory_item_from_row};
use crate::entities::{farmers, inventory};
use crate::rls::RlsExt;

use super::RepositoryError;

/// Inventory repository.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    db: Arc<DatabaseConnection>,
}

impl InventoryRepository {
    /// Creates a new inventory repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists the organization's inventory with farmer names, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row has negative counts.
    pub async fn list(&self, scope: &TenantScope) -> Result<Vec<InventoryItem>, RepositoryError> {
        let rls = self.db.with_rls(scope.user_id).await?;
        let rows = inventory::Entity::find()
            .find_also_related(farmers::Entity)
            .filter(inventory::Column::OrgId.eq(scope.org_id.into_inner()))
            .order_by_desc(inventory::Column::CreatedAt)
            .all(rls.transaction())
            .await?;
        rls.commit().await?;

        rows.into_iter()
            .map(|(row, farmer)| inventory_item_from_row(row, farmer).map_err(RepositoryError::from))
            .collect()
    }

    /// Totals across the organization's inventory.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row has negative counts.
    pub async fn summary(&self, scope: &TenantScope) -> Result<InventorySummary, RepositoryError> {
        let items = self.list(scope).await?;
        Ok(InventorySummary::from_items(&items))
    }

    /// Lends bags to a farmer. The returned count starts at zero.
    ///
    /// # Errors
    ///
    /// Returns a domain error for a blank product, `NotFound` if the farmer
    /// is not in the caller's organization, or an error if the insert fails.
    pub async fn create(
        &self,
        scope: &TenantScope,
        input: &NewInventoryItem,
    ) -> Result<InventoryItem, RepositoryError> {
        let input = input.normalized()?;
        let org_id = scope.org_id.into_inner();
        let now = Utc::now().fixed_offset();

        let rls = self.db.with_rls(scope.user_id).await?;
        let farmer = farmers::Entity::find_by_id(input.farmer_id.into_inner())
            .filter(farmers::Column::OrgId.eq(org_id))
            .one(rls.transaction())
            .await?
            .ok_or_else(|| RepositoryError::not_found("Farmer", input.farmer_id))?;

        let row = inventory::ActiveModel {
            org_id: Set(org_id),
            farmer_id: Set(farmer.id),
            product: Set(input.product),
            bags_given: Set(count_column(input.bags_given)),
            bags_returned: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(rls.transaction())
        .await?;
        rls.commit().await?;

        Ok(inventory_item_from_row(row, Some(farmer))?)
    }

    /// Applies a partial update. Counts are written as given.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the record is not in the caller's organization,
    /// or an error if the update fails.
    pub async fn update(
        &self,
        scope: &TenantScope,
        id: InventoryItemId,
        update: &InventoryUpdate,
    ) -> Result<InventoryItem, RepositoryError> {
        let rls = self.db.with_rls(scope.user_id).await?;
        let (row, farmer) = find_row(rls.transaction(), scope, id).await?;

        let mut active: inventory::ActiveModel = row.into();
        if let Some(product) = update.product.as_deref().map(str::trim) {
            if product.is_empty() {
                return Err(khata_core::DomainError::Required { field: "product" }.into());
            }
            active.product = Set(product.to_string());
        }
        if let Some(given) = update.bags_given {
            active.bags_given = Set(count_column(given));
        }
        if let Some(returned) = update.bags_returned {
            active.bags_returned = Set(count_column(returned));
        }
        active.updated_at = Set(Utc::now().fixed_offset());

        let updated = active.update(rls.transaction()).await?;
        rls.commit().await?;

        Ok(inventory_item_from_row(updated, farmer)?)
    }

    /// Records `bags` coming back. More than are outstanding is rejected.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the record is not in the caller's organization,
    /// a domain error if the return exceeds the outstanding bags, or an
    /// error if the update fails.
    pub async fn record_return(
        &self,
        scope: &TenantScope,
        id: InventoryItemId,
        bags: u32,
    ) -> Result<InventoryItem, RepositoryError> {
        let rls = self.db.with_rls(scope.user_id).await?;
        let row = inventory::Entity::find_by_id(id.into_inner())
            .filter(inventory::Column::OrgId.eq(scope.org_id.into_inner()))
            .lock_exclusive()
            .one(rls.transaction())
            .await?
            .ok_or_else(|| RepositoryError::not_found("Inventory item", id))?;
        let farmer = farmers::Entity::find_by_id(row.farmer_id)
            .one(rls.transaction())
            .await?;
        let current = InventoryItem::try_from(row.clone())?;
        let returned = current.record_return(bags)?;

        let mut active: inventory::ActiveModel = row.into();
        active.bags_returned = Set(count_column(returned));
        active.updated_at = Set(Utc::now().fixed_offset());
        let updated = active.update(rls.transaction()).await?;
        rls.commit().await?;

        Ok(inventory_item_from_row(updated, farmer)?)
    }
}

async fn find_row(
    txn: &DatabaseTransaction,
    scope: &TenantScope,
    id: InventoryItemId,
) -> Result<(inventory::Model, Option<farmers::Model>), RepositoryError> {
    inventory::Entity::find_by_id(id.into_inner())
        .find_also_related(farmers::Entity)
        .filter(inventory::Column::OrgId.eq(scope.org_id.into_inner()))
        .one(txn)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Inventory item", id))
}
