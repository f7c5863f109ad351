//! Farmer repository.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set,
};
use tracing::warn;
use uuid::Uuid;

use khata_core::farmer::{BalanceReport, Farmer, FarmerUpdate, NewFarmer, reconcile};
use khata_core::ledger::Transaction;
use khata_core::tenancy::TenantScope;
use khata_shared::types::FarmerId;

use crate::entities::{farmers, transactions};
use crate::rls::RlsExt;

use super::RepositoryError;

/// Farmer repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct FarmerRepository {
    db: Arc<DatabaseConnection>,
}

impl FarmerRepository {
    /// Creates a new farmer repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists the organization's farmers, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, scope: &TenantScope) -> Result<Vec<Farmer>, RepositoryError> {
        let rls = self.db.with_rls(scope.user_id).await?;
        let rows = farmers::Entity::find()
            .filter(farmers::Column::OrgId.eq(scope.org_id.into_inner()))
            .order_by_desc(farmers::Column::CreatedAt)
            .all(rls.transaction())
            .await?;
        rls.commit().await?;

        Ok(rows.into_iter().map(Farmer::from).collect())
    }

    /// Finds one farmer.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the farmer is not in the caller's organization.
    pub async fn find(&self, scope: &TenantScope, id: FarmerId) -> Result<Farmer, RepositoryError> {
        let rls = self.db.with_rls(scope.user_id).await?;
        let row = find_row(rls.transaction(), scope, id).await?;
        rls.commit().await?;

        Ok(Farmer::from(row))
    }

    /// Adds a farmer with a zero balance, tagged with the caller's organization.
    ///
    /// # Errors
    ///
    /// Returns a domain error for blank name or phone, or an error if the
    /// insert fails.
    pub async fn create(
        &self,
        scope: &TenantScope,
        input: &NewFarmer,
    ) -> Result<Farmer, RepositoryError> {
        let input = input.normalized()?;
        let rls = self.db.with_rls(scope.user_id).await?;
        let row = insert_row(rls.transaction(), scope, input).await?;
        rls.commit().await?;

        Ok(Farmer::from(row))
    }

    /// Adds many farmers in one transaction. Nothing is written if any
    /// record is invalid.
    ///
    /// # Errors
    ///
    /// Returns a domain error for the first invalid record, or an error if
    /// an insert fails.
    pub async fn import(
        &self,
        scope: &TenantScope,
        inputs: &[NewFarmer],
    ) -> Result<Vec<Farmer>, RepositoryError> {
        let inputs = inputs
            .iter()
            .map(NewFarmer::normalized)
            .collect::<Result<Vec<_>, _>>()?;

        let rls = self.db.with_rls(scope.user_id).await?;
        let mut created = Vec::with_capacity(inputs.len());
        for input in inputs {
            created.push(Farmer::from(insert_row(rls.transaction(), scope, input).await?));
        }
        rls.commit().await?;

        Ok(created)
    }

    /// Applies a partial update.
    ///
    /// Writing the balance directly is allowed but logged, since it can
    /// drift from the balance derived from transactions.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the farmer is not in the caller's organization,
    /// a domain error for blank name or phone, or an error if the update fails.
    pub async fn update(
        &self,
        scope: &TenantScope,
        id: FarmerId,
        update: &FarmerUpdate,
    ) -> Result<Farmer, RepositoryError> {
        let update = update.normalized()?;
        let rls = self.db.with_rls(scope.user_id).await?;
        let row = find_row(rls.transaction(), scope, id).await?;

        if update.is_empty() {
            rls.commit().await?;
            return Ok(Farmer::from(row));
        }

        if let Some(balance) = update.balance {
            warn!(
                farmer_id = %id,
                stored = %row.balance.unwrap_or_default(),
                written = %balance,
                "Farmer balance overwritten directly; it may drift from transactions"
            );
        }

        let mut active: farmers::ActiveModel = row.into();
        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(phone) = update.phone {
            active.phone = Set(phone);
        }
        if let Some(address) = update.address {
            active.address = Set(Some(address).filter(|a| !a.is_empty()));
        }
        if let Some(crop_type) = update.crop_type {
            active.crop_type = Set(Some(crop_type).filter(|c| !c.is_empty()));
        }
        if let Some(balance) = update.balance {
            active.balance = Set(Some(balance));
        }
        active.updated_at = Set(Utc::now().fixed_offset());

        let updated = active.update(rls.transaction()).await?;
        rls.commit().await?;

        Ok(Farmer::from(updated))
    }

    /// Deletes a farmer. Callers check the admin role first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the farmer is not in the caller's organization.
    pub async fn delete(&self, scope: &TenantScope, id: FarmerId) -> Result<(), RepositoryError> {
        let rls = self.db.with_rls(scope.user_id).await?;
        let row = find_row(rls.transaction(), scope, id).await?;
        row.delete(rls.transaction()).await?;
        rls.commit().await?;

        Ok(())
    }

    /// Compares every farmer's stored balance with the sum of their
    /// transactions. Drift is reported and logged, never corrected.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails or a transaction row is invalid.
    pub async fn balance_report(
        &self,
        scope: &TenantScope,
    ) -> Result<Vec<BalanceReport>, RepositoryError> {
        let org_id = scope.org_id.into_inner();
        let rls = self.db.with_rls(scope.user_id).await?;
        let farmer_rows = farmers::Entity::find()
            .filter(farmers::Column::OrgId.eq(org_id))
            .order_by_asc(farmers::Column::Name)
            .all(rls.transaction())
            .await?;
        let txn_rows = transactions::Entity::find()
            .filter(transactions::Column::OrgId.eq(org_id))
            .all(rls.transaction())
            .await?;
        rls.commit().await?;

        let farmers: Vec<Farmer> = farmer_rows.into_iter().map(Farmer::from).collect();
        let txns = txn_rows
            .into_iter()
            .map(Transaction::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let reports = reconcile(&farmers, &txns);
        let drifting = reports.iter().filter(|r| r.has_drift()).count();
        if drifting > 0 {
            let total: Decimal = reports.iter().map(|r| r.drift.abs()).sum();
            warn!(
                org_id = %scope.org_id,
                drifting,
                total_drift = %total,
                "Stored farmer balances disagree with transactions"
            );
        }

        Ok(reports)
    }
}

async fn find_row(
    txn: &DatabaseTransaction,
    scope: &TenantScope,
    id: FarmerId,
) -> Result<farmers::Model, RepositoryError> {
    farmers::Entity::find_by_id(id.into_inner())
        .filter(farmers::Column::OrgId.eq(scope.org_id.into_inner()))
        .one(txn)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Farmer", id))
}

async fn insert_row(
    txn: &DatabaseTransaction,
    scope: &TenantScope,
    input: NewFarmer,
) -> Result<farmers::Model, RepositoryError> {
    let now = Utc::now().fixed_offset();
    let row = farmers::ActiveModel {
        id: Set(Uuid::now_v7()),
        org_id: Set(scope.org_id.into_inner()),
        name: Set(input.name),
        phone: Set(input.phone),
        address: Set(input.address),
        crop_type: Set(input.crop_type),
        balance: Set(Some(Decimal::ZERO)),
        created_at: Set(now),
        updated_at: Set(now),
    };

    Ok(row.insert(txn).await?)
}
