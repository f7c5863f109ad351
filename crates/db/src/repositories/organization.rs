//! Organization repository for settings reads and writes.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use khata_core::tenancy::{OrgSettings, Organization, TenantScope};

use crate::entities::organizations;
use crate::rls::RlsExt;

use super::RepositoryError;

/// Organization repository.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    db: Arc<DatabaseConnection>,
}

impl OrganizationRepository {
    /// Creates a new organization repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Loads the caller's organization.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the organization row is not visible, or an
    /// error if the query fails or the settings blob is malformed.
    pub async fn find(&self, scope: &TenantScope) -> Result<Organization, RepositoryError> {
        let rls = self.db.with_rls(scope.user_id).await?;
        let row = organizations::Entity::find_by_id(scope.org_id.into_inner())
            .one(rls.transaction())
            .await?
            .ok_or_else(|| RepositoryError::not_found("Organization", scope.org_id))?;
        rls.commit().await?;

        Ok(Organization::try_from(row)?)
    }

    /// Replaces the settings blob. Callers check the admin role first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the organization row is not visible, or an
    /// error if the update fails.
    pub async fn update_settings(
        &self,
        scope: &TenantScope,
        settings: &OrgSettings,
    ) -> Result<Organization, RepositoryError> {
        let rls = self.db.with_rls(scope.user_id).await?;
        let row = organizations::Entity::find_by_id(scope.org_id.into_inner())
            .one(rls.transaction())
            .await?
            .ok_or_else(|| RepositoryError::not_found("Organization", scope.org_id))?;

        let mut active: organizations::ActiveModel = row.into();
        active.settings = Set(Some(settings.to_json()));
        active.updated_at = Set(Utc::now().fixed_offset());
        let updated = active.update(rls.transaction()).await?;
        rls.commit().await?;

        Ok(Organization::try_from(updated)?)
    }
}
