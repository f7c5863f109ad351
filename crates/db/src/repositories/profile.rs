//! Profile lookups for request authentication.

use std::sync::Arc;

use sea_orm::{DatabaseConnection, EntityTrait};

use khata_core::tenancy::Profile;
use khata_shared::Claims;

use crate::entities::profiles;
use crate::rls::RlsConnection;

use super::RepositoryError;

/// Reads the caller's own profile.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl ProfileRepository {
    /// Creates a new profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Loads the profile of the token holder. `None` means the user has not
    /// been attached to an organization yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_for_claims(&self, claims: &Claims) -> Result<Option<Profile>, RepositoryError> {
        let rls = RlsConnection::for_claims(&self.db, claims).await?;
        let row = profiles::Entity::find_by_id(claims.sub)
            .one(rls.transaction())
            .await?;
        rls.commit().await?;

        Ok(row.map(Profile::from))
    }
}
