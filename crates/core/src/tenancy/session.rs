//! Session context resolved once per request.

use serde::Serialize;

use khata_shared::types::{OrganizationId, UserId};

use crate::error::DomainError;

use super::types::{Profile, Role};

/// Operations reserved for admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    /// Download a snapshot of the organization's data.
    ExportData,
    /// Bulk-create records from an upload.
    ImportData,
    /// Change business, bank, or integration settings.
    UpdateSettings,
    /// Remove a farmer.
    DeleteFarmer,
}

impl std::fmt::Display for AdminAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::ExportData => "export data",
            Self::ImportData => "import data",
            Self::UpdateSettings => "update organization settings",
            Self::DeleteFarmer => "delete farmers",
        })
    }
}

/// A resolved tenant: who is calling, for which organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantScope {
    /// Calling user.
    pub user_id: UserId,
    /// Organization every query is filtered by.
    pub org_id: OrganizationId,
    /// Caller's role.
    pub role: Role,
}

/// The authenticated caller and their profile, if any.
#[derive(Debug, Clone)]
pub struct SessionContext {
    user_id: UserId,
    profile: Option<Profile>,
}

impl SessionContext {
    /// Creates a session context.
    #[must_use]
    pub const fn new(user_id: UserId, profile: Option<Profile>) -> Self {
        Self { user_id, profile }
    }

    /// The authenticated user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The user's profile, if one exists.
    #[must_use]
    pub const fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Whether the caller is an admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.role == Role::Admin)
    }

    /// Resolves the tenant scope for `action`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MissingOrganization` when the caller has no profile.
    pub fn scope(&self, action: &'static str) -> Result<TenantScope, DomainError> {
        let profile = self
            .profile
            .as_ref()
            .ok_or(DomainError::MissingOrganization { action })?;

        Ok(TenantScope {
            user_id: self.user_id,
            org_id: profile.org_id,
            role: profile.role,
        })
    }

    /// Resolves the tenant scope for an admin-only action.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MissingOrganization` when the caller has no
    /// profile and `DomainError::AdminRequired` when they are not an admin.
    pub fn require_admin(&self, action: AdminAction) -> Result<TenantScope, DomainError> {
        let scope = self.scope("perform an admin action")?;
        if scope.role != Role::Admin {
            return Err(DomainError::AdminRequired(action));
        }
        Ok(scope)
    }
}
