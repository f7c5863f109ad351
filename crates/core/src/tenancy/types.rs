//! Tenant types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use khata_shared::types::{OrganizationId, UserId};

use crate::error::DomainError;

/// Role of a user inside their organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May manage settings, import/export data, and delete farmers.
    Admin,
    /// Any other role string stored on the profile.
    Member,
}

impl Role {
    /// Parses the free-form role column. Only `admin` is privileged.
    #[must_use]
    pub fn from_profile(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("admin") {
            Self::Admin
        } else {
            Self::Member
        }
    }

    /// Returns the role as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

/// Binding of an authenticated user to one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Auth user id.
    pub user_id: UserId,
    /// Owning organization.
    pub org_id: OrganizationId,
    /// Role inside the organization.
    pub role: Role,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Business details printed on bills.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessInfo {
    /// Trading name.
    pub name: String,
    /// Proprietor.
    pub owner_name: String,
    /// Postal address.
    pub address: String,
    /// Contact phone.
    pub phone: String,
    /// Contact email.
    pub email: String,
    /// GST registration number.
    pub gstin: String,
}

/// Bank details printed on bills.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankInfo {
    /// Account holder.
    pub account_name: String,
    /// Account number.
    pub account_number: String,
    /// IFSC routing code.
    pub ifsc_code: String,
    /// Bank name.
    pub bank_name: String,
    /// Branch name.
    pub branch: String,
}

/// Integration toggles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationSettings {
    /// Spreadsheet endpoint overriding the server default.
    pub sheet_url: Option<String>,
    /// Whether bills may be sent over WhatsApp.
    pub whatsapp_enabled: bool,
}

/// The organization settings blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrgSettings {
    /// Business details.
    pub business: BusinessInfo,
    /// Bank details.
    pub bank: BankInfo,
    /// Integration config.
    pub integrations: IntegrationSettings,
}

impl OrgSettings {
    /// Reads the stored blob. A missing or `null` blob yields defaults.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidField` when the blob has the wrong shape.
    pub fn from_json(raw: Option<&serde_json::Value>) -> Result<Self, DomainError> {
        match raw {
            None | Some(serde_json::Value::Null) => Ok(Self::default()),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| DomainError::invalid("settings", e.to_string())),
        }
    }

    /// Serializes the blob for storage.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// A tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization ID.
    pub id: OrganizationId,
    /// Display name.
    pub name: String,
    /// Parsed settings.
    pub settings: OrgSettings,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("admin", Role::Admin)]
    #[case("Admin ", Role::Admin)]
    #[case("user", Role::Member)]
    #[case("staff", Role::Member)]
    #[case("", Role::Member)]
    fn test_role_from_profile(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(Role::from_profile(raw), expected);
    }

    #[test]
    fn test_settings_defaults_when_missing() {
        assert_eq!(OrgSettings::from_json(None).unwrap(), OrgSettings::default());
        assert_eq!(
            OrgSettings::from_json(Some(&serde_json::Value::Null)).unwrap(),
            OrgSettings::default()
        );
    }

    #[test]
    fn test_settings_partial_blob() {
        let raw = json!({ "business": { "name": "Sharma Traders", "gstin": "27AAAPL1234C1ZV" } });
        let settings = OrgSettings::from_json(Some(&raw)).unwrap();
        assert_eq!(settings.business.name, "Sharma Traders");
        assert_eq!(settings.business.gstin, "27AAAPL1234C1ZV");
        assert!(settings.bank.account_number.is_empty());
        assert!(!settings.integrations.whatsapp_enabled);
    }

    #[test]
    fn test_settings_wrong_shape_rejected() {
        let raw = json!({ "business": "not an object" });
        assert!(matches!(
            OrgSettings::from_json(Some(&raw)),
            Err(DomainError::InvalidField { field: "settings", .. })
        ));
    }

    #[test]
    fn test_settings_round_trip_through_json() {
        let mut settings = OrgSettings::default();
        settings.bank.ifsc_code = "SBIN0001234".to_string();
        settings.integrations.whatsapp_enabled = true;

        let parsed = OrgSettings::from_json(Some(&settings.to_json())).unwrap();
        assert_eq!(parsed, settings);
    }
}
