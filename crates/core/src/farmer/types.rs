//! Farmer records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use khata_shared::types::{FarmerId, OrganizationId};

use crate::error::DomainError;
use crate::search::matches_any;

use super::balance::BalanceDirection;

/// A farmer the vendor trades with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Farmer {
    /// Farmer ID.
    pub id: FarmerId,
    /// Owning organization.
    pub org_id: OrganizationId,
    /// Full name.
    pub name: String,
    /// Contact phone.
    pub phone: String,
    /// Village or postal address.
    pub address: Option<String>,
    /// Main crop grown.
    pub crop_type: Option<String>,
    /// Stored running balance. Positive means the farmer owes the vendor.
    pub balance: Decimal,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Farmer {
    /// Whether the farmer matches a search over name, phone, and address.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        matches_any(
            term,
            [
                self.name.as_str(),
                self.phone.as_str(),
                self.address.as_deref().unwrap_or_default(),
            ],
        )
    }

    /// Which way the stored balance points.
    #[must_use]
    pub fn balance_direction(&self) -> BalanceDirection {
        BalanceDirection::of(self.balance)
    }
}

fn required(value: &str, field: &'static str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Required { field });
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Input for adding a farmer. The balance always starts at zero.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewFarmer {
    /// Full name.
    pub name: String,
    /// Contact phone.
    pub phone: String,
    /// Village or postal address.
    #[serde(default)]
    pub address: Option<String>,
    /// Main crop grown.
    #[serde(default)]
    pub crop_type: Option<String>,
}

impl NewFarmer {
    /// Trims fields and rejects blank names or phones.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Required` for a blank name or phone.
    pub fn normalized(&self) -> Result<Self, DomainError> {
        Ok(Self {
            name: required(&self.name, "name")?,
            phone: required(&self.phone, "phone")?,
            address: optional(self.address.as_deref()),
            crop_type: optional(self.crop_type.as_deref()),
        })
    }
}

/// Partial update of a farmer. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FarmerUpdate {
    /// New name.
    pub name: Option<String>,
    /// New phone.
    pub phone: Option<String>,
    /// New address.
    pub address: Option<String>,
    /// New crop type.
    pub crop_type: Option<String>,
    /// Direct balance overwrite.
    pub balance: Option<Decimal>,
}

impl FarmerUpdate {
    /// Trims fields and rejects blanking out name or phone.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Required` when name or phone is set to blank.
    pub fn normalized(&self) -> Result<Self, DomainError> {
        Ok(Self {
            name: self.name.as_deref().map(|n| required(n, "name")).transpose()?,
            phone: self
                .phone
                .as_deref()
                .map(|p| required(p, "phone"))
                .transpose()?,
            address: self.address.as_deref().map(str::trim).map(ToString::to_string),
            crop_type: self
                .crop_type
                .as_deref()
                .map(str::trim)
                .map(ToString::to_string),
            balance: self.balance,
        })
    }

    /// Whether the update writes the balance column directly.
    ///
    /// Such writes bypass transactions and can drift from the ledger.
    #[must_use]
    pub const fn overwrites_balance(&self) -> bool {
        self.balance.is_some()
    }

    /// Whether nothing would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.crop_type.is_none()
            && self.balance.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn farmer() -> Farmer {
        Farmer {
            id: FarmerId::new(),
            org_id: OrganizationId::new(),
            name: "Meena Patel".to_string(),
            phone: "9812345678".to_string(),
            address: Some("Anand, Gujarat".to_string()),
            crop_type: Some("Cotton".to_string()),
            balance: dec!(2500),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_search_over_name_phone_address() {
        let f = farmer();
        assert!(f.matches_search("meena"));
        assert!(f.matches_search("98123"));
        assert!(f.matches_search("gujarat"));
        assert!(!f.matches_search("cotton"));
    }

    #[test]
    fn test_new_farmer_trims_and_drops_blank_optionals() {
        let input = NewFarmer {
            name: "  Sunil Verma ".to_string(),
            phone: " 9000000001".to_string(),
            address: Some("   ".to_string()),
            crop_type: Some("Wheat ".to_string()),
        };
        let normalized = input.normalized().unwrap();
        assert_eq!(normalized.name, "Sunil Verma");
        assert_eq!(normalized.phone, "9000000001");
        assert_eq!(normalized.address, None);
        assert_eq!(normalized.crop_type.as_deref(), Some("Wheat"));
    }

    #[test]
    fn test_new_farmer_requires_name_and_phone() {
        let input = NewFarmer {
            name: " ".to_string(),
            phone: "1".to_string(),
            address: None,
            crop_type: None,
        };
        assert_eq!(
            input.normalized().unwrap_err(),
            DomainError::Required { field: "name" }
        );
    }

    #[test]
    fn test_update_flags_balance_overwrite() {
        let update = FarmerUpdate {
            balance: Some(dec!(0)),
            ..FarmerUpdate::default()
        };
        assert!(update.overwrites_balance());
        assert!(!update.is_empty());
        assert!(FarmerUpdate::default().is_empty());
    }

    #[test]
    fn test_update_rejects_blank_phone() {
        let update = FarmerUpdate {
            phone: Some(String::new()),
            ..FarmerUpdate::default()
        };
        assert_eq!(
            update.normalized().unwrap_err(),
            DomainError::Required { field: "phone" }
        );
    }
}
