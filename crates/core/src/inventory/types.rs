//! Inventory records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use khata_shared::types::{FarmerId, InventoryItemId, OrganizationId};

use crate::error::DomainError;
use crate::search::matches_any;

/// Derived lifecycle of an inventory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryStatus {
    /// Some bags are still with the farmer.
    Active,
    /// Every given bag has been returned.
    Completed,
}

impl InventoryStatus {
    /// `Active` while `returned < given`, else `Completed`.
    #[must_use]
    pub const fn derive(bags_given: u32, bags_returned: u32) -> Self {
        if bags_returned < bags_given {
            Self::Active
        } else {
            Self::Completed
        }
    }

    /// Display label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Completed => "Completed",
        }
    }
}

/// Bags of one product lent to one farmer.
///
/// Serializes with its derived `status` and `outstanding` count; both are
/// ignored on input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InventoryItem {
    /// Inventory ID.
    pub id: InventoryItemId,
    /// Owning organization.
    pub org_id: OrganizationId,
    /// Farmer holding the bags.
    pub farmer_id: FarmerId,
    /// Farmer name, when loaded with the farmer.
    pub farmer_name: Option<String>,
    /// Product in the bags.
    pub product: String,
    /// Bags handed out.
    pub bags_given: u32,
    /// Bags brought back.
    pub bags_returned: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct InventoryItemJson<'a> {
    id: InventoryItemId,
    org_id: OrganizationId,
    farmer_id: FarmerId,
    farmer_name: Option<&'a str>,
    product: &'a str,
    bags_given: u32,
    bags_returned: u32,
    outstanding: u32,
    status: InventoryStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Serialize for InventoryItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        InventoryItemJson {
            id: self.id,
            org_id: self.org_id,
            farmer_id: self.farmer_id,
            farmer_name: self.farmer_name.as_deref(),
            product: &self.product,
            bags_given: self.bags_given,
            bags_returned: self.bags_returned,
            outstanding: self.outstanding(),
            status: self.status(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .serialize(serializer)
    }
}

impl InventoryItem {
    /// Derived status.
    #[must_use]
    pub const fn status(&self) -> InventoryStatus {
        InventoryStatus::derive(self.bags_given, self.bags_returned)
    }

    /// Bags still with the farmer. Zero if more came back than went out.
    #[must_use]
    pub const fn outstanding(&self) -> u32 {
        self.bags_given.saturating_sub(self.bags_returned)
    }

    /// Whether the item matches a search over farmer name, product, and status.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        matches_any(
            term,
            [
                self.farmer_name.as_deref().unwrap_or_default(),
                self.product.as_str(),
                self.status().as_str(),
            ],
        )
    }

    /// Returned count after taking back `bags` more.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ReturnExceedsOutstanding` if fewer than `bags`
    /// are outstanding.
    pub fn record_return(&self, bags: u32) -> Result<u32, DomainError> {
        let outstanding = self.outstanding();
        if bags > outstanding {
            return Err(DomainError::ReturnExceedsOutstanding {
                requested: bags,
                outstanding,
            });
        }
        Ok(self.bags_returned + bags)
    }
}

/// Input for lending bags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewInventoryItem {
    /// Farmer receiving the bags.
    pub farmer_id: FarmerId,
    /// Product in the bags.
    pub product: String,
    /// Bags handed out.
    pub bags_given: u32,
}

impl NewInventoryItem {
    /// Trims the product name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Required` for a blank product.
    pub fn normalized(&self) -> Result<Self, DomainError> {
        let product = self.product.trim();
        if product.is_empty() {
            return Err(DomainError::Required { field: "product" });
        }
        Ok(Self {
            farmer_id: self.farmer_id,
            product: product.to_string(),
            bags_given: self.bags_given,
        })
    }
}

/// Partial update of an inventory record.
///
/// Counts are written as given; `returned <= given` is not enforced here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InventoryUpdate {
    /// New product name.
    pub product: Option<String>,
    /// New given count.
    pub bags_given: Option<u32>,
    /// New returned count.
    pub bags_returned: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn item(given: u32, returned: u32) -> InventoryItem {
        InventoryItem {
            id: InventoryItemId::new(1),
            org_id: OrganizationId::new(),
            farmer_id: FarmerId::new(),
            farmer_name: Some("Vikram Singh".to_string()),
            product: "Rice".to_string(),
            bags_given: given,
            bags_returned: returned,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(30, 12, InventoryStatus::Active)]
    #[case(25, 25, InventoryStatus::Completed)]
    #[case(0, 0, InventoryStatus::Completed)]
    #[case(10, 11, InventoryStatus::Completed)]
    #[case(1, 0, InventoryStatus::Active)]
    fn test_status_derivation(
        #[case] given: u32,
        #[case] returned: u32,
        #[case] expected: InventoryStatus,
    ) {
        assert_eq!(item(given, returned).status(), expected);
    }

    #[test]
    fn test_json_carries_derived_status() {
        let value = serde_json::to_value(item(30, 12)).unwrap();
        assert_eq!(value["status"], "Active");
        assert_eq!(value["outstanding"], 18);
        assert_eq!(value["farmer_name"], "Vikram Singh");

        let done = serde_json::to_value(item(25, 25)).unwrap();
        assert_eq!(done["status"], "Completed");

        let back: InventoryItem = serde_json::from_value(value).unwrap();
        assert_eq!(back.bags_returned, 12);
    }

    #[test]
    fn test_outstanding_saturates() {
        assert_eq!(item(30, 12).outstanding(), 18);
        assert_eq!(item(10, 11).outstanding(), 0);
    }

    #[test]
    fn test_record_return_within_outstanding() {
        assert_eq!(item(30, 12).record_return(18).unwrap(), 30);
        assert_eq!(
            item(30, 12).record_return(19).unwrap_err(),
            DomainError::ReturnExceedsOutstanding {
                requested: 19,
                outstanding: 18
            }
        );
    }

    #[test]
    fn test_search_includes_status_label() {
        assert!(item(30, 12).matches_search("active"));
        assert!(item(25, 25).matches_search("completed"));
        assert!(item(25, 25).matches_search("vikram"));
        assert!(!item(25, 25).matches_search("wheat"));
    }

    #[test]
    fn test_new_item_requires_product() {
        let input = NewInventoryItem {
            farmer_id: FarmerId::new(),
            product: "  ".to_string(),
            bags_given: 3,
        };
        assert_eq!(
            input.normalized().unwrap_err(),
            DomainError::Required { field: "product" }
        );
    }
}
