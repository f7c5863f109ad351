//! Conversions from database rows into domain records.
//!
//! Rows are checked here, at the data-access boundary: unknown transaction
//! types, negative bag counts, and malformed settings are rejected instead of
//! leaking into the domain.

use chrono::{DateTime, FixedOffset, Utc};
use thiserror::Error;

use khata_core::billing::Bill;
use khata_core::farmer::Farmer;
use khata_core::inventory::InventoryItem;
use khata_core::ledger::{Transaction, TransactionType};
use khata_core::tenancy::{OrgSettings, Organization, Profile, Role};
use khata_shared::types::{
    BillId, FarmerId, InventoryItemId, OrganizationId, TransactionId, UserId,
};

use crate::entities::{bills, farmers, inventory, organizations, profiles, transactions};

/// A row that does not satisfy the domain's invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// `transactions.type` is neither `Given` nor `Received`.
    #[error("unknown transaction type '{0}'")]
    UnknownTransactionType(String),

    /// A bag counter is negative.
    #[error("{field} must not be negative, got {value}")]
    NegativeCount {
        /// Column name.
        field: &'static str,
        /// Stored value.
        value: i32,
    },

    /// `organizations.settings` does not match the settings document.
    #[error("invalid organization settings: {0}")]
    Settings(String),
}

fn utc(ts: DateTime<FixedOffset>) -> DateTime<Utc> {
    ts.with_timezone(&Utc)
}

/// Reads a bag counter column.
pub(crate) fn count(field: &'static str, value: i32) -> Result<u32, RowError> {
    u32::try_from(value).map_err(|_| RowError::NegativeCount { field, value })
}

/// Converts a domain count to a column value, saturating at `i32::MAX`.
pub(crate) fn count_column(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl From<farmers::Model> for Farmer {
    fn from(row: farmers::Model) -> Self {
        Self {
            id: FarmerId::from_uuid(row.id),
            org_id: OrganizationId::from_uuid(row.org_id),
            name: row.name,
            phone: row.phone,
            address: row.address,
            crop_type: row.crop_type,
            balance: row.balance.unwrap_or_default(),
            created_at: utc(row.created_at),
            updated_at: utc(row.updated_at),
        }
    }
}

/// Converts a transaction row, with its farmer when joined.
///
/// # Errors
///
/// Returns `UnknownTransactionType` for a type other than `Given` or `Received`.
pub fn transaction_from_row(
    row: transactions::Model,
    farmer: Option<farmers::Model>,
) -> Result<Transaction, RowError> {
    let kind = row
        .kind
        .parse::<TransactionType>()
        .map_err(|_| RowError::UnknownTransactionType(row.kind.clone()))?;

    Ok(Transaction {
        id: TransactionId::new(row.id),
        org_id: OrganizationId::from_uuid(row.org_id),
        farmer_id: FarmerId::from_uuid(row.farmer_id),
        farmer_name: farmer.map(|f| f.name),
        kind,
        amount: row.amount,
        note: row.note,
        trans_date: row.trans_date.map_or_else(|| utc(row.created_at), utc),
        created_at: utc(row.created_at),
    })
}

impl TryFrom<transactions::Model> for Transaction {
    type Error = RowError;

    fn try_from(row: transactions::Model) -> Result<Self, Self::Error> {
        transaction_from_row(row, None)
    }
}

/// Converts an inventory row, with its farmer when joined.
///
/// # Errors
///
/// Returns `NegativeCount` if a bag counter is negative.
pub fn inventory_item_from_row(
    row: inventory::Model,
    farmer: Option<farmers::Model>,
) -> Result<InventoryItem, RowError> {
    Ok(InventoryItem {
        id: InventoryItemId::new(row.id),
        org_id: OrganizationId::from_uuid(row.org_id),
        farmer_id: FarmerId::from_uuid(row.farmer_id),
        farmer_name: farmer.map(|f| f.name),
        product: row.product,
        bags_given: count("bags_given", row.bags_given)?,
        bags_returned: count("bags_returned", row.bags_returned)?,
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
    })
}

impl TryFrom<inventory::Model> for InventoryItem {
    type Error = RowError;

    fn try_from(row: inventory::Model) -> Result<Self, Self::Error> {
        inventory_item_from_row(row, None)
    }
}

impl From<bills::Model> for Bill {
    fn from(row: bills::Model) -> Self {
        // Older rows hold free text rather than a JSON document.
        let content = serde_json::from_str(&row.content)
            .unwrap_or(serde_json::Value::String(row.content));

        Self {
            id: BillId::new(row.id),
            org_id: OrganizationId::from_uuid(row.org_id),
            farmer_id: FarmerId::from_uuid(row.farmer_id),
            content,
            created_by: row.created_by.map(UserId::from_uuid),
            created_at: utc(row.created_at),
        }
    }
}

impl From<profiles::Model> for Profile {
    fn from(row: profiles::Model) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            org_id: OrganizationId::from_uuid(row.org_id),
            role: Role::from_profile(&row.role),
            created_at: utc(row.created_at),
            updated_at: utc(row.updated_at),
        }
    }
}

impl TryFrom<organizations::Model> for Organization {
    type Error = RowError;

    fn try_from(row: organizations::Model) -> Result<Self, Self::Error> {
        let settings = OrgSettings::from_json(row.settings.as_ref())
            .map_err(|e| RowError::Settings(e.to_string()))?;

        Ok(Self {
            id: OrganizationId::from_uuid(row.id),
            name: row.name,
            settings,
            created_at: utc(row.created_at),
            updated_at: utc(row.updated_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use uuid::Uuid;

    fn now() -> DateTime<FixedOffset> {
        Utc::now().fixed_offset()
    }

    fn farmer_row(name: &str) -> farmers::Model {
        farmers::Model {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            name: name.to_string(),
            phone: "+91 98765 43210".to_string(),
            address: None,
            crop_type: Some("Rice".to_string()),
            balance: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn transaction_row(kind: &str) -> transactions::Model {
        transactions::Model {
            id: 12,
            org_id: Uuid::new_v4(),
            farmer_id: Uuid::new_v4(),
            kind: kind.to_string(),
            amount: dec!(5000.00),
            note: Some("Seeds advance".to_string()),
            trans_date: None,
            created_at: now(),
        }
    }

    #[test]
    fn test_null_balance_reads_as_zero() {
        let farmer = Farmer::from(farmer_row("Ramesh Kumar"));
        assert_eq!(farmer.balance, dec!(0));
    }

    #[test]
    fn test_transaction_carries_farmer_name() {
        let txn =
            transaction_from_row(transaction_row("Given"), Some(farmer_row("Suresh Patel")))
                .unwrap();
        assert_eq!(txn.kind, TransactionType::Given);
        assert_eq!(txn.farmer_name.as_deref(), Some("Suresh Patel"));
        assert_eq!(txn.trans_date, txn.created_at);
    }

    #[test]
    fn test_unknown_transaction_type_rejected() {
        assert_eq!(
            Transaction::try_from(transaction_row("Loan")).unwrap_err(),
            RowError::UnknownTransactionType("Loan".to_string())
        );
    }

    #[test]
    fn test_negative_bags_rejected() {
        let row = inventory::Model {
            id: 3,
            org_id: Uuid::new_v4(),
            farmer_id: Uuid::new_v4(),
            product: "Wheat".to_string(),
            bags_given: 10,
            bags_returned: -1,
            created_at: now(),
            updated_at: now(),
        };
        assert_eq!(
            InventoryItem::try_from(row).unwrap_err(),
            RowError::NegativeCount {
                field: "bags_returned",
                value: -1
            }
        );
    }

    #[test]
    fn test_bill_content_falls_back_to_text() {
        let mut row = bills::Model {
            id: 1,
            org_id: Uuid::new_v4(),
            farmer_id: Uuid::new_v4(),
            content: r#"{"items":"Rice (40 bags)","status":"Paid"}"#.to_string(),
            created_by: None,
            created_at: now(),
        };
        assert_eq!(Bill::from(row.clone()).content["status"], "Paid");

        row.content = "Handwritten bill".to_string();
        assert_eq!(Bill::from(row).content, json!("Handwritten bill"));
    }

    #[test]
    fn test_organization_settings_parsed() {
        let row = organizations::Model {
            id: Uuid::new_v4(),
            name: "Green Valley Traders".to_string(),
            settings: Some(json!({ "business": { "name": "Green Valley" } })),
            created_at: now(),
            updated_at: now(),
        };
        let org = Organization::try_from(row).unwrap();
        assert_eq!(org.settings.business.name, "Green Valley");
        assert!(!org.settings.integrations.whatsapp_enabled);
    }

    #[test]
    fn test_count_column_saturates() {
        assert_eq!(count_column(25), 25);
        assert_eq!(count_column(u32::MAX), i32::MAX);
    }
}
