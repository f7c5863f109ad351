//! Bill records for both stores.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use khata_shared::types::{BillId, FarmerId, OrganizationId, UserId};

use crate::error::DomainError;
use crate::search::matches_any;

/// A bill row in the `bills` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    /// Bill ID.
    pub id: BillId,
    /// Owning organization.
    pub org_id: OrganizationId,
    /// Billed farmer.
    pub farmer_id: FarmerId,
    /// Bill body as entered (items, status, totals).
    pub content: serde_json::Value,
    /// User who created the bill.
    pub created_by: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Bill {
    /// Whether the bill number or any text in the body matches.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let number = self.id.to_string();
        let body = self.content.to_string();
        matches_any(term, [number.as_str(), body.as_str()])
    }
}

/// Input for a relational bill.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewBill {
    /// Billed farmer.
    pub farmer_id: FarmerId,
    /// Bill body.
    pub content: serde_json::Value,
}

impl NewBill {
    /// Rejects empty bodies.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Required` when the content is `null` or `{}`.
    pub fn validate(&self) -> Result<(), DomainError> {
        let empty = match &self.content {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        };
        if empty {
            return Err(DomainError::Required { field: "content" });
        }
        Ok(())
    }
}

/// One data row of the bill spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetBill {
    /// Generated bill number, e.g. `BILL-20250421103000`.
    pub bill_id: String,
    /// Customer name.
    pub customer: String,
    /// Total as written in the sheet.
    pub total: String,
    /// Date as written in the sheet.
    pub date: String,
}

impl SheetBill {
    /// Reads one spreadsheet row. Missing cells become empty strings.
    #[must_use]
    pub fn from_row(row: &[String]) -> Self {
        let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
        Self {
            bill_id: cell(0),
            customer: cell(1),
            total: cell(2),
            date: cell(3),
        }
    }

    /// Whether the bill number, customer, or date matches.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        matches_any(
            term,
            [
                self.bill_id.as_str(),
                self.customer.as_str(),
                self.date.as_str(),
            ],
        )
    }
}

/// Input for a spreadsheet bill.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSheetBill {
    /// Bill number. Generated when absent.
    #[serde(default)]
    pub bill_id: Option<String>,
    /// Customer name.
    pub customer: String,
    /// Bill total.
    pub total: Decimal,
    /// Bill date. Defaults to the day of recording.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl NewSheetBill {
    /// Produces the row to append, generating a bill number if needed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Required` for a blank customer and
    /// `DomainError::NonPositiveAmount` for a total that is not positive.
    pub fn into_record(self, now: DateTime<Utc>) -> Result<SheetBill, DomainError> {
        let customer = self.customer.trim().to_string();
        if customer.is_empty() {
            return Err(DomainError::Required { field: "customer" });
        }
        if self.total <= Decimal::ZERO {
            return Err(DomainError::NonPositiveAmount(self.total));
        }

        let bill_id = self
            .bill_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| generate_bill_number(now));

        Ok(SheetBill {
            bill_id,
            customer,
            total: self.total.normalize().to_string(),
            date: self
                .date
                .unwrap_or_else(|| now.date_naive())
                .format("%Y-%m-%d")
                .to_string(),
        })
    }
}

/// `BILL-{yyyymmddHHMMSS}` for the given instant.
#[must_use]
pub fn generate_bill_number(now: DateTime<Utc>) -> String {
    format!("BILL-{}", now.format("%Y%m%d%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_sheet_row_with_missing_cells() {
        let row = vec!["BILL-001".to_string(), "Rajesh Kumar".to_string()];
        let bill = SheetBill::from_row(&row);
        assert_eq!(bill.bill_id, "BILL-001");
        assert_eq!(bill.customer, "Rajesh Kumar");
        assert_eq!(bill.total, "");
        assert_eq!(bill.date, "");
    }

    #[test]
    fn test_sheet_bill_serializes_camel_case() {
        let bill = SheetBill::from_row(&["B1".into(), "C".into(), "10".into(), "2025-04-21".into()]);
        let value = serde_json::to_value(&bill).unwrap();
        assert_eq!(value["billId"], "B1");
        assert_eq!(value["date"], "2025-04-21");
    }

    #[test]
    fn test_into_record_generates_number_and_date() {
        let now = Utc.with_ymd_and_hms(2025, 4, 21, 10, 30, 0).unwrap();
        let input = NewSheetBill {
            bill_id: None,
            customer: " Meena Patel ".to_string(),
            total: dec!(15800.00),
            date: None,
        };

        let record = input.into_record(now).unwrap();
        assert_eq!(record.bill_id, "BILL-20250421103000");
        assert_eq!(record.customer, "Meena Patel");
        assert_eq!(record.total, "15800");
        assert_eq!(record.date, "2025-04-21");
    }

    #[test]
    fn test_into_record_keeps_explicit_number() {
        let input = NewSheetBill {
            bill_id: Some("BILL-007".to_string()),
            customer: "Anita Kumari".to_string(),
            total: dec!(9300.50),
            date: NaiveDate::from_ymd_opt(2025, 4, 5),
        };
        let record = input.into_record(Utc::now()).unwrap();
        assert_eq!(record.bill_id, "BILL-007");
        assert_eq!(record.total, "9300.5");
        assert_eq!(record.date, "2025-04-05");
    }

    #[test]
    fn test_into_record_rejects_zero_total() {
        let input = NewSheetBill {
            bill_id: None,
            customer: "X".to_string(),
            total: Decimal::ZERO,
            date: None,
        };
        assert!(matches!(
            input.into_record(Utc::now()),
            Err(DomainError::NonPositiveAmount(_))
        ));
    }

    #[test]
    fn test_relational_bill_search_and_validation() {
        let bill = Bill {
            id: BillId::new(4),
            org_id: OrganizationId::new(),
            farmer_id: FarmerId::new(),
            content: json!({ "items": "Rice (40 bags)", "status": "Pending" }),
            created_by: None,
            created_at: Utc::now(),
        };
        assert!(bill.matches_search("pending"));
        assert!(bill.matches_search("rice"));
        assert!(!bill.matches_search("cotton"));

        let empty = NewBill {
            farmer_id: FarmerId::new(),
            content: json!({}),
        };
        assert_eq!(
            empty.validate().unwrap_err(),
            DomainError::Required { field: "content" }
        );
    }
}
