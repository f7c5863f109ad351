//! Property-based tests for inventory status and totals.

use chrono::Utc;
use proptest::prelude::*;

use khata_shared::types::{FarmerId, InventoryItemId, OrganizationId};

use super::summary::{InventorySummary, return_percentage};
use super::types::{InventoryItem, InventoryStatus};

fn item(given: u32, returned: u32) -> InventoryItem {
    InventoryItem {
        id: InventoryItemId::new(1),
        org_id: OrganizationId::new(),
        farmer_id: FarmerId::new(),
        farmer_name: None,
        product: "Rice".to_string(),
        bags_given: given,
        bags_returned: returned,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

proptest! {
    #[test]
    fn prop_status_active_iff_bags_outstanding(given in 0u32..10_000, returned in 0u32..10_000) {
        let it = item(given, returned);
        let expected = if returned < given {
            InventoryStatus::Active
        } else {
            InventoryStatus::Completed
        };
        prop_assert_eq!(it.status(), expected);
        prop_assert_eq!(it.status() == InventoryStatus::Active, it.outstanding() > 0);
    }

    #[test]
    fn prop_percentage_bounded_when_invariant_holds(given in 1u64..1_000_000, frac in 0u64..=100) {
        let returned = given * frac / 100;
        let pct = return_percentage(given, returned);
        prop_assert!(pct <= 100);
    }

    #[test]
    fn prop_summary_outstanding_matches_items(
        pairs in prop::collection::vec((0u32..500, 0u32..500), 0..20)
    ) {
        let items: Vec<_> = pairs
            .iter()
            .map(|&(g, r)| item(g, r.min(g)))
            .collect();
        let summary = InventorySummary::from_items(&items);
        let outstanding: i64 = items.iter().map(|i| i64::from(i.outstanding())).sum();
        prop_assert_eq!(summary.outstanding, outstanding);
    }
}
