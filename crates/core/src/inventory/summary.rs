//! Totals across an organization's inventory.

use serde::Serialize;

use super::types::InventoryItem;

/// Aggregate bag counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InventorySummary {
    /// Bags handed out.
    pub total_given: u64,
    /// Bags brought back.
    pub total_returned: u64,
    /// `total_given - total_returned`. Negative only if the unenforced
    /// `returned <= given` invariant was broken somewhere.
    pub outstanding: i64,
    /// Returned share of given bags, rounded to a whole percent.
    pub return_percentage: u32,
}

impl InventorySummary {
    /// Summarizes a set of items.
    #[must_use]
    pub fn from_items<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a InventoryItem>,
    {
        let (given, returned) = items.into_iter().fold((0u64, 0u64), |(g, r), item| {
            (g + u64::from(item.bags_given), r + u64::from(item.bags_returned))
        });
        Self::from_totals(given, returned)
    }

    /// Builds a summary from raw totals.
    #[must_use]
    pub fn from_totals(total_given: u64, total_returned: u64) -> Self {
        Self {
            total_given,
            total_returned,
            outstanding: i64::try_from(total_given).unwrap_or(i64::MAX)
                - i64::try_from(total_returned).unwrap_or(i64::MAX),
            return_percentage: return_percentage(total_given, total_returned),
        }
    }
}

/// `round(returned / given * 100)`, half rounding up; 0 when nothing was given.
#[must_use]
pub fn return_percentage(given: u64, returned: u64) -> u32 {
    if given == 0 {
        return 0;
    }
    let scaled = (u128::from(returned) * 100 + u128::from(given) / 2) / u128::from(given);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}
