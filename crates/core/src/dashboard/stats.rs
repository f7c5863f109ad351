//! Dashboard counter computation.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use super::types::DashboardStats;

impl DashboardStats {
    /// Folds raw rows into the headline counters.
    ///
    /// Missing balances count as zero.
    #[must_use]
    pub fn from_parts<B, G>(balances: B, bags: G, monthly_transactions: u64) -> Self
    where
        B: IntoIterator<Item = Option<Decimal>>,
        G: IntoIterator<Item = (u32, u32)>,
    {
        let (total_farmers, pending_amount) = balances
            .into_iter()
            .fold((0u64, Decimal::ZERO), |(count, sum), balance| {
                (count + 1, sum + balance.unwrap_or_default())
            });
        let active_bags = bags
            .into_iter()
            .map(|(given, returned)| i64::from(given) - i64::from(returned))
            .sum();

        Self {
            total_farmers,
            pending_amount,
            active_bags,
            monthly_transactions,
        }
    }
}

/// Start of the month containing `now` and start of the next one, in UTC.
#[must_use]
pub fn month_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let (year, month) = (now.year(), now.month());
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    (
        first_instant(year, month).unwrap_or(now),
        first_instant(next_year, next_month).unwrap_or(now),
    )
}

fn first_instant(year: i32, month: u32) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_parts() {
        let stats = DashboardStats::from_parts(
            [Some(dec!(12500)), None, Some(dec!(-2000))],
            [(30, 12), (25, 25), (40, 0)],
            7,
        );

        assert_eq!(stats.total_farmers, 3);
        assert_eq!(stats.pending_amount, dec!(10500));
        assert_eq!(stats.active_bags, 58);
        assert_eq!(stats.monthly_transactions, 7);
    }

    #[test]
    fn test_empty_org_is_all_zero() {
        let stats = DashboardStats::from_parts(
            std::iter::empty(),
            std::iter::empty(),
            0,
        );
        assert_eq!(stats, DashboardStats::default());
    }

    #[test]
    fn test_month_window_mid_year() {
        let now = Utc.with_ymd_and_hms(2025, 4, 21, 15, 45, 0).unwrap();
        let (start, end) = month_window(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_month_window_december_rolls_year() {
        let now = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
        let (start, end) = month_window(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }
}
