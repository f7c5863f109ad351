//! Dashboard statistics.
//!
//! This module provides:
//! - Headline counters for the dashboard cards
//! - The current-month window used for "this month" counts

pub mod stats;
pub mod types;

pub use stats::month_window;
pub use types::{DashboardOverview, DashboardStats};
