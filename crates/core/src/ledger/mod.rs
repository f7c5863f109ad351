//! Money given to and received from farmers.
//!
//! This module implements the transaction side of the books:
//! - Domain types for recorded and new transactions
//! - Amount validation
//! - List filtering by tab and search term
//! - Monthly totals and recent activity

pub mod summary;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use summary::{MonthlyTotals, monthly_totals, recent};
pub use types::{NewTransaction, Transaction, TransactionFilter, TransactionTab, TransactionType};
pub use validation::validate_amount;
