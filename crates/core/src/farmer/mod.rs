//! Farmers and their running balances.
//!
//! - Farmer records and write inputs
//! - Balance derivation from transactions and drift reporting

pub mod balance;
pub mod types;

pub use balance::{BalanceDirection, BalanceReport, derived_balance, reconcile};
pub use types::{Farmer, FarmerUpdate, NewFarmer};
