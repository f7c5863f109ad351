//! Core business logic for Khata.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here, together
//! with the realtime sync layer that keeps cached query results fresh.
//!
//! # Modules
//!
//! - `tenancy` - Organizations, profiles, and the per-request session
//! - `farmer` - Farmers and balance drift reporting
//! - `ledger` - Money given and received
//! - `inventory` - Bags lent and returned
//! - `billing` - Bills in either store, bill quotes
//! - `dashboard` - Aggregate statistics
//! - `notification` - Outbound WhatsApp message stub
//! - `cache` - Org-scoped query result cache
//! - `sync` - Change channels, invalidation, and live views

pub mod billing;
pub mod cache;
pub mod dashboard;
pub mod error;
pub mod farmer;
pub mod inventory;
pub mod ledger;
pub mod notification;
pub mod search;
pub mod sync;
pub mod tenancy;

pub use error::DomainError;
