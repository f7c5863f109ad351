//! Bills, stored either as relational rows or as spreadsheet rows.
//!
//! The two stores carry different shapes and are never merged. Which one is
//! active is a deployment choice.

pub mod quote;
pub mod types;

pub use quote::BillQuote;
pub use types::{Bill, NewBill, NewSheetBill, SheetBill};
