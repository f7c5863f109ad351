//! `SeaORM` entities for the hosted backend's tables.
//!
//! The schema and its row-level security policies are owned by the backend;
//! these definitions only mirror the columns this crate reads and writes.

pub mod bills;
pub mod farmers;
pub mod inventory;
pub mod organizations;
pub mod profiles;
pub mod transactions;
pub mod whatsapp_logs;

pub mod prelude {
    //! Entity aliases.

    pub use super::bills::Entity as Bills;
    pub use super::farmers::Entity as Farmers;
    pub use super::inventory::Entity as Inventory;
    pub use super::organizations::Entity as Organizations;
    pub use super::profiles::Entity as Profiles;
    pub use super::transactions::Entity as Transactions;
    pub use super::whatsapp_logs::Entity as WhatsappLogs;
}
