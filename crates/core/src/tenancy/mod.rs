//! Organizations, profiles, and the per-request session context.
//!
//! Every read and write is scoped to the caller's organization. The session
//! context is the only place that resolves it.

pub mod session;
pub mod types;

pub use session::{AdminAction, SessionContext, TenantScope};
pub use types::{BankInfo, BusinessInfo, IntegrationSettings, OrgSettings, Organization, Profile, Role};
