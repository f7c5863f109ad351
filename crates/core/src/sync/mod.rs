//! Realtime data synchronization.
//!
//! This module keeps cached query results in step with writes:
//! - [`SubscriptionManager`] owns one push channel per consumer
//! - [`CallbackCell`] lets the handler change without reopening the channel
//! - [`Screen`] declares which result sets a table change invalidates
//! - [`LiveView`] ties the three to the query cache
//!
//! Transports plug in through [`RealtimeTransport`]. [`InMemoryTransport`]
//! serves tests and single-node deployments; the Postgres transport lives in
//! the database crate.

pub mod cell;
pub mod invalidation;
pub mod live;
pub mod manager;
pub mod memory;
pub mod resource;
pub mod transport;


pub use cell::{Callback, CallbackCell};
pub use invalidation::{Screen, Watch, written_by};
pub use live::{Fetcher, LiveView, SyncContext};
pub use manager::SubscriptionManager;
pub use memory::InMemoryTransport;
pub use resource::{ChangeKind, ChangeNotification, EventFilter, Resource};
pub use transport::{ChannelSpec, DisabledTransport, RealtimeError, RealtimeTransport};
