//! The push-channel seam between the sync layer and a realtime backend.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::resource::{ChangeNotification, EventFilter, Resource};

/// Errors raised by realtime transports.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// The backend refused or failed to open the channel.
    #[error("failed to open channel {channel}: {reason}")]
    Open {
        /// Channel name.
        channel: String,
        /// Backend message.
        reason: String,
    },

    /// A pushed payload could not be parsed.
    #[error("malformed change payload: {0}")]
    Payload(String),

    /// Realtime delivery is turned off for this deployment.
    #[error("realtime notifications are disabled")]
    Disabled,
}

/// What a channel listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    /// Unique channel name.
    pub name: String,
    /// Watched table.
    pub resource: Resource,
    /// Accepted change kinds.
    pub filter: EventFilter,
}

/// A realtime backend that can open and close named channels.
///
/// Implementations deliver only notifications that pass the channel's
/// filter, and stop delivering once `close` is called or the receiver is
/// dropped.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Opens a channel and returns its notification stream.
    ///
    /// # Errors
    ///
    /// Returns `RealtimeError` if the backend cannot open the channel.
    async fn open(
        &self,
        spec: &ChannelSpec,
    ) -> Result<mpsc::Receiver<ChangeNotification>, RealtimeError>;

    /// Closes a channel. Closing an unknown channel is a no-op.
    fn close(&self, name: &str);
}

/// Transport used when realtime is switched off. Every open fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTransport;

#[async_trait]
impl RealtimeTransport for DisabledTransport {
    async fn open(
        &self,
        _spec: &ChannelSpec,
    ) -> Result<mpsc::Receiver<ChangeNotification>, RealtimeError> {
        Err(RealtimeError::Disabled)
    }

    fn close(&self, _name: &str) {}
}
