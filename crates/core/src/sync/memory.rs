//! In-process transport.
//!
//! Used by tests and by single-node deployments where the API publishes its
//! own writes instead of listening to the database.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

use super::resource::{ChangeNotification, EventFilter, Resource};
use super::transport::{ChannelSpec, RealtimeError, RealtimeTransport};

const DEFAULT_BUFFER: usize = 64;

struct Subscriber {
    resource: Resource,
    filter: EventFilter,
    tx: mpsc::Sender<ChangeNotification>,
}

/// Fans published notifications out to matching open channels.
pub struct InMemoryTransport {
    channels: DashMap<String, Subscriber>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    buffer: usize,
}

impl InMemoryTransport {
    /// Creates a transport with the default per-channel buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_BUFFER)
    }

    /// Creates a transport whose channels hold up to `buffer` notifications.
    #[must_use]
    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            channels: DashMap::new(),
            opened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
            buffer: buffer.max(1),
        }
    }

    /// Pushes a notification to every open channel that accepts it.
    /// Returns how many channels it was queued on.
    ///
    /// A full channel drops the notification; the next one triggers the
    /// same refetch.
    pub fn publish(&self, notification: &ChangeNotification) -> usize {
        let mut delivered = 0;
        for entry in &self.channels {
            let sub = entry.value();
            if sub.resource != notification.resource || !sub.filter.admits(notification.kind) {
                continue;
            }
            match sub.tx.try_send(notification.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => debug!(channel = %entry.key(), error = %e, "Notification not queued"),
            }
        }
        delivered
    }

    /// Number of open channels on `resource`.
    #[must_use]
    pub fn open_channels(&self, resource: Resource) -> usize {
        self.channels
            .iter()
            .filter(|entry| entry.value().resource == resource)
            .count()
    }

    /// Channels opened since creation.
    #[must_use]
    pub fn opened_total(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Channels closed since creation.
    #[must_use]
    pub fn closed_total(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeTransport for InMemoryTransport {
    async fn open(
        &self,
        spec: &ChannelSpec,
    ) -> Result<mpsc::Receiver<ChangeNotification>, RealtimeError> {
        if self.channels.contains_key(&spec.name) {
            return Err(RealtimeError::Open {
                channel: spec.name.clone(),
                reason: "channel name already in use".to_string(),
            });
        }

        let (tx, rx) = mpsc::channel(self.buffer);
        self.channels.insert(
            spec.name.clone(),
            Subscriber {
                resource: spec.resource,
                filter: spec.filter,
                tx,
            },
        );
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }

    fn close(&self, name: &str) {
        if self.channels.remove(name).is_some() {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::resource::ChangeKind;

    fn spec(name: &str, resource: Resource, filter: EventFilter) -> ChannelSpec {
        ChannelSpec {
            name: name.to_string(),
            resource,
            filter,
        }
    }

    #[tokio::test]
    async fn test_publish_respects_resource_and_filter() {
        let transport = InMemoryTransport::new();
        let mut all = transport
            .open(&spec("a", Resource::Farmers, EventFilter::All))
            .await
            .unwrap();
        let mut deletes = transport
            .open(&spec("b", Resource::Farmers, EventFilter::Delete))
            .await
            .unwrap();
        let mut bills = transport
            .open(&spec("c", Resource::Bills, EventFilter::All))
            .await
            .unwrap();

        let n = ChangeNotification::new(Resource::Farmers, ChangeKind::Insert);
        assert_eq!(transport.publish(&n), 1);

        assert_eq!(all.recv().await.unwrap(), n);
        assert!(deletes.try_recv().is_err());
        assert!(bills.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_close_ends_stream_and_counts() {
        let transport = InMemoryTransport::new();
        let mut rx = transport
            .open(&spec("x", Resource::Inventory, EventFilter::All))
            .await
            .unwrap();
        assert_eq!(transport.open_channels(Resource::Inventory), 1);

        transport.close("x");
        transport.close("x");
        assert!(rx.recv().await.is_none());
        assert_eq!(transport.open_channels(Resource::Inventory), 0);
        assert_eq!(transport.opened_total(), 1);
        assert_eq!(transport.closed_total(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let transport = InMemoryTransport::new();
        let _rx = transport
            .open(&spec("dup", Resource::Bills, EventFilter::All))
            .await
            .unwrap();
        assert!(matches!(
            transport
                .open(&spec("dup", Resource::Bills, EventFilter::All))
                .await,
            Err(RealtimeError::Open { .. })
        ));
    }

    #[tokio::test]
    async fn test_full_channel_drops() {
        let transport = InMemoryTransport::with_buffer(1);
        let _rx = transport
            .open(&spec("f", Resource::Transactions, EventFilter::All))
            .await
            .unwrap();
        let n = ChangeNotification::new(Resource::Transactions, ChangeKind::Insert);
        assert_eq!(transport.publish(&n), 1);
        assert_eq!(transport.publish(&n), 0);
    }
}
