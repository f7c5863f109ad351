//! Per-consumer channel lifecycle.
//!
//! A [`SubscriptionManager`] owns at most one open channel. Activating again
//! closes the previous channel before the new one is opened, and dropping the
//! manager closes whatever is open.
//!
//! Every delivery happens under the read side of a per-channel gate. Closing
//! takes the write side and flips the gate shut, which waits out a callback
//! that is already running and refuses every notification after it.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use super::cell::{Callback, CallbackCell};
use super::resource::{ChangeNotification, EventFilter, Resource};
use super::transport::{ChannelSpec, RealtimeError, RealtimeTransport};

struct ActiveChannel {
    name: String,
    resource: Resource,
    filter: EventFilter,
    gate: Arc<RwLock<bool>>,
    cancel: CancellationToken,
}

/// Keeps a single live channel for one consumer.
pub struct SubscriptionManager {
    consumer: String,
    transport: Arc<dyn RealtimeTransport>,
    callback: Arc<CallbackCell>,
    active: Option<ActiveChannel>,
    activations: u64,
}

impl SubscriptionManager {
    /// Creates an inactive manager. `consumer` prefixes channel names.
    #[must_use]
    pub fn new(consumer: impl Into<String>, transport: Arc<dyn RealtimeTransport>) -> Self {
        Self {
            consumer: consumer.into(),
            transport,
            callback: Arc::new(CallbackCell::new()),
            active: None,
            activations: 0,
        }
    }

    /// Installs the notification handler. Takes effect for the next
    /// notification; the channel stays open.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn(&ChangeNotification) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        self.callback.replace(callback);
    }

    /// Removes the handler. Notifications are dropped until a new one is set.
    pub fn clear_callback(&self) {
        self.callback.clear();
    }

    /// Opens a channel for `resource`, closing any previous one first.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the channel cannot be opened. The
    /// manager is then inactive; there is no retry.
    pub async fn activate(
        &mut self,
        resource: Resource,
        filter: EventFilter,
    ) -> Result<(), RealtimeError> {
        self.deactivate();

        self.activations += 1;
        let name = format!(
            "{}-{}-{}-{}",
            self.consumer,
            resource.table(),
            self.activations,
            Uuid::new_v4().simple()
        );
        let spec = ChannelSpec {
            name: name.clone(),
            resource,
            filter,
        };

        let rx = match self.transport.open(&spec).await {
            Ok(rx) => rx,
            Err(e) => {
                warn!(
                    channel = %name,
                    table = %resource,
                    error = %e,
                    "Realtime channel unavailable, falling back to manual refresh"
                );
                return Err(e);
            }
        };
        debug!(channel = %name, table = %resource, filter = filter.as_str(), "Realtime channel opened");

        let gate = Arc::new(RwLock::new(true));
        let cancel = CancellationToken::new();
        tokio::spawn(dispatch(
            rx,
            cancel.clone(),
            Arc::clone(&gate),
            Arc::clone(&self.callback),
            name.clone(),
        ));

        self.active = Some(ActiveChannel {
            name,
            resource,
            filter,
            gate,
            cancel,
        });
        Ok(())
    }

    /// Closes the open channel. Returns `false` if nothing was open.
    ///
    /// When this returns, no callback is running for the closed channel and
    /// none will run again.
    pub fn deactivate(&mut self) -> bool {
        let Some(channel) = self.active.take() else {
            return false;
        };

        *channel.gate.write().unwrap_or_else(PoisonError::into_inner) = false;
        channel.cancel.cancel();
        self.transport.close(&channel.name);
        debug!(channel = %channel.name, "Realtime channel closed");
        true
    }

    /// Whether a channel is open.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Name of the open channel.
    #[must_use]
    pub fn channel_name(&self) -> Option<&str> {
        self.active.as_ref().map(|c| c.name.as_str())
    }

    /// Resource and filter of the open channel.
    #[must_use]
    pub fn watching(&self) -> Option<(Resource, EventFilter)> {
        self.active.as_ref().map(|c| (c.resource, c.filter))
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("consumer", &self.consumer)
            .field("channel", &self.channel_name())
            .field("activations", &self.activations)
            .finish_non_exhaustive()
    }
}

async fn dispatch(
    mut rx: mpsc::Receiver<ChangeNotification>,
    cancel: CancellationToken,
    gate: Arc<RwLock<bool>>,
    callback: Arc<CallbackCell>,
    name: String,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = rx.recv() => match next {
                Some(notification) => {
                    deliver(&gate, &callback, &notification, &name);
                }
                None => {
                    debug!(channel = %name, "Realtime stream ended");
                    break;
                }
            },
        }
    }
}

/// Runs the callback if the gate is still open. The read guard is held for
/// the whole invocation.
fn deliver(
    gate: &RwLock<bool>,
    callback: &CallbackCell,
    notification: &ChangeNotification,
    channel: &str,
) -> bool {
    let open = gate.read().unwrap_or_else(PoisonError::into_inner);
    if !*open {
        return false;
    }
    let delivered = callback.invoke(notification);
    if !delivered {
        debug!(
            channel,
            table = %notification.resource,
            kind = notification.kind.as_str(),
            "No callback registered, notification dropped"
        );
    }
    delivered
}
