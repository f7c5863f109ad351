//! Realtime transport over Postgres `LISTEN`/`NOTIFY`.
//!
//! One `PgListener` connection serves every channel the transport opens. A
//! background task owns it, issues `LISTEN {prefix}:{table}` the first time
//! a table is watched and `UNLISTEN` when its last channel goes away. Each
//! payload is parsed once and fanned out to the channels whose resource and
//! filter admit it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::postgres::PgListener;
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, info, warn};

use khata_core::sync::{
    ChangeNotification, ChannelSpec, EventFilter, RealtimeError, RealtimeTransport, Resource,
};
use khata_shared::config::RealtimeConfig;

type Subscribers = Arc<DashMap<String, Subscriber>>;

/// An open channel as the listener task sees it.
struct Subscriber {
    notify: String,
    resource: Resource,
    filter: EventFilter,
    tx: mpsc::Sender<ChangeNotification>,
    commands: mpsc::UnboundedSender<Command>,
}

enum Command {
    Listen {
        notify: String,
        reply: oneshot::Sender<Result<(), String>>,
    },
    Unlisten {
        notify: String,
    },
}

/// Shares one `PgListener` between all open channels.
pub struct PgNotifyTransport {
    url: String,
    prefix: String,
    buffer: usize,
    subscribers: Subscribers,
    listener: Mutex<Option<mpsc::UnboundedSender<Command>>>,
}

impl PgNotifyTransport {
    /// Creates a transport. The listener connects on the first open.
    #[must_use]
    pub fn new(url: impl Into<String>, config: &RealtimeConfig) -> Self {
        Self {
            url: url.into(),
            prefix: config.channel_prefix.clone(),
            buffer: config.buffer.max(1),
            subscribers: Arc::new(DashMap::new()),
            listener: Mutex::new(None),
        }
    }

    /// The `NOTIFY` channel carrying changes to `table`.
    #[must_use]
    pub fn notify_channel(&self, table: &str) -> String {
        format!("{}:{table}", self.prefix)
    }

    /// Number of channels currently open.
    #[must_use]
    pub fn open_channels(&self) -> usize {
        self.subscribers.len()
    }

    /// The running listener task, connecting a new one if none is alive.
    async fn listener(&self) -> Result<mpsc::UnboundedSender<Command>, sqlx::Error> {
        let mut slot = self.listener.lock().await;
        if let Some(commands) = slot.as_ref().filter(|c| !c.is_closed()) {
            return Ok(commands.clone());
        }

        let listener = PgListener::connect(&self.url).await?;
        let (commands, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_listener(listener, rx, Arc::clone(&self.subscribers)));
        info!(prefix = %self.prefix, "Realtime listener connected");

        *slot = Some(commands.clone());
        Ok(commands)
    }
}

impl std::fmt::Debug for PgNotifyTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgNotifyTransport")
            .field("prefix", &self.prefix)
            .field("buffer", &self.buffer)
            .field("open_channels", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RealtimeTransport for PgNotifyTransport {
    async fn open(
        &self,
        spec: &ChannelSpec,
    ) -> Result<mpsc::Receiver<ChangeNotification>, RealtimeError> {
        let open_err = |reason: String| RealtimeError::Open {
            channel: spec.name.clone(),
            reason,
        };

        if self.subscribers.contains_key(&spec.name) {
            return Err(open_err("channel name already in use".to_string()));
        }

        let notify = self.notify_channel(spec.resource.table());
        let commands = self
            .listener()
            .await
            .map_err(|e| open_err(e.to_string()))?;

        let (reply, listened) = oneshot::channel();
        commands
            .send(Command::Listen {
                notify: notify.clone(),
                reply,
            })
            .map_err(|_| open_err("listener stopped".to_string()))?;
        listened
            .await
            .map_err(|_| open_err("listener stopped".to_string()))?
            .map_err(open_err)?;

        let (tx, rx) = mpsc::channel(self.buffer);
        self.subscribers.insert(
            spec.name.clone(),
            Subscriber {
                notify: notify.clone(),
                resource: spec.resource,
                filter: spec.filter,
                tx,
                commands,
            },
        );

        debug!(channel = %spec.name, notify = %notify, filter = spec.filter.as_str(), "Listening");
        Ok(rx)
    }

    fn close(&self, name: &str) {
        if let Some((_, subscriber)) = self.subscribers.remove(name) {
            release(&subscriber);
            debug!(channel = %name, "Stopped listening");
        }
    }
}

/// Hands a removed channel's table back to its listener task.
fn release(subscriber: &Subscriber) {
    // A stopped listener has nothing left to unlisten.
    let _ = subscriber.commands.send(Command::Unlisten {
        notify: subscriber.notify.clone(),
    });
}

/// Reference counts of the `NOTIFY` channels the connection listens on.
#[derive(Debug, Default)]
struct ListenSet {
    counts: HashMap<String, usize>,
}

impl ListenSet {
    /// Whether `notify` is already listened on.
    fn contains(&self, notify: &str) -> bool {
        self.counts.contains_key(notify)
    }

    /// Counts one more channel on `notify`. True when it is the first.
    fn acquire(&mut self, notify: &str) -> bool {
        let count = self.counts.entry(notify.to_string()).or_default();
        *count += 1;
        *count == 1
    }

    /// Counts one channel fewer on `notify`. True when it was the last.
    fn release(&mut self, notify: &str) -> bool {
        let Some(count) = self.counts.get_mut(notify) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.counts.remove(notify);
            return true;
        }
        false
    }
}

async fn run_listener(
    mut listener: PgListener,
    mut commands: mpsc::UnboundedReceiver<Command>,
    subscribers: Subscribers,
) {
    let mut listening = ListenSet::default();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                None => break,
                Some(Command::Listen { notify, reply }) => {
                    let result = if listening.contains(&notify) {
                        Ok(())
                    } else {
                        listener.listen(&notify).await.map_err(|e| e.to_string())
                    };
                    if result.is_ok() {
                        listening.acquire(&notify);
                    }
                    let _ = reply.send(result);
                }
                Some(Command::Unlisten { notify }) => {
                    if listening.release(&notify) {
                        if let Err(e) = listener.unlisten(&notify).await {
                            warn!(notify = %notify, error = %e, "Failed to unlisten");
                        }
                    }
                }
            },
            received = listener.recv() => match received {
                Ok(message) => {
                    for name in dispatch(&subscribers, message.channel(), message.payload()) {
                        // Receiver dropped without a close.
                        if let Some((_, gone)) =
                            subscribers.remove_if(&name, |_, s| s.tx.is_closed())
                        {
                            release(&gone);
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Listener connection failed");
                    break;
                }
            },
        }
    }

    // Closing every receiver tells the live views their channels are gone.
    subscribers.clear();
    debug!("Realtime listener stopped");
}

/// Delivers one payload to every channel that admits it. Returns the names
/// of channels whose receivers are gone.
fn dispatch(subscribers: &DashMap<String, Subscriber>, notify: &str, payload: &str) -> Vec<String> {
    let change = match ChangeNotification::from_payload(payload) {
        Ok(change) => change,
        Err(e) => {
            warn!(notify = %notify, error = %e, "Ignoring change payload");
            return Vec::new();
        }
    };

    let mut closed = Vec::new();
    for entry in subscribers.iter() {
        let subscriber = entry.value();
        if subscriber.notify != notify
            || subscriber.resource != change.resource
            || !subscriber.filter.admits(change.kind)
        {
            continue;
        }
        match subscriber.tx.try_send(change.clone()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(channel = %entry.key(), "Channel full, notification dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => closed.push(entry.key().clone()),
        }
    }
    closed
}

#[cfg(test)]
mod tests {
    use super::*;
    use khata_core::sync::ChangeKind;

    fn transport() -> PgNotifyTransport {
        PgNotifyTransport::new(
            "postgres://127.0.0.1:1/unreachable",
            &RealtimeConfig {
                channel_prefix: "khata".to_string(),
                ..RealtimeConfig::default()
            },
        )
    }

    fn subscriber(
        resource: Resource,
        filter: EventFilter,
    ) -> (Subscriber, mpsc::Receiver<ChangeNotification>, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::channel(4);
        let (commands, command_rx) = mpsc::unbounded_channel();
        let subscriber = Subscriber {
            notify: format!("khata:{}", resource.table()),
            resource,
            filter,
            tx,
            commands,
        };
        (subscriber, rx, command_rx)
    }

    #[test]
    fn test_notify_channel_uses_prefix() {
        assert_eq!(transport().notify_channel("farmers"), "khata:farmers");
    }

    #[tokio::test]
    async fn test_open_reports_connection_failure() {
        let transport = transport();
        let spec = ChannelSpec {
            name: "dashboard-farmers-1".to_string(),
            resource: Resource::Farmers,
            filter: EventFilter::All,
        };

        let err = transport.open(&spec).await.unwrap_err();

        assert!(matches!(err, RealtimeError::Open { ref channel, .. } if channel == "dashboard-farmers-1"));
        assert_eq!(transport.open_channels(), 0);
    }

    #[test]
    fn test_close_unknown_channel_is_noop() {
        let transport = transport();
        transport.close("missing");
        assert_eq!(transport.open_channels(), 0);
    }

    #[test]
    fn test_table_listened_once_across_channels() {
        let mut listening = ListenSet::default();

        assert!(listening.acquire("khata:farmers"));
        assert!(!listening.acquire("khata:farmers"));
        assert!(listening.acquire("khata:inventory"));

        assert!(!listening.release("khata:farmers"));
        assert!(listening.contains("khata:farmers"));
        assert!(listening.release("khata:farmers"));
        assert!(!listening.contains("khata:farmers"));
        assert!(!listening.release("khata:farmers"));
    }

    #[test]
    fn test_payload_fans_out_by_table_and_filter() {
        let subscribers = DashMap::new();
        let (all, mut all_rx, _c1) = subscriber(Resource::Farmers, EventFilter::All);
        let (inserts, mut inserts_rx, _c2) = subscriber(Resource::Farmers, EventFilter::Insert);
        let (stock, mut stock_rx, _c3) = subscriber(Resource::Inventory, EventFilter::All);
        subscribers.insert("farmers-all".to_string(), all);
        subscribers.insert("farmers-insert".to_string(), inserts);
        subscribers.insert("inventory-all".to_string(), stock);

        let closed = dispatch(
            &subscribers,
            "khata:farmers",
            r#"{"type":"UPDATE","table":"farmers","record":{"name":"Dinesh"}}"#,
        );

        assert!(closed.is_empty());
        let change = all_rx.try_recv().unwrap();
        assert_eq!(change.kind, ChangeKind::Update);
        assert_eq!(change.record.unwrap()["name"], "Dinesh");
        assert!(inserts_rx.try_recv().is_err());
        assert!(stock_rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_receiver_reported_closed() {
        let subscribers = DashMap::new();
        let (farmers, rx, _commands) = subscriber(Resource::Farmers, EventFilter::All);
        subscribers.insert("farmers-all".to_string(), farmers);
        drop(rx);

        let closed = dispatch(
            &subscribers,
            "khata:farmers",
            r#"{"type":"DELETE","table":"farmers","old_record":{"id":"x"}}"#,
        );

        assert_eq!(closed, ["farmers-all"]);
    }

    #[test]
    fn test_malformed_payload_delivers_nothing() {
        let subscribers = DashMap::new();
        let (farmers, mut rx, _commands) = subscriber(Resource::Farmers, EventFilter::All);
        subscribers.insert("farmers-all".to_string(), farmers);

        assert!(dispatch(&subscribers, "khata:farmers", "not json").is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_close_hands_table_back_to_listener() {
        let transport = transport();
        let (farmers, _rx, mut commands) = subscriber(Resource::Farmers, EventFilter::All);
        transport
            .subscribers
            .insert("farmers-all".to_string(), farmers);

        transport.close("farmers-all");

        assert_eq!(transport.open_channels(), 0);
        assert!(matches!(
            commands.recv().await,
            Some(Command::Unlisten { ref notify }) if notify == "khata:farmers"
        ));
    }
}
