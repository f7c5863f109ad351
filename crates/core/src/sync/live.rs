//! Live views: a cached result set kept fresh by change notifications.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use khata_shared::AppError;
use khata_shared::types::OrganizationId;

use crate::cache::{QueryCache, QueryKey, QueryState};

use super::invalidation::Screen;
use super::manager::SubscriptionManager;
use super::transport::RealtimeTransport;

/// Loads a screen's result set from the backend.
pub type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, AppError>> + Send + Sync>;

/// Handles shared by every live view: the query cache and the realtime
/// transport.
#[derive(Clone)]
pub struct SyncContext {
    cache: QueryCache,
    transport: Arc<dyn RealtimeTransport>,
}

impl SyncContext {
    /// Creates a context.
    #[must_use]
    pub fn new(cache: QueryCache, transport: Arc<dyn RealtimeTransport>) -> Self {
        Self { cache, transport }
    }

    /// The query cache.
    #[must_use]
    pub const fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// The realtime transport.
    #[must_use]
    pub fn transport(&self) -> Arc<dyn RealtimeTransport> {
        Arc::clone(&self.transport)
    }
}

impl std::fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncContext")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// One mounted screen.
///
/// Mounting opens a channel per watched table and starts loading. Each
/// notification invalidates the mapped result sets and triggers a full
/// refetch of the displayed one. Dropping the view closes every channel.
pub struct LiveView<T> {
    screen: Screen,
    state: watch::Receiver<QueryState<T>>,
    refresh: mpsc::UnboundedSender<()>,
    managers: Vec<SubscriptionManager>,
    refresher: JoinHandle<()>,
}

impl<T> LiveView<T>
where
    T: Send + Sync + 'static,
{
    /// Mounts `screen` for `org`.
    ///
    /// Channels that fail to open are skipped; the view then only refreshes
    /// on [`LiveView::refresh`].
    pub async fn mount(
        ctx: &SyncContext,
        org: OrganizationId,
        screen: Screen,
        fetch: Fetcher<T>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(QueryState::Loading);
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        let key = QueryKey::new(org, screen.displays());

        let refresher = tokio::spawn(refresh_loop(
            ctx.cache.clone(),
            key,
            fetch,
            state_tx,
            refresh_rx,
        ));

        let mut managers = Vec::with_capacity(screen.watches().len());
        for watch in screen.watches() {
            let mut manager =
                SubscriptionManager::new(format!("{screen}-{org}"), ctx.transport());
            let cache = ctx.cache.clone();
            let signal = refresh_tx.clone();
            let invalidates = watch.invalidates;
            manager.set_callback(move |notification| {
                cache.invalidate_many(org, invalidates);
                if signal.send(()).is_err() {
                    debug!(table = %notification.resource, "Live view gone, refresh skipped");
                }
            });

            if manager.activate(watch.resource, watch.filter).await.is_ok() {
                managers.push(manager);
            }
        }

        debug!(%screen, org_id = %org, channels = managers.len(), "Live view mounted");

        Self {
            screen,
            state: state_rx,
            refresh: refresh_tx,
            managers,
            refresher,
        }
    }

    /// Mounted screen.
    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.screen
    }

    /// A receiver that observes every state change.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<QueryState<T>> {
        self.state.clone()
    }

    /// Current state.
    #[must_use]
    pub fn current(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    /// Requests a refetch. Returns `false` if the view has stopped.
    pub fn refresh(&self) -> bool {
        self.refresh.send(()).is_ok()
    }

    /// Whether at least one channel is open.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.managers.is_empty()
    }

    /// Number of open channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.managers.iter().filter(|m| m.is_active()).count()
    }
}

impl<T> Drop for LiveView<T> {
    fn drop(&mut self) {
        for manager in &mut self.managers {
            manager.deactivate();
        }
        self.refresher.abort();
        debug!(screen = %self.screen, "Live view unmounted");
    }
}

async fn refresh_loop<T>(
    cache: QueryCache,
    key: QueryKey,
    fetch: Fetcher<T>,
    state: watch::Sender<QueryState<T>>,
    mut signals: mpsc::UnboundedReceiver<()>,
) where
    T: Send + Sync + 'static,
{
    let first = cache.get_or_fetch(key, || fetch()).await;
    publish(&state, key, first);

    while signals.recv().await.is_some() {
        let next = cache.refetch(key, || fetch()).await;
        publish(&state, key, next);
    }
}

fn publish<T>(
    state: &watch::Sender<QueryState<T>>,
    key: QueryKey,
    result: Result<Arc<T>, AppError>,
) {
    let next = match result {
        Ok(data) => QueryState::Ready { data },
        Err(e) => {
            warn!(org_id = %key.org, query = ?key.name, error = %e, "Live view fetch failed");
            QueryState::Failed {
                message: e.to_string(),
            }
        }
    };
    state.send_replace(next);
}
