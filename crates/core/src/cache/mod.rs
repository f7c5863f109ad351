//! Org-scoped cache of named query results using Moka.
//!
//! Entries are keyed by organization and [`QueryName`]. Values are stored
//! type-erased and read back with [`QueryCache::get`]. Invalidation removes
//! the entry so the next read refetches.
//!
//! Each key carries a generation that invalidation bumps. A fetch that was
//! already running when its key was invalidated still answers its caller,
//! but its result is not stored.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use moka::Expiry;
use moka::sync::Cache;
use serde::Serialize;
use tracing::debug;

use khata_shared::types::OrganizationId;

/// Default cache capacity (number of result sets).
const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

/// Default time-to-live for a result set (5 minutes).
const DEFAULT_TTL_SECS: u64 = 300;

/// Freshness of spreadsheet bills.
const SHEET_BILLS_TTL: Duration = Duration::from_secs(30);

/// A named result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryName {
    /// Farmer list.
    Farmers,
    /// Transaction list.
    Transactions,
    /// Inventory list.
    Inventory,
    /// Relational bill list.
    Bills,
    /// Spreadsheet bill list.
    SheetBills,
    /// Dashboard aggregates.
    DashboardStats,
    /// Organization settings.
    OrgSettings,
}

impl QueryName {
    /// Lifetime override for this result set, if any.
    #[must_use]
    pub const fn ttl(self) -> Option<Duration> {
        match self {
            Self::SheetBills => Some(SHEET_BILLS_TTL),
            _ => None,
        }
    }
}

/// Cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey {
    /// Owning organization.
    pub org: OrganizationId,
    /// Result set.
    pub name: QueryName,
}

impl QueryKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(org: OrganizationId, name: QueryName) -> Self {
        Self { org, name }
    }
}

type Entry = Arc<dyn Any + Send + Sync>;

struct QueryExpiry {
    default_ttl: Duration,
}

impl QueryExpiry {
    fn ttl_for(&self, key: &QueryKey) -> Duration {
        key.name.ttl().unwrap_or(self.default_ttl)
    }
}

impl Expiry<QueryKey, Entry> for QueryExpiry {
    fn expire_after_create(
        &self,
        key: &QueryKey,
        _value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(self.ttl_for(key))
    }

    fn expire_after_update(
        &self,
        key: &QueryKey,
        _value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(self.ttl_for(key))
    }
}

/// Shared query result cache. Cloning shares the underlying store.
#[derive(Clone)]
pub struct QueryCache {
    cache: Cache<QueryKey, Entry>,
    generations: Arc<DashMap<QueryKey, u64>>,
}

impl QueryCache {
    /// Creates a cache with default settings.
    ///
    /// Default: 1000 entries max, 5 minute TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache with custom capacity and default TTL.
    /// Spreadsheet bills always expire after 30 seconds.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(QueryExpiry {
                default_ttl: Duration::from_secs(ttl_secs),
            })
            .build();

        Self {
            cache,
            generations: Arc::new(DashMap::new()),
        }
    }

    fn generation(&self, key: &QueryKey) -> u64 {
        self.generations.get(key).map_or(0, |g| *g)
    }

    /// Cached value for `key`, if present and of type `T`.
    #[must_use]
    pub fn get<T>(&self, key: &QueryKey) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.cache.get(key)?.downcast::<T>().ok()
    }

    /// Stores `value` under `key`, replacing whatever was there.
    pub fn insert<T>(&self, key: QueryKey, value: Arc<T>)
    where
        T: Send + Sync + 'static,
    {
        let entry: Entry = value;
        self.cache.insert(key, entry);
    }

    /// Returns the cached value or runs `fetch` and caches its result.
    ///
    /// # Errors
    ///
    /// Propagates the fetch error. Nothing is cached on failure.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(&key) {
            return Ok(hit);
        }
        self.refetch(key, fetch).await
    }

    /// Runs `fetch` and overwrites the entry with its result.
    ///
    /// If `key` is invalidated while `fetch` runs, the result is returned
    /// but not stored.
    ///
    /// # Errors
    ///
    /// Propagates the fetch error. The previous entry is left in place.
    pub async fn refetch<T, E, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let started = self.generation(&key);
        let value = Arc::new(fetch().await?);

        // The generation guard is held across the insert so an invalidation
        // cannot slip in between the check and the write.
        let current = self.generations.entry(key).or_insert(0);
        if *current == started {
            let entry: Entry = Arc::clone(&value) as Entry;
            self.cache.insert(key, entry);
        } else {
            debug!(org_id = %key.org, query = ?key.name, "Result went stale while fetching, not cached");
        }
        drop(current);

        Ok(value)
    }

    /// Marks one result set stale.
    pub fn invalidate(&self, key: &QueryKey) {
        let mut generation = self.generations.entry(*key).or_insert(0);
        *generation += 1;
        self.cache.invalidate(key);
    }

    /// Marks several result sets of one organization stale.
    pub fn invalidate_many(&self, org: OrganizationId, names: &[QueryName]) {
        for &name in names {
            self.invalidate(&QueryKey::new(org, name));
        }
    }

    /// Whether `key` currently has an entry.
    #[must_use]
    pub fn contains(&self, key: &QueryKey) -> bool {
        self.cache.contains_key(key)
    }

    /// Returns the number of entries currently in the cache.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs cache maintenance tasks.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

/// What a live view currently shows.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum QueryState<T> {
    /// First fetch in flight.
    Loading,
    /// Latest successful result.
    Ready {
        /// Result set.
        data: Arc<T>,
    },
    /// Latest fetch failed. No automatic retry.
    Failed {
        /// Error shown to the user.
        message: String,
    },
}

impl<T> QueryState<T> {
    /// The data, when ready.
    #[must_use]
    pub fn data(&self) -> Option<&Arc<T>> {
        match self {
            Self::Ready { data } => Some(data),
            _ => None,
        }
    }

    /// Whether the first fetch is still pending.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Loading => Self::Loading,
            Self::Ready { data } => Self::Ready {
                data: Arc::clone(data),
            },
            Self::Failed { message } => Self::Failed {
                message: message.clone(),
            },
        }
    }
}
