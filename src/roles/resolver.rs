//! Polled cache of the logged-in user's role and permissions.
//!
//! A [`RoleResolver`] belongs to one browser session. It is created when the
//! session starts and torn down when it ends, and it is handed to whatever
//! renders that session's pages. It answers [`has_permission`] and
//! [`has_role`] synchronously from the last applied fetch.
//!
//! Polling does not deduplicate, so a slow fetch can overlap the next tick.
//! Each fetch is numbered when it is issued, and a result is applied only if
//! its number is higher than the one already applied. A late answer to an old
//! request is dropped instead of overwriting a newer one.
//!
//! The cache is a rendering hint, not a security boundary. Unknown state
//! (never fetched, fetch failed, shut down) answers `false` to every query.
//!
//! [`has_permission`]: RoleResolver::has_permission
//! [`has_role`]: RoleResolver::has_role

use std::{
    sync::{
        Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::{
    error::FetchError,
    roles::{fetcher::RoleFetcher, model::UserStatus},
};

/// How often the backend is polled unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Default)]
struct Cache {
    applied_seq: u64,
    status: Option<UserStatus>,
    closed: bool,
}

struct Shared {
    fetcher: Arc<dyn RoleFetcher>,
    next_seq: AtomicU64,
    cache: RwLock<Cache>,
}

impl Shared {
    // A poisoned lock still holds a consistent Cache: every writer assigns
    // whole fields.
    fn read(&self) -> RwLockReadGuard<'_, Cache> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Cache> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    // `shutdown` sets `closed` under the write lock, so a fetch created while
    // the read guard shows it open was issued before the resolver closed.
    async fn refresh(self: Arc<Self>) -> bool {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let pending = {
            let cache = self.read();
            if cache.closed {
                return false;
            }
            self.fetcher.fetch()
        };
        let result = pending.await;
        self.apply(seq, result)
    }

    fn apply(&self, seq: u64, result: Result<UserStatus, FetchError>) -> bool {
        let mut cache = self.write();
        if cache.closed {
            tracing::debug!(seq, "Role status arrived after shutdown, dropped");
            return false;
        }
        if seq <= cache.applied_seq {
            tracing::debug!(
                seq,
                applied_seq = cache.applied_seq,
                "Stale role status discarded"
            );
            return false;
        }

        cache.applied_seq = seq;
        cache.status = match result {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::debug!(seq, error = %e, "Role status unavailable");
                None
            }
        };
        true
    }
}

/// Session-scoped role/permission store.
pub struct RoleResolver {
    shared: Arc<Shared>,
    poller: Option<JoinHandle<()>>,
}

impl RoleResolver {
    /// Creates a resolver that only fetches when [`refresh`](Self::refresh)
    /// is called.
    pub fn new(fetcher: impl RoleFetcher) -> Self {
        Self::from_shared_fetcher(Arc::new(fetcher))
    }

    pub fn from_shared_fetcher(fetcher: Arc<dyn RoleFetcher>) -> Self {
        Self {
            shared: Arc::new(Shared {
                fetcher,
                next_seq: AtomicU64::new(0),
                cache: RwLock::new(Cache::default()),
            }),
            poller: None,
        }
    }

    /// Creates a resolver and starts polling on the current tokio runtime.
    ///
    /// The first fetch is issued immediately, then one every `interval`.
    pub fn start(fetcher: impl RoleFetcher, interval: Duration) -> Self {
        let mut resolver = Self::new(fetcher);
        resolver.spawn_poller(interval);
        resolver
    }

    fn spawn_poller(&mut self, interval: Duration) {
        let shared = self.shared.clone();
        let period = interval.max(MIN_POLL_INTERVAL);

        self.poller = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let closed = shared.read().closed;
                if closed {
                    break;
                }
                tokio::spawn(shared.clone().refresh());
            }
        }));

        tracing::debug!(interval_ms = period.as_millis() as u64, "Role polling started");
    }

    /// Issues one fetch now and waits for it. Returns whether the result was
    /// applied; `false` means it was stale or the resolver is shut down.
    pub async fn refresh(&self) -> bool {
        self.shared.clone().refresh().await
    }

    pub fn has_permission(&self, code: &str) -> bool {
        self.shared
            .read()
            .status
            .as_ref()
            .is_some_and(|s| s.has_permission(code))
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.shared
            .read()
            .status
            .as_ref()
            .is_some_and(|s| s.has_role(name))
    }

    /// The last applied status, if the last applied fetch succeeded.
    pub fn snapshot(&self) -> Option<UserStatus> {
        self.shared.read().status.clone()
    }

    /// Sequence number of the last applied fetch; 0 before the first.
    pub fn applied_seq(&self) -> u64 {
        self.shared.read().applied_seq
    }

    pub fn is_closed(&self) -> bool {
        self.shared.read().closed
    }

    /// Stops polling. Fetches still in flight finish but are not applied, and
    /// refreshes that have not issued their fetch yet never do. Later calls do
    /// nothing.
    pub fn shutdown(&self) {
        {
            let mut cache = self.shared.write();
            if cache.closed {
                return;
            }
            cache.closed = true;
        }
        if let Some(poller) = &self.poller {
            poller.abort();
        }
        tracing::debug!("Role resolver shut down");
    }
}

impl Drop for RoleResolver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for RoleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.shared.read();
        f.debug_struct("RoleResolver")
            .field("applied_seq", &cache.applied_seq)
            .field("status", &cache.status)
            .field("closed", &cache.closed)
            .field("polling", &self.poller.is_some())
            .finish()
    }
}
