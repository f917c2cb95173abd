//! Single-flight TTL cache
//!
//! One table holds both settled values and in-flight computations. The
//! lookup, the miss decision and the in-flight insert happen under a single
//! lock, so concurrent callers of a cold key always share one producer run.
//! Producers run on their own task: a caller that stops waiting never
//! cancels the work, and the result still lands in the table.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use log::{debug, warn};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::{Error, Result, panic_message};

type Value = Arc<dyn Any + Send + Sync>;
type Pending = Shared<BoxFuture<'static, Result<Value>>>;

/// Lifetime used when a caller does not pass one
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Upper bound for expiry arithmetic on absurdly long lifetimes
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Per-call options for [`Cache::get`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GetOptions {
    /// Lifetime of a successful result; zero disables storage
    pub ttl: Option<Duration>,

    /// How long this caller waits before giving up with [`Error::Timeout`]
    pub timeout: Option<Duration>,
}

impl GetOptions {
    pub fn ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            timeout: None,
        }
    }
}

/// Running counters and table size.
///
/// `hits + misses == gets` holds for every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub gets: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub miss_rate: f64,
}

impl CacheStats {
    fn new(size: usize, hits: u64, misses: u64) -> Self {
        let gets = hits + misses;
        let (hit_rate, miss_rate) = if gets > 0 {
            (hits as f64 / gets as f64, misses as f64 / gets as f64)
        } else {
            (0.0, 0.0)
        };

        Self {
            size,
            gets,
            hits,
            misses,
            hit_rate,
            miss_rate,
        }
    }
}

/// Freshness metadata for a settled entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EntryInfo {
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ttl_remaining: Duration,
}

enum Slot {
    Settled(Settled),
    InFlight { id: u64, pending: Pending },
}

struct Settled {
    value: Value,
    expires_at: Instant,
    stored_at: DateTime<Utc>,
    ttl: Duration,
}

impl Settled {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Default)]
struct State {
    entries: HashMap<String, Slot>,
    hits: u64,
    misses: u64,
    next_id: u64,
}

struct Inner {
    state: Mutex<State>,
    default_ttl: Duration,
    default_timeout: Option<Duration>,
}

impl Inner {
    /// The lock is never held across an await, and nothing panics while
    /// holding it, so a poisoned table is still consistent.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the in-flight marker `id` with the outcome of its producer.
    fn settle(&self, key: &str, id: u64, outcome: &Result<Value>, ttl: Duration) {
        let mut state = self.lock();

        let ours = matches!(
            state.entries.get(key),
            Some(Slot::InFlight { id: current, .. }) if *current == id
        );
        if !ours {
            debug!("Discarding stale producer result for '{}'", key);
            return;
        }

        match outcome {
            Ok(value) if !ttl.is_zero() => {
                let now = Instant::now();
                let expires_at = now
                    .checked_add(ttl)
                    .unwrap_or_else(|| now + FAR_FUTURE);
                state.entries.insert(
                    key.to_string(),
                    Slot::Settled(Settled {
                        value: Arc::clone(value),
                        expires_at,
                        stored_at: Utc::now(),
                        ttl,
                    }),
                );
            }
            Ok(_) => {
                state.entries.remove(key);
            }
            Err(err) => {
                state.entries.remove(key);
                debug!("Not caching failure for '{}': {}", key, err);
            }
        }
    }

    fn purge_expired(&self) -> usize {
        let mut state = self.lock();
        let now = Instant::now();
        let before = state.entries.len();
        state.entries.retain(|_, slot| match slot {
            Slot::Settled(entry) => entry.is_fresh(now),
            Slot::InFlight { .. } => true,
        });
        before - state.entries.len()
    }
}

enum Lookup {
    Hit(Value),
    Wait(Pending),
}

/// In-process cache shared by every data adapter.
///
/// Cloning is cheap; clones share the same table.
#[derive(Clone)]
pub struct Cache {
    inner: Arc<Inner>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, None)
    }
}

impl Cache {
    /// Create an empty cache.
    ///
    /// # Arguments
    /// * `default_ttl` - Lifetime for calls that do not pass one
    /// * `default_timeout` - Wait limit for calls that do not pass one (`None` waits forever)
    pub fn new(default_ttl: Duration, default_timeout: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                default_ttl,
                default_timeout,
            }),
        }
    }

    /// Return the cached value for `key`, or compute it with `producer`.
    ///
    /// A fresh settled entry is returned without calling `producer`. If a
    /// producer for `key` is already running, this call waits for that run
    /// instead of starting another. Otherwise `producer` is started on its
    /// own task; a successful result is stored for the TTL, a failure is
    /// handed to every waiting caller and then forgotten so the next call
    /// retries.
    ///
    /// This never panics on behalf of the producer: panics are reported as
    /// [`Error::Cache`].
    pub async fn get<V, F, Fut>(&self, key: &str, producer: F, options: GetOptions) -> Result<V>
    where
        V: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let ttl = options.ttl.unwrap_or(self.inner.default_ttl);

        let pending = match self.lookup(key, producer, ttl) {
            Lookup::Hit(value) => return downcast(key, &value),
            Lookup::Wait(pending) => pending,
        };

        let outcome = match options.timeout.or(self.inner.default_timeout) {
            Some(limit) => match tokio::time::timeout(limit, pending).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(
                        "Gave up waiting for '{}' after {:?}; producer continues in background",
                        key, limit
                    );
                    return Err(Error::Timeout {
                        key: key.to_string(),
                        after: limit,
                    });
                }
            },
            None => pending.await,
        };

        downcast(key, &outcome?)
    }

    fn lookup<V, F, Fut>(&self, key: &str, producer: F, ttl: Duration) -> Lookup
    where
        V: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let (id, pending, tx) = {
            let mut guard = self.inner.lock();
            let state = &mut *guard;

            match state.entries.get(key) {
                Some(Slot::Settled(entry)) if entry.is_fresh(Instant::now()) => {
                    state.hits += 1;
                    debug!("Cache hit: {}", key);
                    return Lookup::Hit(Arc::clone(&entry.value));
                }
                Some(Slot::InFlight { pending, .. }) => {
                    state.hits += 1;
                    debug!("Cache hit (joined in-flight): {}", key);
                    return Lookup::Wait(pending.clone());
                }
                _ => {}
            }

            state.misses += 1;
            state.next_id += 1;
            let id = state.next_id;

            let (tx, rx) = oneshot::channel::<Result<Value>>();
            let pending: Pending = rx
                .map(|received| {
                    received.unwrap_or_else(|_| {
                        Err(Error::Cache(
                            "producer task ended without a result".to_string(),
                        ))
                    })
                })
                .boxed()
                .shared();

            state.entries.insert(
                key.to_string(),
                Slot::InFlight {
                    id,
                    pending: pending.clone(),
                },
            );
            debug!("Cache miss: {}", key);

            (id, pending, tx)
        };

        // Build the producer future outside the lock: a producer that reads
        // cache stats synchronously must not deadlock.
        let fut = match panic::catch_unwind(AssertUnwindSafe(producer)) {
            Ok(fut) => fut,
            Err(payload) => {
                let err = Error::Cache(format!(
                    "producer for '{}' panicked: {}",
                    key,
                    panic_message(payload.as_ref())
                ));
                let outcome = Err(err);
                self.inner.settle(key, id, &outcome, ttl);
                let _ = tx.send(outcome);
                return Lookup::Wait(pending);
            }
        };

        let inner = Arc::clone(&self.inner);
        let key = key.to_string();
        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(result) => result.map(|value| Arc::new(value) as Value),
                Err(payload) => Err(Error::Cache(format!(
                    "producer for '{}' panicked: {}",
                    key,
                    panic_message(payload.as_ref())
                ))),
            };
            debug!(
                "Producer for '{}' finished in {:?} ({})",
                key,
                started.elapsed(),
                if outcome.is_ok() { "ok" } else { "error" }
            );

            inner.settle(&key, id, &outcome, ttl);
            let _ = tx.send(outcome);
        });

        Lookup::Wait(pending)
    }

    /// Counters and current table size.
    pub fn stats(&self) -> CacheStats {
        let state = self.inner.lock();
        CacheStats::new(state.entries.len(), state.hits, state.misses)
    }

    /// Remove the settled entry for `key`.
    ///
    /// A running producer is left alone and will store its result when it
    /// finishes. Returns whether an entry was removed.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut state = self.inner.lock();
        if matches!(state.entries.get(key), Some(Slot::Settled(_))) {
            state.entries.remove(key);
            debug!("Invalidated: {}", key);
            true
        } else {
            false
        }
    }

    /// Remove settled entries whose key matches a glob pattern
    /// (`*` matches any run of characters).
    ///
    /// e.g. `invalidate_matching("dashboard:*")` drops every dashboard section.
    pub fn invalidate_matching(&self, pattern: &str) -> usize {
        let mut state = self.inner.lock();
        let before = state.entries.len();
        state.entries.retain(|key, slot| {
            !(matches!(slot, Slot::Settled(_)) && glob_match(pattern, key))
        });
        let removed = before - state.entries.len();
        debug!("Invalidated {} entries matching '{}'", removed, pattern);
        removed
    }

    /// Drop every settled entry and reset the counters.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state
            .entries
            .retain(|_, slot| matches!(slot, Slot::InFlight { .. }));
        state.hits = 0;
        state.misses = 0;
    }

    /// Freshness metadata for a settled, unexpired entry.
    pub fn entry_info(&self, key: &str) -> Option<EntryInfo> {
        let state = self.inner.lock();
        let now = Instant::now();

        match state.entries.get(key) {
            Some(Slot::Settled(entry)) if entry.is_fresh(now) => {
                let expires_at = TimeDelta::from_std(entry.ttl)
                    .ok()
                    .and_then(|ttl| entry.stored_at.checked_add_signed(ttl))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);

                Some(EntryInfo {
                    created_at: entry.stored_at,
                    expires_at,
                    ttl_remaining: entry.expires_at.saturating_duration_since(now),
                })
            }
            _ => None,
        }
    }

    /// Remove expired settled entries now instead of on next read.
    pub fn purge_expired(&self) -> usize {
        self.inner.purge_expired()
    }

    /// Purge expired entries every `every` until the cache is dropped.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        let every = every.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let removed = inner.purge_expired();
                if removed > 0 {
                    debug!("Swept {} expired cache entries", removed);
                }
            }
        })
    }
}

fn downcast<V: Clone + 'static>(key: &str, value: &Value) -> Result<V> {
    (**value).downcast_ref::<V>().cloned().ok_or_else(|| {
        Error::Cache(format!(
            "entry '{}' does not hold a {}",
            key,
            std::any::type_name::<V>()
        ))
    })
}

/// Anchored glob match where `*` matches any run of characters.
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<usize> = None;
    let mut mark = 0;

    while ti < t.len() {
        if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}
