//! A bounded pool of [`MySqlConnection`]s (spec §4.9), grounded on
//! `sqlx-core::pool::mod`'s `Pool`/`Connection` shapes — a `Clone`-able
//! `Arc<SharedPool>` handle plus a `Deref`-through checkout guard whose
//! `Drop` returns the connection — simplified from that module's
//! actor/sharded implementation (see DESIGN.md) to a single idle deque
//! guarded by a capacity-`N` semaphore, which is all the distilled
//! spec's single-endpoint, single-settings pool needs.

mod options;

pub use options::PoolOptions;

use std::collections::{HashMap, VecDeque};
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tracing::Level;

use crate::connection::MySqlConnection;
use crate::error::Error;
use crate::options::MySqlConnectOptions;
use crate::result::ResultSet;
use crate::value::BindValue;

/// Emit the slow-acquire warning at `level`, which is configured at
/// runtime (`PoolOptions::acquire_slow_level`) and so can't be spliced
/// directly into `tracing::event!`, whose macros require a level known
/// at the callsite (spec §10.1's "configurable level").
fn log_slow_acquire(level: Level, elapsed: Duration) {
    match level {
        Level::ERROR => tracing::error!(elapsed = ?elapsed, "pool acquire was slow"),
        Level::WARN => tracing::warn!(elapsed = ?elapsed, "pool acquire was slow"),
        Level::INFO => tracing::info!(elapsed = ?elapsed, "pool acquire was slow"),
        Level::DEBUG => tracing::debug!(elapsed = ?elapsed, "pool acquire was slow"),
        Level::TRACE => tracing::trace!(elapsed = ?elapsed, "pool acquire was slow"),
    }
}

/// A connection sitting idle in the pool, along with the bookkeeping
/// `SharedPool::is_expired` needs (spec §4.9's age/use-time expiry).
struct IdleConnection {
    conn: MySqlConnection,
    created_at: Instant,
    cumulative_use: Duration,
    returned_at: Instant,
}

struct SharedPool {
    connect_options: MySqlConnectOptions,
    pool_options: PoolOptions,
    semaphore: Arc<Semaphore>,
    idle: StdMutex<VecDeque<IdleConnection>>,
    /// Serializes "no idle connection available, must connect a new
    /// one" so concurrent acquirers don't all dial at once (spec §4.9's
    /// "single-holder lock" for eviction + connect).
    create_lock: Mutex<()>,
    size: AtomicU32,
    closed: AtomicBool,
}

impl SharedPool {
    fn is_expired(&self, idle: &IdleConnection) -> bool {
        if let Some(max_age) = self.pool_options.max_connection_age {
            if idle.created_at.elapsed() >= max_age {
                return true;
            }
        }
        if let Some(max_use) = self.pool_options.max_session_use {
            if idle.cumulative_use >= max_use {
                return true;
            }
        }
        if let Some(idle_timeout) = self.pool_options.idle_timeout {
            if idle.returned_at.elapsed() >= idle_timeout {
                return true;
            }
        }
        false
    }

    /// Return a checked-out connection. Disposes of it instead of
    /// pooling it if the pool has closed, the connection broke, or the
    /// caller marked it non-reusable (spec §4.9's "on return" clause).
    fn release(&self, mut idle: IdleConnection, reusable: bool) {
        let disposable = self.closed.load(Ordering::Acquire)
            || !reusable
            || !idle.conn.is_open()
            || self.is_expired(&idle);

        if disposable {
            tracing::debug!(reusable, open = idle.conn.is_open(), "disposing connection on release");
            self.size.fetch_sub(1, Ordering::AcqRel);
            let conn = idle.conn;
            tokio::spawn(async move {
                let _ = conn.close().await;
            });
            return;
        }

        idle.returned_at = Instant::now();
        tracing::debug!(idle = self.idle.lock().unwrap().len() + 1, "connection returned to pool");
        self.idle.lock().unwrap().push_back(idle);
    }
}

/// A connection checked out from a [`Pool`]. Derefs to [`MySqlConnection`]
/// and returns itself to the pool's idle list on drop (spec §4.9's
/// "on return").
pub struct PoolConnection {
    pool: Pool,
    idle: Option<IdleConnection>,
    checked_out_at: Instant,
    reusable: bool,
    _permit: OwnedSemaphorePermit,
}

impl PoolConnection {
    /// Mark this connection as non-reusable: it will be disposed instead
    /// of returned to the pool when dropped (spec §4.9's "caller marked
    /// it non-reusable" clause — e.g. a bubbled client error during
    /// `withConnection`'s body).
    pub fn mark_unreusable(&mut self) {
        self.reusable = false;
    }
}

impl Deref for PoolConnection {
    type Target = MySqlConnection;

    fn deref(&self) -> &MySqlConnection {
        &self
            .idle
            .as_ref()
            .expect("connection already released")
            .conn
    }
}

impl Drop for PoolConnection {
    fn drop(&mut self) {
        if let Some(mut idle) = self.idle.take() {
            idle.cumulative_use += self.checked_out_at.elapsed();
            self.pool.0.release(idle, self.reusable);
        }
    }
}

/// A pool of [`MySqlConnection`]s to one endpoint (spec §4.9). Cheaply
/// `Clone`: every clone shares the same underlying semaphore and idle
/// list.
#[derive(Clone)]
pub struct Pool(Arc<SharedPool>);

impl Pool {
    /// Build a pool with default [`PoolOptions`] from a `mysql://` URL.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        PoolOptions::new().connect(url).await
    }

    pub(crate) async fn with_options(
        connect_options: MySqlConnectOptions,
        pool_options: PoolOptions,
    ) -> Result<Self, Error> {
        let pool = Pool(Arc::new(SharedPool {
            semaphore: Arc::new(Semaphore::new(pool_options.max_connections as usize)),
            idle: StdMutex::new(VecDeque::new()),
            create_lock: Mutex::new(()),
            size: AtomicU32::new(0),
            closed: AtomicBool::new(false),
            connect_options,
            pool_options,
        }));

        for _ in 0..pool.0.pool_options.min_connections {
            let conn = pool.connect_new().await?;
            pool.0.idle.lock().unwrap().push_back(conn);
        }

        Ok(pool)
    }

    async fn connect_new(&self) -> Result<IdleConnection, Error> {
        let conn = MySqlConnection::connect_with(&self.0.connect_options).await?;
        self.0.size.fetch_add(1, Ordering::AcqRel);
        tracing::debug!(size = self.0.size.load(Ordering::Acquire), "pool dialed a new connection");
        let now = Instant::now();
        Ok(IdleConnection {
            conn,
            created_at: now,
            cumulative_use: Duration::ZERO,
            returned_at: now,
        })
    }

    /// Acquire a connection, waiting at most `acquire_timeout` for a
    /// permit (spec §4.9).
    pub async fn acquire(&self) -> Result<PoolConnection, Error> {
        if self.0.closed.load(Ordering::Acquire) {
            return Err(Error::PoolClosed);
        }

        let started = Instant::now();

        let permit = tokio::time::timeout(
            self.0.pool_options.acquire_timeout,
            Arc::clone(&self.0.semaphore).acquire_owned(),
        )
        .await
        .map_err(|_| Error::PoolTimedOut)?
        .map_err(|_| Error::PoolClosed)?;

        loop {
            let candidate = self.0.idle.lock().unwrap().pop_front();

            let idle = match candidate {
                Some(idle) if self.0.is_expired(&idle) => {
                    tracing::debug!("reaping expired idle connection");
                    self.0.size.fetch_sub(1, Ordering::AcqRel);
                    let conn = idle.conn;
                    tokio::spawn(async move {
                        let _ = conn.close().await;
                    });
                    continue;
                }
                Some(idle) if self.0.pool_options.test_before_acquire => {
                    if idle.conn.ping().await.is_ok() {
                        idle
                    } else {
                        tracing::debug!("reaping idle connection that failed ping");
                        self.0.size.fetch_sub(1, Ordering::AcqRel);
                        continue;
                    }
                }
                Some(idle) => idle,
                None => {
                    let _create_guard = self.0.create_lock.lock().await;

                    // Another acquirer may have returned a connection
                    // while we waited for the create lock.
                    if let Some(idle) = self.0.idle.lock().unwrap().pop_front() {
                        idle
                    } else {
                        self.connect_new().await?
                    }
                }
            };

            let elapsed = started.elapsed();
            if let Some(threshold) = self.0.pool_options.acquire_slow_threshold {
                if elapsed >= threshold {
                    log_slow_acquire(self.0.pool_options.acquire_slow_level, elapsed);
                }
            }
            tracing::debug!(elapsed = ?elapsed, "connection acquired");

            return Ok(PoolConnection {
                pool: self.clone(),
                idle: Some(idle),
                checked_out_at: Instant::now(),
                reusable: true,
                _permit: permit,
            });
        }
    }

    /// `execute`/`transactional` convenience wrapped in a retry policy
    /// that re-acquires a fresh connection on `closedConnection`/
    /// `brokenConnection` errors (spec §4.9).
    pub async fn execute(
        &self,
        query: &str,
        params: Option<&HashMap<String, BindValue>>,
        iterable: bool,
    ) -> Result<ResultSet, Error> {
        loop {
            let mut conn = self.acquire().await?;
            match conn.execute(query, params, iterable).await {
                Err(err) if err.is_retryable() => {
                    conn.mark_unreusable();
                    continue;
                }
                other => return other,
            }
        }
    }

    /// `transactional` run against a pooled connection, with the same
    /// retry policy as [`Self::execute`].
    pub async fn transactional<F, Fut, T>(&self, body: F) -> Result<T, Error>
    where
        F: Fn(MySqlConnection) -> Fut,
        Fut: std::future::Future<Output = Result<T, Error>>,
    {
        loop {
            let mut conn = self.acquire().await?;
            let inner = (*conn).clone();
            match inner.transactional(|c| body(c)).await {
                Err(err) if err.is_retryable() => {
                    conn.mark_unreusable();
                    continue;
                }
                other => return other,
            }
        }
    }

    /// Exclusive access to one pooled connection for the duration of
    /// `f` (spec §6's `withConnection`). Any error bubbled from `f`
    /// marks the connection non-reusable before it is returned (spec
    /// §4.9's "caller marked it non-reusable" clause), so a connection
    /// that failed mid-use is not handed to the next acquirer.
    pub async fn with_connection<F, Fut, T>(&self, f: F) -> Result<T, Error>
    where
        F: for<'c> FnOnce(&'c MySqlConnection) -> Fut,
        Fut: std::future::Future<Output = Result<T, Error>>,
    {
        let mut conn = self.acquire().await?;
        let result = f(&*conn).await;
        if result.is_err() {
            conn.mark_unreusable();
        }
        result
    }

    /// Number of connections currently managed by the pool (idle + in use).
    pub fn size(&self) -> u32 {
        self.0.size.load(Ordering::Acquire)
    }

    /// Number of idle connections.
    pub fn idle(&self) -> usize {
        self.0.idle.lock().unwrap().len()
    }

    /// Prevents any new connections from being created and disposes of
    /// every idle connection. Does not forcibly close connections that
    /// are currently checked out; they are disposed when returned.
    pub async fn close(&self) {
        self.0.closed.store(true, Ordering::Release);

        let idle: Vec<IdleConnection> = self.0.idle.lock().unwrap().drain(..).collect();
        for idle in idle {
            let _ = idle.conn.close().await;
        }
    }
}
