//! The connection state machine's public face (spec §4.6, §4.9, §4.10,
//! §6 "Session API"), grounded on `sqlx-core::mysql::connection`'s
//! `MySqlConnection` (the `Connect`/`Connection` trait impls in
//! `mysql/connection/mod.rs`) and its `CachingConnection` statement-cache
//! hook.
//!
//! This crate's connection is `Clone`: every clone shares the same
//! underlying socket, operation lock, and bookkeeping through
//! [`ConnectionHandle`]'s `Arc`-wrapped fields, which is what lets a
//! transaction body and a pool checkout both hold a live, usable
//! `MySqlConnection` to the same physical connection (spec §4.10's
//! "during the body the same connection is re-entrantly usable").
//! Session methods take `&self` rather than `&mut self` for the same
//! reason: all real mutable state lives behind the handle's atomics,
//! mutexes, and semaphore.

pub(crate) mod establish;
pub(crate) mod executor;
#[cfg(test)]
pub(crate) mod mock;
pub(crate) mod stream;

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, Notify, OwnedSemaphorePermit, Semaphore};

use crate::error::{Error, ErrorKind};
use crate::options::MySqlConnectOptions;
use crate::protocol::{
    ComInitDb, ComPing, ComQuery, ComQuit, ComStmtClose, ComStmtPrepare, ComStmtPrepareOk,
};
use crate::result::ResultSet;
use crate::statement::{CachedStatement, PreparedStmt, StatementCache};
use crate::value::BindValue;

use self::stream::MySqlStream;

/// The already-acquired operation-lock permit for one in-flight command,
/// or a marker that the lock is held re-entrantly by the calling task
/// (inside a `transactional` body) and does not need to be released here
/// (spec §4.6 "nested execute/prepare calls... skip re-acquiring").
///
/// The spec's concurrency model (§5) is single-threaded cooperative per
/// connection, so "the calling task already holds it" collapses to a
/// single `in_transaction` flag check rather than needing real
/// thread/task identity tracking.
pub(crate) enum OperationLock {
    Owned(OwnedSemaphorePermit),
    Reentrant,
}

/// The shared state behind every `MySqlConnection`/`PreparedStmt` clone
/// derived from one physical connection.
#[derive(Clone)]
pub(crate) struct ConnectionHandle {
    pub(crate) io: Arc<Mutex<MySqlStream>>,
    lock: Arc<Semaphore>,
    closed: Arc<AtomicBool>,
    close_notify: Arc<Notify>,
    pub(crate) in_transaction: Arc<AtomicBool>,
    pub(crate) active_statements: Arc<StdMutex<HashSet<u32>>>,
    statement_cache: Option<Arc<Mutex<StatementCache>>>,
}

impl ConnectionHandle {
    pub(crate) async fn acquire_lock(&self) -> Result<OperationLock, Error> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::client(ErrorKind::ClosedConnection, "connection is closed"));
        }

        if self.in_transaction.load(Ordering::Acquire) {
            return Ok(OperationLock::Reentrant);
        }

        let permit = Arc::clone(&self.lock).acquire_owned().await.map_err(|_| {
            Error::client(ErrorKind::ClosedConnection, "connection is closed")
        })?;

        Ok(OperationLock::Owned(permit))
    }
}

/// A single MySQL/MariaDB connection (spec §2, §6 "Session API").
#[derive(Clone)]
pub struct MySqlConnection {
    pub(crate) handle: ConnectionHandle,
}

impl MySqlConnection {
    /// Connect using a `mysql://` URL (spec §3 "Endpoint").
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let options: MySqlConnectOptions = url.parse()?;
        Self::connect_with(&options).await
    }

    /// Connect using an already-built [`MySqlConnectOptions`].
    pub async fn connect_with(options: &MySqlConnectOptions) -> Result<Self, Error> {
        let (stream, connection_id) = tokio::time::timeout(
            options.connect_timeout,
            establish::establish(options),
        )
        .await
        .map_err(|_| Error::client(ErrorKind::Timeout, "connect timed out"))??;

        let handle = ConnectionHandle {
            io: Arc::new(Mutex::new(stream)),
            lock: Arc::new(Semaphore::new(1)),
            closed: Arc::new(AtomicBool::new(false)),
            close_notify: Arc::new(Notify::new()),
            in_transaction: Arc::new(AtomicBool::new(false)),
            active_statements: Arc::new(StdMutex::new(HashSet::new())),
            statement_cache: options
                .statement_cache_capacity
                .map(|capacity| Arc::new(Mutex::new(StatementCache::new(capacity)))),
        };

        let conn = MySqlConnection { handle };
        conn.send_post_connect_settings().await?;
        tracing::debug!(connection_id, "session ready");
        Ok(conn)
    }

    /// The four `SET @@...` statements spec §6's "Wire defaults" names,
    /// plus the `sql_mode`/`time_zone` pair the teacher additionally
    /// issues (spec §10.5), sent as one `CLIENT_MULTI_STATEMENTS` batch.
    async fn send_post_connect_settings(&self) -> Result<(), Error> {
        const SETTINGS: &str = "\
            SET sql_mode=(SELECT CONCAT(@@sql_mode, \
                ',PIPES_AS_CONCAT,NO_ENGINE_SUBSTITUTION,NO_ZERO_DATE,NO_ZERO_IN_DATE')); \
            SET time_zone='+00:00'; \
            SET NAMES utf8mb4 COLLATE utf8mb4_unicode_ci; \
            SET @@collation_connection=utf8mb4_unicode_ci, \
                @@character_set_client=utf8mb4, \
                @@character_set_connection=utf8mb4, \
                @@character_set_results=utf8mb4";

        let lock = self.handle.acquire_lock().await?;
        let mut guard = self.handle.io.lock().await;
        guard.send(ComQuery { query: SETTINGS }, true).await?;
        executor::run_buffered(&mut guard, false).await?;
        drop(guard);
        drop(lock);
        Ok(())
    }

    pub(crate) fn check_open(&self) -> Result<(), Error> {
        if self.handle.closed.load(Ordering::Acquire) {
            return Err(Error::client(ErrorKind::ClosedConnection, "connection is closed"));
        }
        Ok(())
    }

    /// Run `query`, substituting any `:name` parameters from `params`
    /// (spec §4.5). `iterable = true` returns a streaming result set
    /// (spec §4.7).
    pub async fn execute(
        &self,
        query: &str,
        params: Option<&HashMap<String, BindValue>>,
        iterable: bool,
    ) -> Result<ResultSet, Error> {
        self.check_open()?;
        if query.trim().is_empty() {
            return Err(Error::client(ErrorKind::InvalidArgument, "query must not be empty"));
        }

        let sql = match params {
            Some(p) => crate::params::substitute(query, p)?,
            None => query.to_owned(),
        };

        let lock = self.handle.acquire_lock().await?;

        {
            let mut guard = self.handle.io.lock().await;
            guard.send(ComQuery { query: &sql }, true).await?;
        }

        if iterable {
            executor::run_streaming(Arc::clone(&self.handle.io), lock, false).await
        } else {
            let mut guard = self.handle.io.lock().await;
            let result = executor::run_buffered(&mut guard, false).await;
            drop(guard);
            drop(lock);
            result
        }
    }

    /// Prepare `query` for repeated binary-protocol execution (spec §4.8).
    /// Consults the opt-in statement cache first, if one is configured.
    pub async fn prepare(&self, query: &str, iterable: bool) -> Result<PreparedStmt, Error> {
        self.check_open()?;
        if query.trim().is_empty() {
            return Err(Error::client(ErrorKind::InvalidArgument, "query must not be empty"));
        }

        if let Some(cache) = &self.handle.statement_cache {
            let cached = cache.lock().await.get(query);
            if let Some(stmt) = cached {
                return Ok(self.prepared_stmt_from(stmt, iterable, true));
            }
        }

        let prepare_ok = self.prepare_on_wire(query).await?;
        let stmt = CachedStatement::from(&prepare_ok);

        if let Some(cache) = &self.handle.statement_cache {
            let evicted = cache.lock().await.insert(query, stmt);
            if let Some(evicted) = evicted {
                self.deallocate_best_effort(evicted.statement_id).await;
            }
            return Ok(self.prepared_stmt_from(stmt, iterable, true));
        }

        self.handle.active_statements.lock().unwrap().insert(stmt.statement_id);
        Ok(self.prepared_stmt_from(stmt, iterable, false))
    }

    fn prepared_stmt_from(&self, stmt: CachedStatement, iterable: bool, cached: bool) -> PreparedStmt {
        PreparedStmt {
            handle: self.handle.clone(),
            statement_id: stmt.statement_id,
            num_params: stmt.num_params,
            num_columns: stmt.num_columns,
            iterable,
            cached,
        }
    }

    async fn prepare_on_wire(&self, query: &str) -> Result<ComStmtPrepareOk, Error> {
        let lock = self.handle.acquire_lock().await?;
        let mut guard = self.handle.io.lock().await;

        guard.send(ComStmtPrepare { query }, true).await?;
        let packet = guard.receive().await?;
        if packet.first() == Some(&0xFF) {
            return guard.handle_err();
        }
        let prepare_ok = ComStmtPrepareOk::read(packet)?;

        if prepare_ok.params > 0 {
            for _ in 0..prepare_ok.params {
                guard.receive().await?;
            }
            guard.maybe_receive_eof().await?;
        }
        if prepare_ok.columns > 0 {
            for _ in 0..prepare_ok.columns {
                guard.receive().await?;
            }
            guard.maybe_receive_eof().await?;
        }

        drop(guard);
        drop(lock);
        Ok(prepare_ok)
    }

    /// Best-effort `COM_STMT_CLOSE` for a statement evicted from the
    /// cache; errors are swallowed since there is nothing meaningful a
    /// caller who never held this handle could do with them.
    async fn deallocate_best_effort(&self, statement_id: u32) {
        if let Ok(lock) = self.handle.acquire_lock().await {
            let mut guard = self.handle.io.lock().await;
            let _ = guard.send(ComStmtClose { statement_id }, true).await;
            drop(guard);
            drop(lock);
        }
    }

    /// Send a statement and discard its result set. Assumes the
    /// operation lock is already held by the caller (transaction body,
    /// post-connect settings); see `crate::transaction`.
    pub(crate) async fn send_simple_query(&self, sql: &str) -> Result<(), Error> {
        let mut guard = self.handle.io.lock().await;
        guard.send(ComQuery { query: sql }, true).await?;
        executor::run_buffered(&mut guard, false).await?;
        Ok(())
    }

    /// `COM_INIT_DB` (spec §4.2): switch the connection's default schema
    /// without reconnecting.
    pub async fn init_db(&self, schema: &str) -> Result<(), Error> {
        self.check_open()?;
        let lock = self.handle.acquire_lock().await?;
        let mut guard = self.handle.io.lock().await;

        guard.send(ComInitDb { schema }, true).await?;
        let packet = guard.receive().await?;
        let result = match packet.first().copied() {
            Some(0x00) => guard.handle_ok().map(|_| ()),
            Some(0xFF) => guard.handle_err(),
            _ => guard.unexpected_packet(),
        };

        drop(guard);
        drop(lock);
        result
    }

    /// `COM_PING` (spec §10.5): a round-trip liveness check used by pool
    /// health checking (`PoolOptions::test_before_acquire`).
    pub async fn ping(&self) -> Result<(), Error> {
        self.check_open()?;
        let lock = self.handle.acquire_lock().await?;
        let mut guard = self.handle.io.lock().await;

        guard.send(ComPing, true).await?;
        let packet = guard.receive().await?;
        let result = match packet.first().copied() {
            Some(0x00) => guard.handle_ok().map(|_| ()),
            Some(0xFF) => guard.handle_err(),
            _ => guard.unexpected_packet(),
        };

        drop(guard);
        drop(lock);
        result
    }

    /// Graceful `COM_QUIT` + socket shutdown (spec §6). Idempotent: a
    /// second call is a no-op. Best-effort deallocates every active and
    /// cached prepared statement first, without re-acquiring the
    /// operation lock (the connection is tearing down anyway, spec §4.8).
    pub async fn close(&self) -> Result<(), Error> {
        if self.handle.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        tracing::debug!("closing connection");

        let mut statement_ids: Vec<u32> = self
            .handle
            .active_statements
            .lock()
            .unwrap()
            .drain()
            .collect();

        if let Some(cache) = &self.handle.statement_cache {
            let evicted = cache.lock().await.drain();
            statement_ids.extend(evicted.into_iter().map(|s| s.statement_id));
        }

        let mut guard = self.handle.io.lock().await;
        for statement_id in statement_ids {
            let _ = guard.send(ComStmtClose { statement_id }, true).await;
        }

        let _ = guard.send(ComQuit, true).await;
        let _ = guard.socket_mut().shutdown().await;
        drop(guard);

        self.handle.close_notify.notify_waiters();
        Ok(())
    }

    /// Whether [`Self::close`] has not yet been called on this
    /// connection (or any clone sharing its handle).
    pub fn is_open(&self) -> bool {
        !self.handle.closed.load(Ordering::Acquire)
    }

    /// Resolves once this connection has been closed.
    pub async fn closed(&self) {
        if self.handle.closed.load(Ordering::Acquire) {
            return;
        }
        self.handle.close_notify.notified().await;
    }

    /// Registers `callback` to run once this connection closes. If the
    /// connection is already closed, `callback` runs immediately (spun
    /// onto the runtime, matching `closed`'s async-notify semantics).
    pub fn on_close<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = self.handle.clone();
        tokio::spawn(async move {
            if !handle.closed.load(Ordering::Acquire) {
                handle.close_notify.notified().await;
            }
            callback();
        });
    }
}
