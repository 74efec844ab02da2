//! Prepared-statement handles (spec §4.8, §6 "PreparedStmt API") and the
//! supplemental, opt-in statement cache (spec §10.5), grounded on
//! `sqlx-core`'s `common::StatementCache` (an `LruCache<String, Id>`
//! wrapper) generalized here to cache the small descriptor a prepared
//! statement needs (`statement_id`, `num_params`, `num_columns`) rather
//! than just the id, matching how other `StatementCache<Id>` call sites
//! in the teacher (e.g. `mssql::connection::mod` caching
//! `Arc<MssqlStatementMetadata>`) key the cache on something richer than
//! a bare `u32`.

use std::sync::Arc;

use lru_cache::LruCache;

use crate::connection::{executor, ConnectionHandle};
use crate::error::{Error, ErrorKind};
use crate::protocol::{ComStmtExecute, ComStmtPrepareOk, Cursor};
use crate::result::ResultSet;
use crate::value::BindValue;

#[derive(Debug, Clone, Copy)]
pub(crate) struct CachedStatement {
    pub(crate) statement_id: u32,
    pub(crate) num_params: u16,
    pub(crate) num_columns: u16,
}

impl From<&ComStmtPrepareOk> for CachedStatement {
    fn from(ok: &ComStmtPrepareOk) -> Self {
        Self {
            statement_id: ok.statement_id,
            num_params: ok.params,
            num_columns: ok.columns,
        }
    }
}

/// A cache of prepared statements keyed by query text. Off by default
/// (`MySqlConnectOptions::statement_cache_capacity` is `None`); when
/// enabled, `MySqlConnection::prepare` consults it before sending a fresh
/// `COM_STMT_PREPARE`.
pub(crate) struct StatementCache {
    inner: LruCache<String, CachedStatement>,
}

impl StatementCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            inner: LruCache::new(capacity),
        }
    }

    pub(crate) fn get(&mut self, query: &str) -> Option<CachedStatement> {
        self.inner.get_mut(query).copied()
    }

    /// Inserts a statement, returning the evicted entry (the previous
    /// value at this key, or the least-recently-used entry if the cache
    /// was full) so the caller can send its `COM_STMT_CLOSE`.
    pub(crate) fn insert(&mut self, query: &str, stmt: CachedStatement) -> Option<CachedStatement> {
        let mut evicted = None;

        if self.inner.contains_key(query) {
            evicted = self.inner.remove(query);
        } else if self.inner.len() == self.inner.capacity() {
            evicted = self.inner.remove_lru().map(|(_, v)| v);
        }

        self.inner.insert(query.to_owned(), stmt);
        evicted
    }

    /// Remove and return every cached statement, for best-effort cleanup
    /// on connection close.
    pub(crate) fn drain(&mut self) -> Vec<CachedStatement> {
        let mut out = Vec::with_capacity(self.inner.len());
        while let Some((_, stmt)) = self.inner.remove_lru() {
            out.push(stmt);
        }
        out
    }
}

/// A prepared statement obtained from [`crate::MySqlConnection::prepare`]
/// (spec §4.8, §6). `execute` marshals every parameter as `VAR_STRING`
/// text (see `crate::value::BindValue`) and runs the binary-protocol
/// result-set assembler.
pub struct PreparedStmt {
    pub(crate) handle: ConnectionHandle,
    pub(crate) statement_id: u32,
    pub(crate) num_params: u16,
    pub(crate) num_columns: u16,
    pub(crate) iterable: bool,
    /// `true` if this handle's `statement_id` is owned by the connection's
    /// statement cache rather than this handle: `deallocate` then becomes
    /// a no-op instead of sending `COM_STMT_CLOSE`, since the cache (or a
    /// later cache eviction) owns the server-side statement's lifetime.
    pub(crate) cached: bool,
}

impl PreparedStmt {
    /// Number of `?` placeholders this statement expects.
    pub fn num_of_params(&self) -> usize {
        self.num_params as usize
    }

    /// Number of columns the statement's result set carries (0 for DML).
    pub fn num_of_columns(&self) -> usize {
        self.num_columns as usize
    }

    /// Execute with `params`, whose length must equal [`Self::num_of_params`].
    pub async fn execute(&self, params: &[BindValue]) -> Result<ResultSet, Error> {
        if params.len() != self.num_params as usize {
            return Err(Error::client(
                ErrorKind::InvalidArgument,
                format!(
                    "statement expects {} parameter(s), got {}",
                    self.num_params,
                    params.len()
                ),
            ));
        }

        let lock = self.handle.acquire_lock().await?;

        {
            let mut guard = self.handle.io.lock().await;
            guard
                .send(
                    ComStmtExecute {
                        statement_id: self.statement_id,
                        cursor: Cursor::NO_CURSOR,
                        params,
                    },
                    true,
                )
                .await?;
        }

        if self.iterable {
            executor::run_streaming(Arc::clone(&self.handle.io), lock, true).await
        } else {
            let mut guard = self.handle.io.lock().await;
            let result = executor::run_buffered(&mut guard, true).await;
            drop(guard);
            drop(lock);
            result
        }
    }

    /// Sends `COM_STMT_CLOSE` (the server sends no reply) and removes the
    /// statement from the connection's active set. A no-op if this handle
    /// came from the statement cache (spec §10.5).
    pub async fn deallocate(self) -> Result<(), Error> {
        if self.cached {
            return Ok(());
        }

        self.handle
            .active_statements
            .lock()
            .unwrap()
            .remove(&self.statement_id);

        let lock = self.handle.acquire_lock().await?;
        let mut guard = self.handle.io.lock().await;
        guard
            .send(crate::protocol::ComStmtClose { statement_id: self.statement_id }, true)
            .await?;
        drop(guard);
        drop(lock);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmt(id: u32) -> CachedStatement {
        CachedStatement {
            statement_id: id,
            num_params: 1,
            num_columns: 2,
        }
    }

    #[test]
    fn get_returns_none_for_unknown_query() {
        let mut cache = StatementCache::new(2);
        assert!(cache.get("SELECT 1").is_none());
    }

    #[test]
    fn insert_then_get_round_trips() {
        let mut cache = StatementCache::new(2);
        cache.insert("SELECT 1", stmt(7));
        let hit = cache.get("SELECT 1").unwrap();
        assert_eq!(hit.statement_id, 7);
    }

    #[test]
    fn insert_over_capacity_evicts_least_recently_used() {
        let mut cache = StatementCache::new(1);
        assert!(cache.insert("SELECT 1", stmt(1)).is_none());
        let evicted = cache.insert("SELECT 2", stmt(2)).unwrap();
        assert_eq!(evicted.statement_id, 1);
        assert!(cache.get("SELECT 1").is_none());
        assert!(cache.get("SELECT 2").is_some());
    }

    #[test]
    fn insert_existing_key_returns_previous_entry() {
        let mut cache = StatementCache::new(2);
        cache.insert("SELECT 1", stmt(1));
        let previous = cache.insert("SELECT 1", stmt(2)).unwrap();
        assert_eq!(previous.statement_id, 1);
        assert_eq!(cache.get("SELECT 1").unwrap().statement_id, 2);
    }

    #[test]
    fn drain_empties_the_cache_and_returns_every_entry() {
        let mut cache = StatementCache::new(4);
        cache.insert("SELECT 1", stmt(1));
        cache.insert("SELECT 2", stmt(2));

        let mut ids: Vec<u32> = cache.drain().iter().map(|s| s.statement_id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
        assert!(cache.get("SELECT 1").is_none());
        assert!(cache.drain().is_empty());
    }

    #[test]
    fn cached_statement_from_prepare_ok() {
        let ok = ComStmtPrepareOk {
            statement_id: 9,
            columns: 3,
            params: 2,
            warnings: 0,
        };
        let cached = CachedStatement::from(&ok);
        assert_eq!(cached.statement_id, 9);
        assert_eq!(cached.num_params, 2);
        assert_eq!(cached.num_columns, 3);
    }
}
