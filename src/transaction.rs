//! `transactional(body)` (spec §4.10), split out from
//! `crate::connection` the way the teacher separates transaction
//! mechanics from the core connection impl (`sqlx-core`'s
//! `*/connection/executor.rs` vs. its top-level transaction types).
//!
//! Grounded on the RAII-guard idiom the teacher uses for its pooled
//! connection's checkout/return (`pool/mod.rs`'s `Connection::drop`
//! calling back into the pool), adapted here to a commit/rollback guard
//! instead of a checkin guard: acquire the operation lock for the whole
//! scope, flip `in_transaction`, run `START TRANSACTION` /
//! `body` / `COMMIT`, and on any error from `body` attempt `ROLLBACK`
//! (swallowing its own errors) before re-raising the original.

use std::future::Future;
use std::sync::atomic::Ordering;

use crate::connection::MySqlConnection;
use crate::error::{Error, ErrorKind};

impl MySqlConnection {
    /// Run `body` under a transaction on this connection. Fails with
    /// [`ErrorKind::UnexpectedState`] if this connection is already
    /// inside a transaction. During `body`, the connection passed to it
    /// is re-entrantly usable: nested `execute`/`prepare` calls observe
    /// the operation lock as already held and do not block (spec §4.10).
    pub async fn transactional<F, Fut, T>(&self, body: F) -> Result<T, Error>
    where
        F: FnOnce(MySqlConnection) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        self.check_open()?;

        if self.handle.in_transaction.load(Ordering::Acquire) {
            return Err(Error::client(
                ErrorKind::UnexpectedState,
                "connection is already inside a transaction",
            ));
        }

        let lock = self.handle.acquire_lock().await?;
        self.handle.in_transaction.store(true, Ordering::Release);

        let result = self.run_body(body).await;

        self.handle.in_transaction.store(false, Ordering::Release);
        drop(lock);
        result
    }

    async fn run_body<F, Fut, T>(&self, body: F) -> Result<T, Error>
    where
        F: FnOnce(MySqlConnection) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        self.send_simple_query("START TRANSACTION").await?;

        let conn = MySqlConnection { handle: self.handle.clone() };
        match body(conn).await {
            Ok(value) => {
                self.send_simple_query("COMMIT").await?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.send_simple_query("ROLLBACK").await;
                Err(err)
            }
        }
    }
}
