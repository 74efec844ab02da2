//! `PoolOptions` builder (spec §4.9, §10.3), grounded on
//! `sqlx-core::pool::options::PoolOptions` — simplified from that type's
//! generic-over-`Database`, callback-driven design (see DESIGN.md) down
//! to the fixed fields the distilled spec actually names, plus
//! `min_connections`/`idle_timeout`/`test_before_acquire` which the
//! teacher always offers and SPEC_FULL.md §10.3 carries forward as
//! ambient configuration.

use std::time::Duration;

use tracing::Level;

use crate::error::Error;
use crate::options::MySqlConnectOptions;
use crate::pool::Pool;

/// Default `maxConnectionAge` (spec §4.9): 12 hours.
const DEFAULT_MAX_CONNECTION_AGE: Duration = Duration::from_secs(12 * 60 * 60);

/// Default `maxSessionUse` (spec §4.9): 4 hours.
const DEFAULT_MAX_SESSION_USE: Duration = Duration::from_secs(4 * 60 * 60);

/// Builder for a [`Pool`](crate::pool::Pool)'s bounded size and
/// expiry policy.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub(crate) max_connections: u32,
    pub(crate) min_connections: u32,
    pub(crate) acquire_timeout: Duration,
    pub(crate) max_connection_age: Option<Duration>,
    pub(crate) max_session_use: Option<Duration>,
    pub(crate) idle_timeout: Option<Duration>,
    pub(crate) test_before_acquire: bool,
    pub(crate) acquire_slow_threshold: Option<Duration>,
    pub(crate) acquire_slow_level: Level,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolOptions {
    pub fn new() -> Self {
        Self {
            max_connections: 1,
            min_connections: 0,
            acquire_timeout: Duration::from_secs(30),
            max_connection_age: Some(DEFAULT_MAX_CONNECTION_AGE),
            max_session_use: Some(DEFAULT_MAX_SESSION_USE),
            idle_timeout: None,
            test_before_acquire: false,
            acquire_slow_threshold: Some(Duration::from_secs(2)),
            acquire_slow_level: Level::WARN,
        }
    }

    /// Capacity-`N` semaphore governing concurrent sessions (spec §4.9;
    /// default 1).
    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    /// Best-effort floor the pool tries to keep idle and ready
    /// (not required by the distilled spec; present because the teacher
    /// always offers it, per SPEC_FULL.md §10.3).
    pub fn min_connections(mut self, n: u32) -> Self {
        self.min_connections = n;
        self
    }

    /// Maximum time [`Pool::acquire`] waits for a permit before failing
    /// with [`Error::PoolTimedOut`].
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// `maxConnectionAge`: a connection whose age exceeds this is
    /// disposed instead of returned to the idle list (default 12h;
    /// `None` disables age-based expiry).
    pub fn max_connection_age(mut self, age: impl Into<Option<Duration>>) -> Self {
        self.max_connection_age = age.into();
        self
    }

    /// `maxSessionUse`: a connection whose cumulative in-use time
    /// exceeds this is disposed instead of returned to the idle list
    /// (default 4h; `None` disables use-based expiry).
    pub fn max_session_use(mut self, use_time: impl Into<Option<Duration>>) -> Self {
        self.max_session_use = use_time.into();
        self
    }

    /// How long an idle connection may sit unused before being reaped.
    /// `None` (the default) never reaps on idle time alone.
    pub fn idle_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.idle_timeout = timeout.into();
        self
    }

    /// `ping()` an idle connection before handing it out (spec §10.5).
    pub fn test_before_acquire(mut self, yes: bool) -> Self {
        self.test_before_acquire = yes;
        self
    }

    /// Log [`Self::acquire_slow_level`] when [`Pool::acquire`] takes at
    /// least this long to return a connection (default 2s; `None`
    /// disables the warning entirely). Mirrors the teacher's
    /// `acquire_slow_threshold` (spec §10.1).
    pub fn acquire_slow_threshold(mut self, threshold: impl Into<Option<Duration>>) -> Self {
        self.acquire_slow_threshold = threshold.into();
        self
    }

    /// The `tracing` level used for the slow-acquire log line (default
    /// `WARN`), matching the teacher's `acquire_slow_level`.
    pub fn acquire_slow_level(mut self, level: Level) -> Self {
        self.acquire_slow_level = level;
        self
    }

    /// Build a pool connecting to `url` with these options.
    pub async fn connect(self, url: &str) -> Result<Pool, Error> {
        let connect_options: MySqlConnectOptions = url.parse()?;
        Pool::with_options(connect_options, self).await
    }

    /// Build a pool from already-constructed connect options.
    pub async fn connect_with(self, options: MySqlConnectOptions) -> Result<Pool, Error> {
        Pool::with_options(options, self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let opts = PoolOptions::new();
        assert_eq!(opts.max_connections, 1);
        assert_eq!(opts.min_connections, 0);
        assert_eq!(opts.max_connection_age, Some(DEFAULT_MAX_CONNECTION_AGE));
        assert_eq!(opts.max_session_use, Some(DEFAULT_MAX_SESSION_USE));
        assert_eq!(opts.idle_timeout, None);
        assert!(!opts.test_before_acquire);
        assert_eq!(opts.acquire_slow_threshold, Some(Duration::from_secs(2)));
        assert_eq!(opts.acquire_slow_level, Level::WARN);
    }

    #[test]
    fn builder_methods_override_defaults() {
        let opts = PoolOptions::new()
            .max_connections(10)
            .max_connection_age(None)
            .test_before_acquire(true);
        assert_eq!(opts.max_connections, 10);
        assert_eq!(opts.max_connection_age, None);
        assert!(opts.test_before_acquire);
    }
}
