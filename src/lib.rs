//! An async MySQL/MariaDB client: wire protocol, connection state
//! machine, and connection pool.
//!
//! ```no_run
//! # async fn run() -> mason_mysql::Result<()> {
//! let conn = mason_mysql::MySqlConnection::connect("mysql://root@localhost/app").await?;
//! let result = conn.execute("SELECT id FROM users WHERE id = :id", None, false).await?;
//! for row in result.rows()? {
//!     let _id: Option<i64> = row.int_at(0)?;
//! }
//! # Ok(())
//! # }
//! ```

mod io;
mod net;
mod params;
mod protocol;

pub mod error;
pub mod options;
pub mod pool;
pub mod result;
pub mod value;

mod connection;
mod statement;
mod transaction;

pub use error::{Error, ErrorKind, MySqlDatabaseError, Result};
pub use options::{MySqlConnectOptions, SslMode};
pub use pool::{Pool, PoolConnection, PoolOptions};
pub use result::{ColumnInfo, ResultSet, ResultSetRow, RowStream};
pub use value::{BindValue, MySqlDateTime, MySqlTime, ToSqlText};

pub use connection::MySqlConnection;
pub use statement::PreparedStmt;
