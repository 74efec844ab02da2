use std::fmt::{self, Debug, Display, Formatter};
use std::io;

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of a client-side error, stable across releases so callers can
/// match on it without depending on the exact `Display` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    UnexpectedState,
    UnexpectedPacket,
    UnexpectedPayload,
    Unsupported,
    Timeout,
    ClosedConnection,
    BrokenConnection,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::UnexpectedState => "unexpected state",
            ErrorKind::UnexpectedPacket => "unexpected packet",
            ErrorKind::UnexpectedPayload => "unexpected payload",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::Timeout => "timed out",
            ErrorKind::ClosedConnection => "connection closed",
            ErrorKind::BrokenConnection => "connection broken",
        };
        f.write_str(s)
    }
}

/// The error payload of a MySQL `ERR_Packet`, surfaced to callers without
/// closing the connection.
#[derive(Debug, Clone)]
pub struct MySqlDatabaseError {
    pub code: u16,
    pub sql_state: Option<[u8; 5]>,
    pub message: String,
}

impl Display for MySqlDatabaseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} (error code {})", self.message, self.code)
    }
}

impl std::error::Error for MySqlDatabaseError {}

/// The error type returned by every fallible operation in this crate.
///
/// This is a hand-rolled enum, not a `thiserror`-derived one: the crate
/// reserves `thiserror` for small leaf error types (see [`TimeoutError`]).
pub enum Error {
    Io(io::Error),
    Tls(Box<dyn std::error::Error + Send + Sync + 'static>),
    UrlParse(url::ParseError),
    Database(MySqlDatabaseError),
    Protocol(Box<str>),
    PoolTimedOut,
    PoolClosed,
    Client(ErrorKind, Box<str>),
}

impl Error {
    pub fn client(kind: ErrorKind, message: impl Into<Box<str>>) -> Self {
        Error::Client(kind, message.into())
    }

    pub fn protocol(message: impl Into<Box<str>>) -> Self {
        Error::Protocol(message.into())
    }

    /// Whether the pool should retry the operation on a fresh connection
    /// (spec §4.9, §7: "closedConnection and brokenConnection are the
    /// *only* errors the pool retries"). A transport-level `io::Error`
    /// surfacing from a socket read/write is retried too: it always means
    /// this connection is no longer usable, the same conclusion a
    /// `brokenConnection` client error encodes.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Client(ErrorKind::ClosedConnection | ErrorKind::BrokenConnection, _)
                | Error::Io(_)
        )
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Client(kind, _) => Some(*kind),
            _ => None,
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => f.debug_tuple("Io").field(e).finish(),
            Error::Tls(e) => f.debug_tuple("Tls").field(e).finish(),
            Error::UrlParse(e) => f.debug_tuple("UrlParse").field(e).finish(),
            Error::Database(e) => f.debug_tuple("Database").field(e).finish(),
            Error::Protocol(s) => f.debug_tuple("Protocol").field(s).finish(),
            Error::PoolTimedOut => f.write_str("PoolTimedOut"),
            Error::PoolClosed => f.write_str("PoolClosed"),
            Error::Client(kind, msg) => f.debug_tuple("Client").field(kind).field(msg).finish(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {e}"),
            Error::Tls(e) => write!(f, "tls error: {e}"),
            Error::UrlParse(e) => write!(f, "invalid connection url: {e}"),
            Error::Database(e) => write!(f, "server error: {e}"),
            Error::Protocol(s) => write!(f, "protocol error: {s}"),
            Error::PoolTimedOut => write!(f, "timed out while waiting for an available connection"),
            Error::PoolClosed => write!(f, "attempted to acquire a connection on a closed pool"),
            Error::Client(kind, msg) => write!(f, "{kind}: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Tls(e) => Some(&**e),
            Error::UrlParse(e) => Some(e),
            Error::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::UrlParse(e)
    }
}

impl From<MySqlDatabaseError> for Error {
    fn from(e: MySqlDatabaseError) -> Self {
        Error::Database(e)
    }
}

/// Raised when an operation exceeds its configured deadline.
#[derive(Debug, thiserror::Error)]
#[error("operation timed out after {0:?}")]
pub struct TimeoutError(pub std::time::Duration);

impl From<TimeoutError> for Error {
    fn from(e: TimeoutError) -> Self {
        Error::client(ErrorKind::Timeout, e.to_string())
    }
}

/// Construct a [`Error::Protocol`] with a formatted message, mirroring the
/// `protocol_err!` convention this crate's design is grounded on.
macro_rules! protocol_err {
    ($($fmt:tt)*) => {
        $crate::error::Error::protocol(format!($($fmt)*))
    };
}

pub(crate) use protocol_err;
