//! Error types for twitch-stats.

use std::fmt;

use thiserror::Error;

/// Application error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Config not found: {0}")]
    ConfigNotFound(std::path::PathBuf),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("Invalid config: {0}")]
    ConfigInvalid(String),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Upstream endpoint a request was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Stream,
    Subscriptions,
    Follows,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Endpoint::Stream => "stream",
            Endpoint::Subscriptions => "subscriptions",
            Endpoint::Follows => "follows",
        };
        f.write_str(name)
    }
}

/// What went wrong with a single upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    Network(String),
    Status(u16),
    Decode(String),
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::Network(msg) => write!(f, "request failed: {}", msg),
            FetchErrorKind::Status(code) => write!(f, "non-200 response: {}", code),
            FetchErrorKind::Decode(msg) => write!(f, "decode error: {}", msg),
        }
    }
}

/// A failed upstream call. Never fatal; the tick is abandoned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{endpoint} query failed: {kind}")]
pub struct FetchError {
    pub endpoint: Endpoint,
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn network(endpoint: Endpoint, err: impl fmt::Display) -> Self {
        Self {
            endpoint,
            kind: FetchErrorKind::Network(err.to_string()),
        }
    }

    pub fn status(endpoint: Endpoint, code: u16) -> Self {
        Self {
            endpoint,
            kind: FetchErrorKind::Status(code),
        }
    }

    pub fn decode(endpoint: Endpoint, err: impl fmt::Display) -> Self {
        Self {
            endpoint,
            kind: FetchErrorKind::Decode(err.to_string()),
        }
    }
}

/// A failed write of a finished session.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("database connection failed: {0}")]
    Connection(String),

    #[error("database write failed: {0}")]
    Write(#[from] rusqlite::Error),

    #[error("rows affected for stream {stream_id} was not 1, returned: {affected}")]
    UnexpectedRows { stream_id: i64, affected: usize },
}
