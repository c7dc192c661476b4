use std::fmt;
use std::fmt::Display;
use std::io;

/// Errors surfaced across the decoder / change-log / syncer boundary.
///
/// Variant names follow a taxonomy of semantics rather than which
/// component raised them.
#[derive(Debug)]
pub enum ReError {
    /// A declared column is missing from the source event's schema.
    SchemaMismatch(String),
    /// A raw source value can't be coerced into the declared kind.
    TypeMismatch(String),
    /// A change-log record couldn't be decoded against its model.
    DecodeCorrupt(String),
    /// The target database rejected a prepare/execute call.
    TargetUnavailable(String),
    /// An Update/Delete was requested on a model without a primary key.
    NoPrimaryKey(String),
    /// The change-log's append/trim failed; fatal to whichever component hit it.
    StoreUnavailable(String),
    /// Startup configuration is invalid (missing directory, empty model map, ...).
    ConfigInvalid(String),

    /// Catch-all for conditions that should never occur; a BUG if seen.
    Bug(String),
    IoError(io::Error),
    Utf8Error(std::str::Utf8Error),
}

impl Display for ReError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReError::SchemaMismatch(s) => write!(f, "schema mismatch: {}", s),
            ReError::TypeMismatch(s) => write!(f, "type mismatch: {}", s),
            ReError::DecodeCorrupt(s) => write!(f, "change-log record corrupt: {}", s),
            ReError::TargetUnavailable(s) => write!(f, "target database unavailable: {}", s),
            ReError::NoPrimaryKey(s) => write!(f, "no primary key: {}", s),
            ReError::StoreUnavailable(s) => write!(f, "change-log store unavailable: {}", s),
            ReError::ConfigInvalid(s) => write!(f, "invalid configuration: {}", s),
            ReError::Bug(s) => write!(f, "bug (should never happen): {}", s),
            ReError::IoError(e) => write!(f, "{}", e),
            ReError::Utf8Error(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ReError {}

impl From<io::Error> for ReError {
    fn from(e: io::Error) -> Self {
        ReError::IoError(e)
    }
}

impl From<std::str::Utf8Error> for ReError {
    fn from(e: std::str::Utf8Error) -> Self {
        ReError::Utf8Error(e)
    }
}
