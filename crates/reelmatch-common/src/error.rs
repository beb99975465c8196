//! Unified error type for reelmatch.
//!
//! Provider clients, the scanner, the persistence layer and the orchestrator
//! all funnel their failures into [`Error`]. The variants mirror how a failure
//! is treated during a library run: `NotFound` degrades to an unmatched file,
//! transport and API failures become per-file errors, and `ScanIo` aborts the
//! run.

use std::fmt;
use std::path::PathBuf;

/// Unified error type covering all failure modes in reelmatch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found locally or at a provider.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "movie", "scene", "record").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The provider could not be reached (connect failure, timeout, reset).
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// The provider rejected our credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The provider refused the request because of rate limiting.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The provider answered with a body we could not decode.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The provider answered with an unexpected non-success status.
    #[error("API error [{status}]: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Structured message from the body, or the raw body.
        message: String,
    },

    /// A GraphQL response carried an error in its envelope.
    #[error("GraphQL error: {0}")]
    Graphql(String),

    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A conflicting operation is already in progress.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Walking a library root failed.
    #[error("Scan failed at {}: {source}", path.display())]
    ScanIo {
        /// The path being visited when the walk failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The operation was cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,

    /// A database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Api`].
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Error::Api {
            status,
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::ScanIo`].
    pub fn scan_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::ScanIo {
            path: path.into(),
            source,
        }
    }

    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new Decode error.
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new Validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// `true` for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// `true` for [`Error::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Whether a transport-level retry could succeed.
    ///
    /// Rate limiting and server-side failures are transient; credential,
    /// decode and not-found failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Unavailable(_) | Error::RateLimited(_) => true,
            Error::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
