//! Error types for the cache layer.

use std::fmt;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the cache layer.
///
/// Storage-side variants never reach callers of the public [`CacheStore`](crate::CacheStore)
/// API: the store logs them and degrades to "no cached data". They surface only
/// from the fallible `try_*` methods and from backends used directly.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Serialization failed when converting a value to JSON text.
    ///
    /// Cached payloads are expected to be plain JSON data, so this usually
    /// indicates a programmer error (for example a map with non-string keys).
    SerializationError(String),

    /// Deserialization failed when reading a stored entry.
    ///
    /// Common causes:
    /// - Entry text is not valid JSON
    /// - Stored payload does not match the requested type
    ///
    /// **Recovery:** treated as a cache miss.
    DeserializationError(String),

    /// Storage medium reported a failure (I/O error, lock poisoned, etc).
    BackendError(String),

    /// Write rejected because the storage medium is full.
    QuotaExceeded {
        /// Bytes the medium would hold after the write
        requested: usize,
        /// Configured capacity in bytes
        limit: usize,
    },

    /// Storage medium is disabled or unavailable.
    StorageUnavailable(String),

    /// Caller-supplied fetch operation failed.
    ///
    /// Network failure, non-success HTTP status, malformed body.
    /// The orchestrator surfaces the message through `FetchState::error`.
    FetchError(String),

    /// Invalid configuration value.
    ConfigError(String),

    /// Stored entry version differs from the required one.
    VersionMismatch {
        /// Version the caller required
        expected: String,
        /// Version found in the stored entry
        found: String,
    },

    /// Generic error with custom message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::QuotaExceeded { requested, limit } => {
                write!(
                    f,
                    "Storage quota exceeded: {} bytes requested, limit {}",
                    requested, limit
                )
            }
            Error::StorageUnavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            Error::FetchError(msg) => write!(f, "{}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Whether this error originates from the storage medium.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::BackendError(_) | Error::QuotaExceeded { .. } | Error::StorageUnavailable(_)
        )
    }

    /// Message suitable for display next to a retry action.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_eof() || e.is_data() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::FetchError(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::FetchError(e.to_string())
    }
}
