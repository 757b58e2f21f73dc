//! Error handling for ncsend
//!
//! Provides the error types for both layers of a transfer:
//! - Validation errors (program file name rules, raised before connecting)
//! - Connection errors (TCP transport, timeouts, unparsable replies)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Program file name validation error
///
/// Each variant carries the base name (without directory or extension)
/// that failed the check. Rules are applied in declaration order, and only
/// the first failing rule is reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The file extension is not `.NC` (case-insensitive)
    #[error("Invalid extension")]
    InvalidExtension {
        /// The base name of the rejected file.
        name: String,
    },

    /// The base name does not start with `O` followed by digits
    #[error("Filename does not match expected format")]
    BadFormat {
        /// The base name of the rejected file.
        name: String,
    },

    /// The base name is longer than the controller accepts
    #[error("Filename is too long")]
    TooLong {
        /// The base name of the rejected file.
        name: String,
        /// The maximum number of characters allowed.
        max: usize,
    },
}

impl ValidationError {
    /// The base name that failed validation
    pub fn name(&self) -> &str {
        match self {
            Self::InvalidExtension { name }
            | Self::BadFormat { name }
            | Self::TooLong { name, .. } => name,
        }
    }
}

/// Connection error type
///
/// Represents failures talking to the controller over TCP. None of these
/// reach the caller directly: the transfer session reports every one of them
/// as a network failure, but keeps the detail for logging.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Connection or reply deadline elapsed
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Failed to resolve hostname
    #[error("Failed to resolve hostname {hostname}")]
    HostnameResolution {
        /// The hostname that failed to resolve.
        hostname: String,
    },

    /// The controller refused the connection
    #[error("Connection refused by {address}")]
    Refused {
        /// The `host:port` that refused the connection.
        address: String,
    },

    /// The controller closed the connection before sending a result code
    #[error("Connection closed before a reply was received")]
    ConnectionClosed,

    /// The reply did not contain a two-digit result code
    #[error("Failed to parse controller reply: {reply:?}")]
    ResponseParse {
        /// The reply as received, lossily decoded.
        reply: String,
    },

    /// I/O error
    #[error("I/O error: {reason}")]
    Io {
        /// The reason for the I/O error.
        reason: String,
    },
}

impl From<std::io::Error> for ConnectionError {
    fn from(err: std::io::Error) -> Self {
        ConnectionError::Io {
            reason: err.to_string(),
        }
    }
}

/// Main error type for ncsend
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Validation error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Connection(ConnectionError::ConnectionTimeout { .. })
        )
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
