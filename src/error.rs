//! Error types for the client engine.
//!
//! This module defines error types for protocol-level failures, wire-line
//! parse failures, and connection setup problems.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level errors surfaced by the engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Inbound line exceeded the maximum allowed length.
    #[error("message too long: {actual} bytes (limit {limit})")]
    MessageTooLong {
        /// Observed line length in bytes.
        actual: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Failed to parse an inbound line.
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The raw line.
        string: String,
        /// The underlying parse error.
        #[source]
        cause: MessageParseError,
    },

    /// The connect timed out before the socket was established.
    #[error("connection timed out after {0:?}")]
    ConnectTimeout(std::time::Duration),

    /// SASL was requested with a mechanism the server does not offer.
    #[error("sasl mechanism {0} not supported by server")]
    SaslUnsupported(String),

    /// TLS setup failed.
    #[error("tls error: {0}")]
    Tls(String),

    /// The hostname did not resolve to any usable address.
    #[error("no address found for {0}")]
    NoAddress(String),
}

/// Errors encountered when parsing wire lines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Line was empty after CRLF trimming.
    #[error("empty message")]
    EmptyMessage,

    /// Command token was missing or malformed.
    #[error("invalid command")]
    InvalidCommand,

    /// Prefix was present but malformed.
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),
}
