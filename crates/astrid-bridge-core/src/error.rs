//! Bridge error types.

use thiserror::Error;

/// Errors that can occur while dispatching or serving a client frame.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The frame was missing a mandatory field or carried an unrecognised `type`.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The underlying bus rejected a send, publish, or subscription request.
    #[error("bus error: {0}")]
    Bus(String),

    /// Writing the outbound envelope to the client socket failed.
    #[error("socket write failed: {0}")]
    SocketWrite(String),

    /// A regular expression in a permission rule failed to compile.
    #[error("invalid address_re pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The offending pattern source.
        pattern: String,
        /// The underlying regex compile error.
        #[source]
        source: regex::Error,
    },
}

/// Result type used throughout the bridge.
pub type BridgeResult<T> = Result<T, BridgeError>;
