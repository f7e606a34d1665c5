//! Bus error types.

use thiserror::Error;

/// Errors the in-memory bus can produce.
#[derive(Debug, Error)]
pub enum BusError {
    /// No responder is currently bound to the requested address.
    #[error("no responder bound to {address}")]
    NoResponder {
        /// The address a `send` targeted.
        address: String,
    },

    /// A responder's request queue is full or has been dropped.
    #[error("responder for {address} is gone")]
    ResponderGone {
        /// The address whose responder is gone.
        address: String,
    },

    /// No reply arrived within the configured timeout.
    #[error("request to {address} timed out")]
    Timeout {
        /// The address a `send` targeted.
        address: String,
    },
}

/// Result type for bus operations.
pub type BusResult<T> = Result<T, BusError>;
