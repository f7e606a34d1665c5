//! An in-memory subject-addressed bus implementing the bridge's `Bus`
//! trait, supplementing the distilled specification with a real adapter so
//! the bridge can run standalone rather than only against a mock.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod bus;
mod error;

pub use bus::{IncomingRequest, InMemoryBus, Responder, DEFAULT_CHANNEL_CAPACITY, DEFAULT_REQUEST_TIMEOUT};
pub use error::{BusError, BusResult};
