//! Mock `Bus` and `ClientSocket` implementations shared across the bridge
//! crates' test suites.

mod mocks;

pub use mocks::{MockBus, MockClientSocket};
