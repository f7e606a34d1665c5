//! Commonly used types for convenient import.
//!
//! ```rust,no_run
//! use astrid_bridge_telemetry::prelude::*;
//!
//! # fn main() -> TelemetryResult<()> {
//! let config = LogConfig::new("info").with_format(LogFormat::Json);
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new("bridge").with_operation("dispatch");
//! let _guard = ctx.enter();
//! tracing::info!("processing frame");
//! # Ok(())
//! # }
//! ```

pub use crate::{
    setup_default_logging, setup_logging, LogConfig, LogFormat, LogTarget, RequestContext,
    RequestGuard, TelemetryError, TelemetryResult,
};
