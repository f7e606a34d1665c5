//! Request correlation: a span-backed context tying every log line for one
//! client socket together across frame dispatch, auth round trips, and
//! outbound delivery.

use tracing::span::EnteredSpan;
use tracing::Span;
use uuid::Uuid;

/// Correlates log lines for one unit of work (one client socket's session,
/// by convention) under a single `tracing` span.
#[derive(Debug, Clone)]
pub struct RequestContext {
    component: String,
    correlation_id: String,
    operation: Option<String>,
}

impl RequestContext {
    /// Start a context for `component`, generating a fresh correlation id.
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            correlation_id: Uuid::new_v4().to_string(),
            operation: None,
        }
    }

    /// Use an existing correlation id instead of generating one — for a
    /// bridge, the socket's own id.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    /// Record which operation is in progress.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// The correlation id this context carries.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Build the `tracing` span log lines should be emitted under.
    #[must_use]
    pub fn span(&self) -> Span {
        tracing::info_span!(
            "request",
            component = %self.component,
            correlation_id = %self.correlation_id,
            operation = self.operation.as_deref().unwrap_or("-"),
        )
    }

    /// Enter the context's span for the lifetime of the returned guard.
    #[must_use]
    pub fn enter(&self) -> RequestGuard {
        RequestGuard {
            _entered: self.span().entered(),
        }
    }
}

/// Holds a [`RequestContext`]'s span entered; logs emitted while this is
/// alive are correlated under it.
pub struct RequestGuard {
    _entered: EnteredSpan,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_correlation_id_overrides_generated_one() {
        let ctx = RequestContext::new("bridge").with_correlation_id("sock-1");
        assert_eq!(ctx.correlation_id(), "sock-1");
    }

    #[test]
    fn enter_produces_a_guard() {
        let ctx = RequestContext::new("bridge").with_operation("dispatch");
        let _guard = ctx.enter();
        tracing::info!("inside span");
    }
}
