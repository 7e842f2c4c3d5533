//! Request-scoped context lookup.

use std::collections::HashMap;

/// Key read from context maps and emitted on records.
pub const TRACE_ID_KEY: &str = "trace_id";

/// Anything that can carry a request trace identifier.
pub trait TraceContext {
    fn trace_id(&self) -> Option<&str>;
}

/// Per-request values handed down from an inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    trace_id: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

impl TraceContext for RequestContext {
    fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }
}

impl TraceContext for HashMap<String, String> {
    fn trace_id(&self) -> Option<&str> {
        self.get(TRACE_ID_KEY).map(String::as_str)
    }
}

impl<T: TraceContext + ?Sized> TraceContext for &T {
    fn trace_id(&self) -> Option<&str> {
        (**self).trace_id()
    }
}
