use super::TraceId;
use tracing::{Level, Span, field};

/// Create a root span for one tick / dispatch cycle
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::span!(
        Level::INFO,
        "root",
        name = %name,
        trace_id = %trace_id.as_str(),
        instrument = field::Empty,
        subscriber = field::Empty
    )
}
