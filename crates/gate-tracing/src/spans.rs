//! Span builder helpers for gateway instrumentation.

/// Create a tracing span for an upstream forward to the backend origin.
///
/// `status` and `latency_ms` are recorded once the origin has answered
/// (or refused).
#[macro_export]
macro_rules! upstream_forward_span {
    ($request_id:expr, $origin:expr) => {
        tracing::info_span!(
            "upstream_forward",
            request_id = %$request_id,
            origin = %$origin,
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        )
    };
}
