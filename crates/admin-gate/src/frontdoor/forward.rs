//! Single-origin reverse proxy.
//!
//! The forwarder relays bytes verbatim to one fixed backend origin: no
//! retries, no caching, no body transformation. Only scheme/host/port are
//! rewritten; the (already prefix-stripped) path and query are kept intact.
//! Bodies stream through in both directions, so uploads and downloads of
//! any size pass without buffering.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use reqwest::Url;
use tracing::Instrument;
use uuid::Uuid;

/// Request-correlation header attached to every forwarded request and
/// echoed on the response.
pub const REQUEST_ID_HEADER: &str = "x-gate-request-id";

/// Headers that should NOT be forwarded (hop-by-hop headers).
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "host",
    "connection",
    "transfer-encoding",
    "keep-alive",
    "upgrade",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
];

/// Construction-time forwarder errors. These are fatal to process startup.
#[derive(Debug, thiserror::Error)]
pub enum ForwarderError {
    #[error("invalid upstream origin `{origin}`: {reason}")]
    InvalidOrigin { origin: String, reason: String },
    #[error("upstream origin `{0}` must be an absolute http or https URL")]
    UnsupportedOrigin(String),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Relays requests to one fixed origin resolved once at startup.
///
/// Cheap to clone; the origin is immutable after construction, so the
/// request hot path is lock-free.
#[derive(Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    origin: Url,
}

impl Forwarder {
    /// Parse the configured origin and build the upstream client.
    ///
    /// An unparseable origin is a configuration error the orchestrator
    /// turns into a fatal startup failure, never a per-request condition.
    pub fn new(origin: &str, timeout: Duration) -> Result<Self, ForwarderError> {
        let origin_url = Url::parse(origin).map_err(|e| ForwarderError::InvalidOrigin {
            origin: origin.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(origin_url.scheme(), "http" | "https") || origin_url.host_str().is_none() {
            return Err(ForwarderError::UnsupportedOrigin(origin.to_string()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            origin: origin_url,
        })
    }

    /// Host (and port) of the configured origin, for logging.
    pub fn origin_authority(&self) -> String {
        match self.origin.port() {
            Some(port) => format!("{}:{port}", self.origin.host_str().unwrap_or_default()),
            None => self.origin.host_str().unwrap_or_default().to_string(),
        }
    }

    /// Relay one request to the origin and stream the response back.
    ///
    /// Whatever the origin answers — including error statuses — is relayed
    /// verbatim. Only transport failures are translated: unreachable origin
    /// becomes 502, upstream timeout becomes 504.
    pub async fn forward(&self, request: Request) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let (parts, body) = request.into_parts();

        // Stream the request body upstream unbuffered.
        let body = reqwest::Body::wrap_stream(body.into_data_stream());

        let mut url = self.origin.clone();
        url.set_path(parts.uri.path());
        url.set_query(parts.uri.query());

        let span = gate_tracing::upstream_forward_span!(&request_id, self.origin_authority());
        let start = Instant::now();

        async {
            let mut req_builder = self
                .client
                .request(parts.method, url)
                .body(body)
                .header(REQUEST_ID_HEADER, &request_id);

            // Forward non-hop-by-hop headers from the original request.
            for (name, value) in parts.headers.iter() {
                let name_str = name.as_str().to_lowercase();
                if HOP_BY_HOP_HEADERS.contains(&name_str.as_str()) {
                    continue;
                }
                if name_str == REQUEST_ID_HEADER {
                    continue;
                }
                // The streamed body goes out chunked; a stale length would
                // contradict it.
                if name_str == "content-length" {
                    continue;
                }
                req_builder = req_builder.header(name, value);
            }

            let upstream_result = req_builder.send().await;

            build_response(upstream_result, start, &request_id)
        }
        .instrument(span)
        .await
    }
}

/// Build an axum response from the upstream result, streaming the body
/// through unchanged.
fn build_response(
    upstream_result: Result<reqwest::Response, reqwest::Error>,
    start: Instant,
    request_id: &str,
) -> Response {
    let upstream_resp = match upstream_result {
        Ok(resp) => resp,
        Err(e) => {
            let latency = start.elapsed().as_millis() as u64;
            tracing::Span::current().record("latency_ms", latency);

            if e.is_timeout() {
                tracing::Span::current().record("status", 504_u16);
                tracing::error!(error = %e, "upstream timeout");
                return (StatusCode::GATEWAY_TIMEOUT, "upstream timeout").into_response();
            }
            tracing::Span::current().record("status", 502_u16);
            tracing::error!(error = %e, "upstream connection error");
            return (StatusCode::BAD_GATEWAY, "upstream connection error").into_response();
        }
    };

    let status = upstream_resp.status();
    let latency = start.elapsed().as_millis() as u64;
    tracing::Span::current().record("latency_ms", latency);
    tracing::Span::current().record("status", status.as_u16());

    let mut response_builder = Response::builder()
        .status(StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY));

    for (name, value) in upstream_resp.headers().iter() {
        let name_str = name.as_str().to_lowercase();
        if HOP_BY_HOP_HEADERS.contains(&name_str.as_str()) {
            continue;
        }
        response_builder = response_builder.header(name, value);
    }

    response_builder = response_builder.header(
        REQUEST_ID_HEADER,
        HeaderValue::from_str(request_id).unwrap_or_else(|_| HeaderValue::from_static("unknown")),
    );

    let body = Body::from_stream(upstream_resp.bytes_stream());

    response_builder.body(body).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to build response");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
    })
}
