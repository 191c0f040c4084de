//! Path-based dispatch between the upstream forwarder and the asset
//! resolver.
//!
//! Installed as the front-door router's fallback handler, so every inbound
//! request lands here. Exactly one of the two backends handles each
//! request; the dispatcher itself never fails.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use http::uri::{InvalidUri, PathAndQuery, Uri};

use super::assets::AssetResolver;
use super::forward::Forwarder;

/// Read-only routing state shared by all front-door connections.
pub struct FrontdoorState {
    pub api_prefix: String,
    pub forwarder: Forwarder,
    pub assets: AssetResolver,
}

/// Route one request: API prefix ⇒ strip it and forward upstream,
/// anything else ⇒ static assets with the path untouched.
pub async fn dispatch(State(state): State<Arc<FrontdoorState>>, request: Request) -> Response {
    match strip_prefix_once(request.uri().path(), &state.api_prefix) {
        Some(stripped) => {
            let request = match rewrite_path(request, &stripped) {
                Ok(request) => request,
                Err(e) => {
                    tracing::warn!(error = %e, "rewritten path is not a valid URI");
                    return (StatusCode::BAD_REQUEST, "invalid request path").into_response();
                }
            };
            state.forwarder.forward(request).await
        }
        None => state.assets.resolve(request).await,
    }
}

/// Remove the routing prefix from `path`, exactly once, and re-root the
/// remainder. Returns `None` when the path is not API traffic.
///
/// `/api/users` with prefix `/api/` becomes `/users`; `/api/` becomes `/`.
fn strip_prefix_once(path: &str, prefix: &str) -> Option<String> {
    let rest = path.strip_prefix(prefix)?;
    if rest.starts_with('/') {
        Some(rest.to_string())
    } else {
        Some(format!("/{rest}"))
    }
}

/// Swap the request's path for the stripped one, preserving the query.
/// The request object is consumed by whichever handler wins, so mutating
/// it in place is safe.
fn rewrite_path(mut request: Request, new_path: &str) -> Result<Request, InvalidUri> {
    let path_and_query = match request.uri().query() {
        Some(query) => format!("{new_path}?{query}"),
        None => new_path.to_string(),
    };
    let path_and_query: PathAndQuery = path_and_query.parse()?;

    let mut parts = request.uri().clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    // Reassembling from parts of a valid URI cannot fail once the new
    // path-and-query parsed.
    if let Ok(uri) = Uri::from_parts(parts) {
        *request.uri_mut() = uri;
    }
    Ok(request)
}
