//! The public front door: one listener that transparently serves API
//! traffic (reverse-proxied to the backend origin) and static frontend
//! assets on the same port.

pub mod assets;
pub mod dispatch;
pub mod forward;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::sync::oneshot;

use crate::context::AppContext;
use assets::AssetResolver;
use dispatch::{dispatch, FrontdoorState};
use forward::Forwarder;

/// Run the front-door listener as a background task.
///
/// Waits for the primary listener's readiness signal before accepting
/// connections, so the proxy never forwards to a backend that has not
/// finished binding. A dropped sender means the primary listener never
/// came up; the front door then exits without serving anything.
///
/// A missing asset root disables the front door entirely (logged, clean
/// exit): the primary listener must keep running without the bundle.
/// Errors returned from here are handled per the `frontdoor.required`
/// policy by the startup sequence.
pub async fn run(
    ctx: Arc<AppContext>,
    forwarder: Forwarder,
    ready: oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    if ready.await.is_err() {
        tracing::info!("primary listener never became ready, front door not started");
        return Ok(());
    }

    let config = &ctx.config.frontdoor;

    let assets = match AssetResolver::new(&config.asset_dir).await {
        Ok(assets) => assets,
        Err(e) => {
            tracing::warn!(
                asset_dir = %config.asset_dir.display(),
                error = %e,
                "front door disabled"
            );
            return Ok(());
        }
    };

    let state = Arc::new(FrontdoorState {
        api_prefix: config.api_prefix.clone(),
        forwarder,
        assets,
    });

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_address)
        .await
        .with_context(|| format!("failed to bind front door port {}", config.listen_address))?;

    tracing::info!(
        address = %config.listen_address,
        asset_dir = %ctx.config.frontdoor.asset_dir.display(),
        api_prefix = %ctx.config.frontdoor.api_prefix,
        "front door listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Every path goes through the dispatcher; there are no fixed routes on
/// the public port.
fn router(state: Arc<FrontdoorState>) -> Router {
    Router::new().fallback(dispatch).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use tower::ServiceExt;

    use crate::config::GateConfig;
    use figment::Figment;

    /// Spawn a local backend that answers every request with its own view
    /// of the path (and query, if any) so tests can assert what the
    /// forwarder actually sent.
    async fn spawn_echo_backend() -> String {
        async fn echo(request: Request) -> axum::response::Response {
            let uri = request.uri().clone();
            match uri.query() {
                Some(query) => format!("{}?{}", uri.path(), query).into_response(),
                None => uri.path().to_string().into_response(),
            }
        }

        let app = Router::new().fallback(echo);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn test_router(origin: &str, asset_dir: &std::path::Path) -> Router {
        let forwarder = Forwarder::new(origin, Duration::from_secs(5)).unwrap();
        let assets = AssetResolver::new(asset_dir).await.unwrap();
        router(Arc::new(FrontdoorState {
            api_prefix: "/api/".to_string(),
            forwarder,
            assets,
        }))
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn api_traffic_reaches_origin_with_prefix_stripped() {
        let origin = spawn_echo_backend().await;
        let dir = tempfile::tempdir().unwrap();
        let app = test_router(&origin, dir.path()).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/users")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "/users");
    }

    #[tokio::test]
    async fn query_string_survives_forwarding() {
        let origin = spawn_echo_backend().await;
        let dir = tempfile::tempdir().unwrap();
        let app = test_router(&origin, dir.path()).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/users?page=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(body_string(response).await, "/users?page=2");
    }

    #[tokio::test]
    async fn non_api_traffic_is_served_from_assets() {
        let origin = spawn_echo_backend().await;
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "bundle").unwrap();
        let app = test_router(&origin, dir.path()).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/index.html")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "bundle");
    }

    #[tokio::test]
    async fn upstream_error_status_is_relayed_verbatim() {
        async fn teapot() -> axum::response::Response {
            (StatusCode::IM_A_TEAPOT, "short and stout").into_response()
        }
        let backend = Router::new().fallback(teapot);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, backend).await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let app = test_router(&format!("http://{addr}"), dir.path()).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(body_string(response).await, "short and stout");
    }

    #[tokio::test]
    async fn dropped_readiness_sender_means_clean_exit() {
        let config: GateConfig = Figment::new().extract().unwrap();
        let ctx = Arc::new(AppContext { config, db: None });
        let forwarder = Forwarder::new("http://localhost:8888", Duration::from_secs(1)).unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        drop(tx);

        run(ctx, forwarder, rx).await.unwrap();
    }

    #[tokio::test]
    async fn missing_asset_root_disables_front_door_cleanly() {
        let mut config: GateConfig = Figment::new().extract().unwrap();
        config.frontdoor.asset_dir = "/definitely/not/a/real/dist".into();
        let ctx = Arc::new(AppContext { config, db: None });
        let forwarder = Forwarder::new("http://localhost:8888", Duration::from_secs(1)).unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        tx.send(()).unwrap();

        // Exits Ok before ever binding the public port.
        run(ctx, forwarder, rx).await.unwrap();
    }
}
