//! Static asset serving for the pre-built frontend bundle.

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::extract::Request;
use axum::response::Response;
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// Construction-time resolver errors. Non-fatal to the process: the
/// front-door listener logs them and exits early, leaving the primary
/// listener untouched.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset root `{0}` does not exist")]
    RootMissing(PathBuf),
    #[error("asset root `{0}` is not a directory")]
    RootNotADirectory(PathBuf),
}

/// Maps request paths to files under the asset root.
///
/// `ServeDir` rejects any path that would escape the root (including
/// percent-encoded traversal) and answers plain 404 for missing files.
/// No SPA fallback is configured: unknown routes are 404, and only the
/// filesystem-level `index.html` resolution for directories applies.
#[derive(Clone)]
pub struct AssetResolver {
    service: ServeDir,
}

impl AssetResolver {
    /// Fail closed if the asset root is absent: a gateway silently serving
    /// 404s for every asset is harder to diagnose than one that refuses
    /// to start its static half.
    pub async fn new(root: &Path) -> Result<Self, AssetError> {
        let meta = tokio::fs::metadata(root)
            .await
            .map_err(|_| AssetError::RootMissing(root.to_path_buf()))?;
        if !meta.is_dir() {
            return Err(AssetError::RootNotADirectory(root.to_path_buf()));
        }

        Ok(Self {
            service: ServeDir::new(root),
        })
    }

    /// Serve one request from the asset root. Never fails: filesystem
    /// problems surface as 404/500 responses from `ServeDir`.
    pub async fn resolve(&self, request: Request) -> Response {
        match self.service.clone().oneshot(request).await {
            Ok(response) => response.map(Body::new),
            Err(infallible) => match infallible {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn fixture_resolver(dir: &tempfile::TempDir) -> AssetResolver {
        AssetResolver::new(dir.path()).await.unwrap()
    }

    fn get(path: &str) -> Request {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_root_refuses_to_start() {
        let err = AssetResolver::new(Path::new("/definitely/not/a/real/dist")).await;
        assert!(matches!(err, Err(AssetError::RootMissing(_))));
    }

    #[tokio::test]
    async fn file_root_refuses_to_start() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = AssetResolver::new(file.path()).await;
        assert!(matches!(err, Err(AssetError::RootNotADirectory(_))));
    }

    #[tokio::test]
    async fn serves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>admin</html>").unwrap();
        let resolver = fixture_resolver(&dir).await;

        let response = resolver.resolve(get("/index.html")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"<html>admin</html>");
    }

    #[tokio::test]
    async fn missing_file_is_not_found_without_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        let resolver = fixture_resolver(&dir).await;

        // No SPA fallback: an unknown route must not serve index.html.
        let response = resolver.resolve(get("/dashboard/settings")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let outside = dir.path().join("secret.txt");
        std::fs::write(&outside, "secret").unwrap();
        let nested = dir.path().join("public");
        std::fs::create_dir(&nested).unwrap();
        let resolver = AssetResolver::new(&nested).await.unwrap();

        for path in [
            "/../secret.txt",
            "/%2e%2e/secret.txt",
            "/..%2fsecret.txt",
            "/foo/../../secret.txt",
        ] {
            let response = resolver.resolve(get(path)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        }
    }
}
