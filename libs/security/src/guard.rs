use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::signature::verify_shared_secret;

/// Shared-secret header check configuration, installed as a request extension.
#[derive(Clone, Debug, Default)]
pub struct SharedSecretConfig {
    pub header: String,
    pub secret: Option<String>,
}

impl SharedSecretConfig {
    pub fn new(header: impl Into<String>, secret: Option<String>) -> Self {
        Self {
            header: header.into(),
            secret: secret.filter(|s| !s.is_empty()),
        }
    }
}

/// Rejects requests whose configured header does not carry the shared secret.
/// Passes everything through when no secret is configured.
pub async fn require_shared_secret(req: Request<Body>, next: Next) -> Response {
    let cfg = req
        .extensions()
        .get::<SharedSecretConfig>()
        .cloned()
        .unwrap_or_default();
    if let Some(secret) = cfg.secret {
        let provided = req
            .headers()
            .get(cfg.header.as_str())
            .and_then(|v| v.to_str().ok());
        if let Err(err) = verify_shared_secret(&secret, provided) {
            warn!(header = %cfg.header, error = %err, "webhook secret check failed");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Extension, Router, middleware, routing::post};
    use tower::ServiceExt;

    fn app(secret: Option<&str>) -> Router {
        Router::new()
            .route("/", post(|| async { StatusCode::OK }))
            .layer(middleware::from_fn(require_shared_secret))
            .layer(Extension(SharedSecretConfig::new(
                "x-webhook-secret",
                secret.map(str::to_string),
            )))
    }

    fn request(secret: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(secret) = secret {
            builder = builder.header("x-webhook-secret", secret);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn blocks_wrong_or_missing_secret() {
        let resp = app(Some("expected")).oneshot(request(None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let resp = app(Some("expected"))
            .oneshot(request(Some("nope")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let resp = app(Some("expected"))
            .oneshot(request(Some("expected")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn allows_everything_without_secret() {
        let resp = app(None).oneshot(request(None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = app(Some("")).oneshot(request(None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
