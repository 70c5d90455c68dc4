//! Router-wide HTTP layers, outermost first:
//!
//! 1. layer errors (timeout) become plain status responses
//! 2. `x-request-id`: generated when absent, echoed on the response
//! 3. access log span carrying the request id
//! 4. timeout, then body size limit (both from `Config`)
//!
//! For `/ws` the timeout only covers the upgrade; the socket itself runs on
//! its own task afterwards.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::error_handling::HandleErrorLayer;
use axum::http::{Request, StatusCode, header::HeaderName};
use tower::timeout::{TimeoutLayer, error::Elapsed};
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::config::Config;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn apply(router: Router, config: &Config) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(layer_error))
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.request_timeout_seconds,
            )))
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes)),
    )
}

fn request_span(req: &Request<Body>) -> Span {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "http",
        method = %req.method(),
        uri = %req.uri(),
        request_id = %request_id,
    )
}

async fn layer_error(err: BoxError) -> StatusCode {
    if err.is::<Elapsed>() {
        StatusCode::REQUEST_TIMEOUT
    } else {
        tracing::error!(error = %err, "unhandled layer error");
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        http::{Method, header},
        routing::{get, post},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::config::AppEnv;

    fn router() -> Router {
        let routes = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .route("/echo", post(|body: String| async move { body }));
        apply(routes, &Config::for_tests(AppEnv::Development))
    }

    #[tokio::test]
    async fn request_id_is_generated_when_absent() {
        let req = Request::builder().uri("/ping").body(Body::empty()).unwrap();
        let res = router().oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn client_request_id_is_echoed() {
        let req = Request::builder()
            .uri("/ping")
            .header(REQUEST_ID_HEADER, "req-42")
            .body(Body::empty())
            .unwrap();
        let res = router().oneshot(req).await.unwrap();

        assert_eq!(res.headers()[REQUEST_ID_HEADER], "req-42");
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let body = "x".repeat(64);
        let req = Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap();
        let res = router().oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
