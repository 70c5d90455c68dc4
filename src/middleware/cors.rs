//! Cross-origin policy for the browser client.
//!
//! The API is read-only (GET) and `/ws` is a GET upgrade, so preflight only
//! ever needs GET. Bearer tokens travel in `Authorization`, never in cookies,
//! so credentials mode stays off and the development wildcard is safe.
//!
//! Production allows the exact origins in `CORS_ALLOWED_ORIGINS`; an empty
//! list allows none.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::Config;
use crate::middleware::http::REQUEST_ID_HEADER;

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(600);

pub fn apply(router: Router, config: &Config) -> Router {
    router.layer(layer(config))
}

fn allow_origin(config: &Config) -> AllowOrigin {
    if !config.app_env.is_production() {
        return AllowOrigin::any();
    }

    // `*` in the allowlist would make AllowOrigin::list panic; it is never a
    // meaningful production origin anyway.
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter(|origin| origin.as_str() != "*")
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    AllowOrigin::list(origins)
}

fn layer(config: &Config) -> CorsLayer {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    CorsLayer::new()
        .allow_origin(allow_origin(config))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            request_id.clone(),
        ])
        .expose_headers([request_id])
        .max_age(PREFLIGHT_MAX_AGE)
}
