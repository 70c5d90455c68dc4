//! Per-request authentication gate: bearer token → verify → bind `AuthCtx`.
//!
//! The gate never rejects a request. A missing, malformed, expired or forged
//! credential leaves the request unauthenticated and the handler's extractor
//! (`AuthCtxExtractor`) decides whether that is acceptable. CORS preflight
//! (`OPTIONS`) passes through untouched.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request},
    middleware::{self, Next},
    response::Response,
};
use tracing::{debug, warn};

use crate::services::auth::{
    AuthCtx, BearerError, BindOutcome, Verification, bearer_from_headers, bind_request_identity,
};
use crate::state::AppState;

/// Apply the gate to every route of `router`.
///
/// ```ignore
/// let v1 = api::v1::routes();
/// let v1 = middleware::auth::access::apply(v1, state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() == Method::OPTIONS {
        return next.run(req).await;
    }

    if let Some(auth_ctx) = authenticate(&state, req.headers()).await {
        // middleware → extractor への受け渡し
        if bind_request_identity(req.extensions_mut(), auth_ctx) == BindOutcome::Conflict {
            warn!("request already carries a different identity; keeping the first");
        }
    }

    next.run(req).await
}

/// Resolve the caller from the request headers.
///
/// `None` means "proceed unauthenticated"; the reason is only logged.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Option<AuthCtx> {
    let token = match bearer_from_headers(headers) {
        Ok(token) => token,
        Err(BearerError::Missing) => return None,
        Err(err) => {
            debug!(error = %err, "ignoring malformed credential");
            return None;
        }
    };

    let claims = match state.tokens.verify(token) {
        Verification::Valid(claims) => claims,
        Verification::Expired(claims) => {
            debug!(subject = %claims.subject, "ignoring expired credential");
            return None;
        }
        Verification::Invalid => {
            debug!("ignoring invalid credential");
            return None;
        }
    };

    // The account may have been removed after the token was issued.
    match state.users.find_by_subject(&claims.subject).await {
        Ok(Some(_)) => Some(AuthCtx::from(claims)),
        Ok(None) => {
            debug!(subject = %claims.subject, "credential record not found");
            None
        }
        Err(err) => {
            warn!(subject = %claims.subject, error = %err, "credential lookup failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{http::StatusCode, routing::get};
    use chrono::{Duration, Utc};
    use tower::ServiceExt;

    use super::*;
    use crate::api::v1::extractors::MaybeAuthCtx;
    use crate::repos::InMemoryDirectory;
    use crate::services::auth::{TokenCodec, UserRole};

    const SECRET: &[u8] = b"test-secret-key-for-signing-tokens-0123";

    async fn whoami(MaybeAuthCtx(ctx): MaybeAuthCtx) -> String {
        match ctx {
            Some(ctx) => format!("{}:{}", ctx.subject, ctx.role),
            None => "anonymous".to_string(),
        }
    }

    async fn setup() -> (Router, Arc<TokenCodec>, Arc<InMemoryDirectory>) {
        let dir = Arc::new(InMemoryDirectory::new());
        dir.add_user("ada@campus.edu", "Ada", UserRole::Student).await;
        let tokens = Arc::new(TokenCodec::new(SECRET, 3600).unwrap());
        let state = AppState::new(tokens.clone(), dir.clone(), dir.clone(), dir.clone());

        let routes = Router::new().route("/whoami", get(whoami).options(whoami));
        let router = apply(routes, state.clone()).with_state(state);
        (router, tokens, dir)
    }

    async fn call(router: Router, method: Method, auth: Option<&str>) -> (StatusCode, String) {
        let mut req = Request::builder().method(method).uri("/whoami");
        if let Some(auth) = auth {
            req = req.header("authorization", auth);
        }
        let res = router.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn no_header_proceeds_anonymously() {
        let (router, _, _) = setup().await;
        assert_eq!(
            call(router, Method::GET, None).await,
            (StatusCode::OK, "anonymous".into())
        );
    }

    #[tokio::test]
    async fn valid_token_binds_subject_and_role() {
        let (router, tokens, _) = setup().await;
        let token = tokens.issue("ada@campus.edu", UserRole::Student).unwrap();

        let (status, body) = call(router, Method::GET, Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ada@campus.edu:STUDENT");
    }

    #[tokio::test]
    async fn expired_token_is_treated_as_anonymous() {
        let (router, tokens, _) = setup().await;
        let token = tokens
            .issue_at("ada@campus.edu", UserRole::Student, Utc::now() - Duration::hours(2))
            .unwrap();

        let (status, body) = call(router, Method::GET, Some(&format!("Bearer {token}"))).await;
        assert_eq!((status, body.as_str()), (StatusCode::OK, "anonymous"));
    }

    #[tokio::test]
    async fn malformed_or_forged_credentials_are_anonymous() {
        let (router, tokens, _) = setup().await;
        let token = tokens.issue("ada@campus.edu", UserRole::Student).unwrap();

        for auth in [
            token.clone(),
            format!("Token {token}"),
            "Bearer not.a.jwt".to_string(),
            "Bearer ".to_string(),
        ] {
            let (status, body) = call(router.clone(), Method::GET, Some(&auth)).await;
            assert_eq!((status, body.as_str()), (StatusCode::OK, "anonymous"), "{auth}");
        }
    }

    #[tokio::test]
    async fn deleted_account_is_anonymous() {
        let (router, tokens, dir) = setup().await;
        let token = tokens.issue("ada@campus.edu", UserRole::Student).unwrap();
        dir.remove_user("ada@campus.edu").await;

        let (_, body) = call(router, Method::GET, Some(&format!("Bearer {token}"))).await;
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn preflight_skips_the_gate() {
        let (router, tokens, _) = setup().await;
        let token = tokens.issue("ada@campus.edu", UserRole::Student).unwrap();

        let (_, body) = call(router, Method::OPTIONS, Some(&format!("Bearer {token}"))).await;
        assert_eq!(body, "anonymous");
    }
}
