/*
 * Responsibility
 * - request extensions に bind された AuthCtx を handler 引数として取り出す
 *
 * 主な責務
 *  - AuthCtxExtractor: 認証必須。未 bind なら 401
 *  - MaybeAuthCtx: 認証任意。未 bind なら None
 * 置かないもの
 *  - token の検証 (middleware::auth::access)
 */
use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::types::AuthCtx;
use crate::error::AppError;

/// Caller identity; rejects with 401 when the request gate bound nothing.
#[derive(Debug, Clone)]
pub struct AuthCtxExtractor(pub AuthCtx);

impl<S> FromRequestParts<S> for AuthCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthCtx>()
            .cloned()
            .map(Self)
            .ok_or(AppError::Unauthorized)
    }
}

#[derive(Debug, Clone)]
pub struct MaybeAuthCtx(pub Option<AuthCtx>);

impl<S> FromRequestParts<S> for MaybeAuthCtx
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<AuthCtx>().cloned()))
    }
}
