/*
 * Responsibility
 * - GET /me: request gate が bind した identity をそのまま返す
 */
use axum::Json;

use crate::api::v1::{dto::me::MeResponse, extractors::AuthCtxExtractor};

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<MeResponse> {
    Json(MeResponse::from(ctx))
}
