/*
 * Responsibility
 * - Path の String を数値 ID として受け取る
 * 主な責務
 *  - i64 への parse と 400 への変換
 *  - Axum の FromRequestParts 実装
 * 置かないもの
 *  - 正の値かどうかの判定 (PermissionResolver が行う)
 *  - Project / Task といった具体リソース名
 */
use std::marker::PhantomData;

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::error::AppError;

#[derive(Clone, Copy)]
pub struct ResourceId<T> {
    pub id: i64,
    _marker: PhantomData<T>,
}

impl<T> ResourceId<T> {
    fn new(id: i64) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }
}

impl<S, T> FromRequestParts<S> for ResourceId<T>
where
    S: Send + Sync,
    T: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::bad_request("INVALID_ID", "missing id in path"))?;

        let id = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::bad_request("INVALID_ID", format!("'{raw}' is not a numeric id")))?;

        Ok(Self::new(id))
    }
}

impl<T> std::fmt::Debug for ResourceId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceId").field("id", &self.id).finish()
    }
}
