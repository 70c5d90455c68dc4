/*
 * Responsibility
 * - handler が返す共通エラー (AppError)
 * - IntoResponse で HTTP status と JSON `{ "error": { code, message } }` に変換
 * - repo / permission のエラーを 1 つの形にまとめる
 *
 * Notes
 * - 内部エラーの詳細はログにだけ出し、レスポンスには出さない
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::permission::PermissionError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    BadRequest { code: &'static str, message: String },

    #[error("authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    #[error("internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    code: &'a str,
    message: String,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { code, .. } => *code,
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Internal => "INTERNAL",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            error: ErrorDetail {
                code: self.code(),
                message: self.to_string(),
            },
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        tracing::error!(error = %err, "lookup failed");
        Self::Internal
    }
}

impl From<PermissionError> for AppError {
    fn from(err: PermissionError) -> Self {
        match err {
            // ids that can never exist, e.g. /projects/0
            PermissionError::InvalidId { .. } => Self::bad_request("INVALID_ID", err.to_string()),
            PermissionError::Lookup(inner) => inner.into(),
        }
    }
}
