/*
 * Responsibility
 * - GET /me の response DTO
 */
use serde::Serialize;

use crate::services::auth::{AuthCtx, UserRole};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub subject: String,
    pub role: UserRole,
}

impl From<AuthCtx> for MeResponse {
    fn from(ctx: AuthCtx) -> Self {
        Self {
            subject: ctx.subject,
            role: ctx.role,
        }
    }
}
