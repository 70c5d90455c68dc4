/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /me, /projects, /tasks
 * - request gate は app 側で v1 全体に layer として掛ける
 */
use axum::{Router, routing::get};

use crate::state::AppState;

use crate::api::v1::handlers::{
    health::health,
    me::me,
    permissions::{project_permissions, task_permissions},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/me", get(me))
        .route("/projects/{project_id}/permissions", get(project_permissions))
        .route("/tasks/{task_id}/permissions", get(task_permissions))
}
