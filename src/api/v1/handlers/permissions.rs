/*
 * Responsibility
 * - 呼び出し元が project / task に対して何をできるかを返す
 * - 存在しない project / task は 404 ではなく「全て false」
 * - 0 以下の ID は PermissionResolver が弾き 400 になる
 */
use axum::{Json, extract::State};

use crate::{
    api::v1::{
        dto::permissions::{ProjectPermissionsResponse, TaskPermissionsResponse},
        extractors::{AuthCtxExtractor, ProjectId, TaskId},
    },
    error::AppError,
    state::AppState,
};

pub async fn project_permissions(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    project_id: ProjectId,
) -> Result<Json<ProjectPermissionsResponse>, AppError> {
    let member = state.permissions.is_member(&ctx, project_id.id).await?;
    let owner = state.permissions.is_owner(&ctx, project_id.id).await?;

    Ok(Json(ProjectPermissionsResponse {
        project_id: project_id.id,
        member,
        owner,
    }))
}

pub async fn task_permissions(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    task_id: TaskId,
) -> Result<Json<TaskPermissionsResponse>, AppError> {
    let decision = state.permissions.explain_task_access(&ctx, task_id.id).await?;

    Ok(Json(TaskPermissionsResponse {
        task_id: task_id.id,
        can_modify: decision.allowed,
        reason: decision.reason,
    }))
}
