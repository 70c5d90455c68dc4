/*
 * Responsibility
 * - /projects/{id}/permissions, /tasks/{id}/permissions の response DTO
 */
use serde::Serialize;

use crate::services::permission::DecisionReason;

#[derive(Debug, Serialize)]
pub struct ProjectPermissionsResponse {
    pub project_id: i64,
    pub member: bool,
    pub owner: bool,
}

#[derive(Debug, Serialize)]
pub struct TaskPermissionsResponse {
    pub task_id: i64,
    pub can_modify: bool,
    pub reason: DecisionReason,
}
