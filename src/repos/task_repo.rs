/*
 * Responsibility
 * - task lookups with creator / assignee resolved to emails
 * - creator and assignee are nullable (deleted users, unassigned tasks)
 */
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::repos::{TaskRecord, TaskStore, error::RepoError};

#[derive(Debug, FromRow)]
pub struct TaskRow {
    pub task_id: i64,
    pub project_id: i64,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
}

impl From<TaskRow> for TaskRecord {
    fn from(row: TaskRow) -> Self {
        TaskRecord {
            task_id: row.task_id,
            project_id: row.project_id,
            created_by: row.created_by,
            assigned_to: row.assigned_to,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PgTaskRepo {
    db: PgPool,
}

impl PgTaskRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskStore for PgTaskRepo {
    async fn find_task(&self, task_id: i64) -> Result<Option<TaskRecord>, RepoError> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT
                t.task_id,
                t.project_id,
                creator.email AS created_by,
                assignee.email AS assigned_to
            FROM tasks t
            LEFT JOIN users creator ON creator.user_id = t.created_by
            LEFT JOIN users assignee ON assignee.user_id = t.assigned_to
            WHERE t.task_id = $1
            "#,
        )
        .bind(task_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(TaskRecord::from))
    }
}
