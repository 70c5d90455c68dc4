/*
 * Responsibility
 * - project_members lookups keyed by (project, member email)
 */
use async_trait::async_trait;
use sqlx::PgPool;

use crate::repos::{MembershipStore, error::RepoError};
use crate::services::permission::ProjectRole;

#[derive(Clone, Debug)]
pub struct PgMembershipRepo {
    db: PgPool,
}

impl PgMembershipRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MembershipStore for PgMembershipRepo {
    async fn find_membership_role(
        &self,
        project_id: i64,
        subject: &str,
    ) -> Result<Option<ProjectRole>, RepoError> {
        let role: Option<String> = sqlx::query_scalar(
            r#"
            SELECT pm.role
            FROM project_members pm
            JOIN users u ON u.user_id = pm.user_id
            WHERE pm.project_id = $1
              AND u.email = $2
            LIMIT 1
            "#,
        )
        .bind(project_id)
        .bind(subject)
        .fetch_optional(&self.db)
        .await?;

        role.map(|value| {
            value.parse::<ProjectRole>().map_err(|_| RepoError::CorruptRole {
                column: "project_members.role",
                value,
            })
        })
        .transpose()
    }
}
