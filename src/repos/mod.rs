/*
 * Responsibility
 * - lookup contracts the auth core consumes (credentials, memberships, tasks)
 * - Postgres implementations (sqlx) and an in-memory directory for tests/dev
 *
 * Notes
 * - all lookups are point-in-time reads; writes belong to other services
 */
use async_trait::async_trait;

use crate::repos::error::RepoError;
use crate::services::auth::UserRole;
use crate::services::permission::ProjectRole;

pub mod error;
pub mod memory;
pub mod membership_repo;
pub mod task_repo;
pub mod user_repo;

pub use memory::InMemoryDirectory;
pub use membership_repo::PgMembershipRepo;
pub use task_repo::PgTaskRepo;
pub use user_repo::PgUserRepo;

/// Account row as far as authentication cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub subject: String,
    pub name: String,
    pub role: UserRole,
}

/// Task fields needed to decide who may modify it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub task_id: i64,
    pub project_id: i64,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<CredentialRecord>, RepoError>;
}

#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Role of `subject` in `project_id`; at most one row exists per pair.
    async fn find_membership_role(
        &self,
        project_id: i64,
        subject: &str,
    ) -> Result<Option<ProjectRole>, RepoError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find_task(&self, task_id: i64) -> Result<Option<TaskRecord>, RepoError>;
}
