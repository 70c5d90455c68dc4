/*
 * Responsibility
 * - in-process implementation of every lookup contract
 * - used by tests and by development mode when DATABASE_URL is unset
 */
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::repos::{
    CredentialRecord, CredentialStore, MembershipStore, TaskRecord, TaskStore, error::RepoError,
};
use crate::services::auth::UserRole;
use crate::services::permission::ProjectRole;

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<String, CredentialRecord>>,
    // (project_id, subject) -> role; the key enforces one role per pair
    memberships: RwLock<HashMap<(i64, String), ProjectRole>>,
    tasks: RwLock<HashMap<i64, TaskRecord>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, subject: &str, name: &str, role: UserRole) {
        let record = CredentialRecord {
            subject: subject.to_string(),
            name: name.to_string(),
            role,
        };
        self.users.write().await.insert(subject.to_string(), record);
    }

    pub async fn remove_user(&self, subject: &str) {
        self.users.write().await.remove(subject);
    }

    pub async fn add_member(&self, project_id: i64, subject: &str, role: ProjectRole) {
        self.memberships
            .write()
            .await
            .insert((project_id, subject.to_string()), role);
    }

    pub async fn add_task(&self, task: TaskRecord) {
        self.tasks.write().await.insert(task.task_id, task);
    }
}

#[async_trait]
impl CredentialStore for InMemoryDirectory {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<CredentialRecord>, RepoError> {
        Ok(self.users.read().await.get(subject).cloned())
    }
}

#[async_trait]
impl MembershipStore for InMemoryDirectory {
    async fn find_membership_role(
        &self,
        project_id: i64,
        subject: &str,
    ) -> Result<Option<ProjectRole>, RepoError> {
        Ok(self
            .memberships
            .read()
            .await
            .get(&(project_id, subject.to_string()))
            .copied())
    }
}

#[async_trait]
impl TaskStore for InMemoryDirectory {
    async fn find_task(&self, task_id: i64) -> Result<Option<TaskRecord>, RepoError> {
        Ok(self.tasks.read().await.get(&task_id).cloned())
    }
}
