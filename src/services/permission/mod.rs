//! Project / task permission predicates used to gate mutations.
//!
//! Every predicate is total: unknown projects, unknown tasks and non-members
//! all resolve to `false`, so a caller cannot tell "does not exist" from
//! "not allowed". Errors are reserved for ids that can never exist and for
//! storage failures.

mod role;

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::repos::{MembershipStore, TaskStore, error::RepoError};
use crate::services::auth::AuthCtx;

pub use role::{ProjectRole, UnknownProjectRole, is_owner_role};

#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    #[error("invalid {kind} id: {value}")]
    InvalidId { kind: &'static str, value: i64 },
    #[error("permission lookup failed")]
    Lookup(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    ProjectOwner,
    Creator,
    Assignee,
    NotPermitted,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub reason: DecisionReason,
}

impl Decision {
    fn allow(reason: DecisionReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

fn checked_id(kind: &'static str, value: i64) -> Result<i64, PermissionError> {
    if value <= 0 {
        return Err(PermissionError::InvalidId { kind, value });
    }
    Ok(value)
}

#[derive(Clone)]
pub struct PermissionResolver {
    memberships: Arc<dyn MembershipStore>,
    tasks: Arc<dyn TaskStore>,
}

impl PermissionResolver {
    pub fn new(memberships: Arc<dyn MembershipStore>, tasks: Arc<dyn TaskStore>) -> Self {
        Self { memberships, tasks }
    }

    async fn membership_role(
        &self,
        who: &AuthCtx,
        project_id: i64,
    ) -> Result<Option<ProjectRole>, PermissionError> {
        let project_id = checked_id("project", project_id)?;
        Ok(self
            .memberships
            .find_membership_role(project_id, &who.subject)
            .await?)
    }

    /// Any membership row for (caller, project).
    pub async fn is_member(&self, who: &AuthCtx, project_id: i64) -> Result<bool, PermissionError> {
        Ok(self.membership_role(who, project_id).await?.is_some())
    }

    /// Membership row with an owner role (LEADER / MENTOR).
    pub async fn is_owner(&self, who: &AuthCtx, project_id: i64) -> Result<bool, PermissionError> {
        Ok(self
            .membership_role(who, project_id)
            .await?
            .is_some_and(is_owner_role))
    }

    pub async fn can_modify_task(&self, who: &AuthCtx, task_id: i64) -> Result<bool, PermissionError> {
        Ok(self.explain_task_access(who, task_id).await?.allowed)
    }

    /// Owners of the parent project may modify any task; otherwise only the
    /// task's creator or assignee may.
    pub async fn explain_task_access(
        &self,
        who: &AuthCtx,
        task_id: i64,
    ) -> Result<Decision, PermissionError> {
        let task_id = checked_id("task", task_id)?;

        let Some(task) = self.tasks.find_task(task_id).await? else {
            debug!(task_id, subject = %who.subject, "task not found");
            return Ok(Decision::deny(DecisionReason::NotFound));
        };

        // stored parent id is trusted as-is; a dangling one just has no members
        let owner = self
            .memberships
            .find_membership_role(task.project_id, &who.subject)
            .await?
            .is_some_and(is_owner_role);
        if owner {
            return Ok(Decision::allow(DecisionReason::ProjectOwner));
        }

        let is_subject = |field: &Option<String>| field.as_deref() == Some(who.subject.as_str());

        if is_subject(&task.created_by) {
            return Ok(Decision::allow(DecisionReason::Creator));
        }
        if is_subject(&task.assigned_to) {
            return Ok(Decision::allow(DecisionReason::Assignee));
        }

        Ok(Decision::deny(DecisionReason::NotPermitted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::{InMemoryDirectory, TaskRecord};
    use crate::services::auth::UserRole;

    const P1: i64 = 1;
    const ITEM: i64 = 10;

    fn user(subject: &str) -> AuthCtx {
        AuthCtx::new(subject, UserRole::Student)
    }

    async fn resolver() -> PermissionResolver {
        let dir = Arc::new(InMemoryDirectory::new());
        dir.add_member(P1, "u1@campus.edu", ProjectRole::Leader).await;
        dir.add_member(P1, "u5@campus.edu", ProjectRole::Member).await;
        dir.add_member(P1, "u6@campus.edu", ProjectRole::Mentor).await;
        dir.add_task(TaskRecord {
            task_id: ITEM,
            project_id: P1,
            created_by: Some("u2@campus.edu".into()),
            assigned_to: Some("u3@campus.edu".into()),
        })
        .await;
        dir.add_task(TaskRecord {
            task_id: ITEM + 1,
            project_id: P1,
            created_by: None,
            assigned_to: None,
        })
        .await;

        PermissionResolver::new(dir.clone(), dir)
    }

    #[tokio::test]
    async fn owner_and_member_predicates() {
        let r = resolver().await;

        assert!(r.is_owner(&user("u1@campus.edu"), P1).await.unwrap());
        assert!(r.is_member(&user("u1@campus.edu"), P1).await.unwrap());
        assert!(!r.is_owner(&user("u2@campus.edu"), P1).await.unwrap());
        assert!(!r.is_member(&user("u2@campus.edu"), P1).await.unwrap());
    }

    #[tokio::test]
    async fn plain_member_is_not_owner_but_mentor_is() {
        let r = resolver().await;

        assert!(r.is_member(&user("u5@campus.edu"), P1).await.unwrap());
        assert!(!r.is_owner(&user("u5@campus.edu"), P1).await.unwrap());
        assert!(r.is_owner(&user("u6@campus.edu"), P1).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_project_is_false_not_error() {
        let r = resolver().await;

        assert!(!r.is_member(&user("u1@campus.edu"), 999).await.unwrap());
        assert!(!r.is_owner(&user("u1@campus.edu"), 999).await.unwrap());
    }

    #[tokio::test]
    async fn task_modification_matrix() {
        let r = resolver().await;

        let check = |who: &'static str| {
            let r = r.clone();
            async move { r.explain_task_access(&user(who), ITEM).await.unwrap() }
        };

        assert_eq!(
            check("u1@campus.edu").await,
            Decision::allow(DecisionReason::ProjectOwner)
        );
        assert_eq!(check("u2@campus.edu").await, Decision::allow(DecisionReason::Creator));
        assert_eq!(check("u3@campus.edu").await, Decision::allow(DecisionReason::Assignee));
        assert_eq!(
            check("u4@campus.edu").await,
            Decision::deny(DecisionReason::NotPermitted)
        );

        assert!(r.can_modify_task(&user("u2@campus.edu"), ITEM).await.unwrap());
        assert!(!r.can_modify_task(&user("u4@campus.edu"), ITEM).await.unwrap());
    }

    #[tokio::test]
    async fn plain_member_cannot_modify_someone_elses_task() {
        let r = resolver().await;

        assert!(!r.can_modify_task(&user("u5@campus.edu"), ITEM).await.unwrap());
        assert!(r.can_modify_task(&user("u6@campus.edu"), ITEM).await.unwrap());
    }

    #[tokio::test]
    async fn unassigned_task_without_creator_is_owner_only() {
        let r = resolver().await;

        assert!(r.can_modify_task(&user("u1@campus.edu"), ITEM + 1).await.unwrap());
        assert!(!r.can_modify_task(&user("u2@campus.edu"), ITEM + 1).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_task_is_denied() {
        let r = resolver().await;

        let decision = r.explain_task_access(&user("u1@campus.edu"), 404).await.unwrap();
        assert_eq!(decision, Decision::deny(DecisionReason::NotFound));
    }

    #[tokio::test]
    async fn stored_task_with_non_positive_project_is_denied_not_an_error() {
        let dir = Arc::new(InMemoryDirectory::new());
        dir.add_task(TaskRecord {
            task_id: ITEM,
            project_id: 0,
            created_by: Some("u2@campus.edu".into()),
            assigned_to: None,
        })
        .await;
        let r = PermissionResolver::new(dir.clone(), dir);

        let decision = r.explain_task_access(&user("u4@campus.edu"), ITEM).await.unwrap();
        assert_eq!(decision, Decision::deny(DecisionReason::NotPermitted));
        assert!(r.can_modify_task(&user("u2@campus.edu"), ITEM).await.unwrap());
    }

    #[tokio::test]
    async fn non_positive_ids_are_errors() {
        let r = resolver().await;

        assert!(matches!(
            r.is_member(&user("u1@campus.edu"), 0).await,
            Err(PermissionError::InvalidId { kind: "project", value: 0 })
        ));
        assert!(matches!(
            r.can_modify_task(&user("u1@campus.edu"), -3).await,
            Err(PermissionError::InvalidId { kind: "task", value: -3 })
        ));
    }

    #[tokio::test]
    async fn predicates_are_stable_under_concurrency() {
        let r = resolver().await;

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let r = r.clone();
                tokio::spawn(async move { r.can_modify_task(&user("u3@campus.edu"), ITEM).await })
            })
            .collect();

        for h in handles {
            assert!(h.await.unwrap().unwrap());
        }
    }
}
