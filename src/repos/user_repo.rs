/*
 * Responsibility
 * - read-only credential lookups on the users table
 * - email is the token subject
 */
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::repos::{CredentialRecord, CredentialStore, error::RepoError};
use crate::services::auth::UserRole;

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub email: String,
    pub name: String,
    pub role: String,
}

impl TryFrom<UserRow> for CredentialRecord {
    type Error = RepoError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<UserRole>().map_err(|_| RepoError::CorruptRole {
            column: "users.role",
            value: row.role.clone(),
        })?;

        Ok(CredentialRecord {
            subject: row.email,
            name: row.name,
            role,
        })
    }
}

#[derive(Clone, Debug)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PgUserRepo {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<CredentialRecord>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT email, name, role
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(subject)
        .fetch_optional(&self.db)
        .await?;

        row.map(CredentialRecord::try_from).transpose()
    }
}
