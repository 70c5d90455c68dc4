/**
 * Responsibility
 * - what a repo reports upward
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
    #[error("unexpected value in {column}: {value}")]
    CorruptRole { column: &'static str, value: String },
}
