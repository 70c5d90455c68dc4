use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform-wide account role carried in every token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Student,
    Professor,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Professor => "PROFESSOR",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STUDENT" => Ok(Self::Student),
            "PROFESSOR" => Ok(Self::Professor),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// Decoded payload of a token whose integrity tag checked out.
///
/// Produced per verification call and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub subject: String,
    pub role: UserRole,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IdentityClaims {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Outcome of `TokenCodec::verify`.
///
/// `Expired` still carries the claims so callers can see who timed out, but it
/// is never an authenticated state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid(IdentityClaims),
    Expired(IdentityClaims),
    Invalid,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Claims of a `Valid` or `Expired` token.
    pub fn claims(&self) -> Option<&IdentityClaims> {
        match self {
            Self::Valid(claims) | Self::Expired(claims) => Some(claims),
            Self::Invalid => None,
        }
    }

    pub fn into_valid(self) -> Option<IdentityClaims> {
        match self {
            Self::Valid(claims) => Some(claims),
            _ => None,
        }
    }
}
