use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role of one member inside one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectRole {
    Leader,
    Mentor,
    Member,
}

/// LEADER and MENTOR own a project: they may modify it and all of its tasks.
///
/// Every ownership check goes through here.
pub fn is_owner_role(role: ProjectRole) -> bool {
    matches!(role, ProjectRole::Leader | ProjectRole::Mentor)
}

impl ProjectRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Leader => "LEADER",
            Self::Mentor => "MENTOR",
            Self::Member => "MEMBER",
        }
    }
}

impl fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown project role: {0}")]
pub struct UnknownProjectRole(pub String);

impl FromStr for ProjectRole {
    type Err = UnknownProjectRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LEADER" => Ok(Self::Leader),
            "MENTOR" => Ok(Self::Mentor),
            "MEMBER" => Ok(Self::Member),
            _ => Err(UnknownProjectRole(s.to_string())),
        }
    }
}
