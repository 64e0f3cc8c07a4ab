use std::fmt;
use std::str::FromStr;

use crate::taboo::decks::error::{DeckError, Result};

/// Caller role, already validated by the authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Staff,
    Admin,
    Dev,
}

impl Role {
    /// Whether the role may manage linked workbooks.
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Admin | Role::Dev)
    }
}

impl FromStr for Role {
    type Err = DeckError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            "dev" => Ok(Role::Dev),
            other => Err(DeckError::Forbidden(format!("unknown role '{other}'"))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Staff => write!(f, "staff"),
            Role::Admin => write!(f, "admin"),
            Role::Dev => write!(f, "dev"),
        }
    }
}

/// Accepts only admin and dev callers.
pub fn require_privileged(role: &str) -> Result<Role> {
    let role: Role = role.parse()?;
    if role.is_privileged() {
        Ok(role)
    } else {
        Err(DeckError::Forbidden(format!(
            "role '{role}' may not manage workbooks"
        )))
    }
}
