//! The logged-in user's session.
//!
//! A `Session` is built explicitly at startup and handed to whatever needs
//! the user's identity or token; `dispose` ends it.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::SessionError;

/// Dashboard role of the logged-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Supervisor,
    Admin,
}

impl FromStr for Role {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "supervisor" => Ok(Role::Supervisor),
            "admin" => Ok(Role::Admin),
            other => Err(SessionError::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Supervisor => write!(f, "supervisor"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// What a session is built from.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub token: Option<String>,
    pub role: Role,
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct Session {
    token: String,
    role: Role,
    name: String,
}

impl Session {
    pub fn init(config: SessionConfig) -> Result<Self, SessionError> {
        let token = config
            .token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(SessionError::MissingToken)?;
        let name = config.name.unwrap_or_else(|| config.role.to_string());

        tracing::debug!(role = %config.role, %name, "session started");
        Ok(Session {
            token,
            role: config.role,
            name,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Only supervisors and admins manage the schedule.
    pub fn can_schedule(&self) -> bool {
        matches!(self.role, Role::Supervisor | Role::Admin)
    }

    /// End the session. The token is dropped with it.
    pub fn dispose(self) {
        tracing::debug!(name = %self.name, "session ended");
    }
}

// Keep the token out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
