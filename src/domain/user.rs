use super::ids::UserId;
use crate::error::{OddJobsError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employer,
    Worker,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Employer => "employer",
            Role::Worker => "worker",
            Role::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// A registered marketplace participant.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>, role: Role) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(OddJobsError::ValidationError(
                "User name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id,
            name,
            email: None,
            role,
            created_at: Utc::now(),
        })
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Fails with `Forbidden` unless the user holds `role`.
    pub fn require_role(&self, role: Role) -> Result<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(OddJobsError::Forbidden(format!(
                "user {} is a {}, not a {}",
                self.id, self.role, role
            )))
        }
    }
}
