//! Role-checked caller identity, recorded in audit fields.

use crate::models::error::TournamentError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    #[default]
    Public,
    Admin,
    TournamentAdmin,
    SuperAdmin,
}

/// Who is invoking an operation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Caller {
    pub id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }

    /// Anonymous visitor (public registration form).
    pub fn public() -> Self {
        Self::new("public", Role::Public)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin | Role::TournamentAdmin | Role::SuperAdmin)
    }

    /// Fails with `Forbidden` unless the caller holds one of the admin roles.
    pub fn require_admin(&self) -> Result<(), TournamentError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(TournamentError::Forbidden)
        }
    }
}
