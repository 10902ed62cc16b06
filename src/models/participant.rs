//! Participant (a tournament registration) and its classification tags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a registration (used in bracket slots and team rosters).
pub type ParticipantId = Uuid;

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Category tag a registration is entered in, e.g. `mens-single`.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Category {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// Expertise tier declared at registration.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

/// Admin approval state of a registration.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// A registration for one tournament category.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub tournament_id: TournamentId,
    pub name: String,
    pub category: Category,
    pub gender: Gender,
    pub level: Level,
    pub status: ApprovalStatus,
    /// Seed chosen by an admin; brackets still seed by registration order.
    pub seed: Option<u32>,
    pub registered_at: DateTime<Utc>,
}

impl Participant {
    /// Create a pending registration. Name is trimmed.
    pub fn new(
        tournament_id: TournamentId,
        name: impl Into<String>,
        category: Category,
        gender: Gender,
        level: Level,
    ) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            name: name.trim().to_string(),
            category,
            gender,
            level,
            status: ApprovalStatus::Pending,
            seed: None,
            registered_at: Utc::now(),
        }
    }

    pub fn approve(&mut self) {
        self.status = ApprovalStatus::Approved;
    }

    pub fn reject(&mut self) {
        self.status = ApprovalStatus::Rejected;
    }

    pub fn is_approved(&self) -> bool {
        self.status == ApprovalStatus::Approved
    }
}
