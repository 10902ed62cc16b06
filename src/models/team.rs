//! Team: a roster of participant ids within one tournament category.

use crate::models::participant::{Category, ParticipantId, TournamentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a team.
pub type TeamId = Uuid;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub tournament_id: TournamentId,
    pub category: Category,
    pub name: String,
    /// Member ids in assignment order.
    pub players: Vec<ParticipantId>,
    pub captain_id: Option<ParticipantId>,
    pub status: TeamStatus,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Team {
    /// Create an empty, active team.
    pub fn new(tournament_id: TournamentId, category: Category, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            category,
            name: name.into(),
            players: Vec::new(),
            captain_id: None,
            status: TeamStatus::Active,
            updated_by: None,
            updated_at: None,
        }
    }

    pub fn has_player(&self, id: ParticipantId) -> bool {
        self.players.contains(&id)
    }

    pub fn member_count(&self) -> usize {
        self.players.len()
    }
}
