//! Document store port: the persistence seam consumed by the bracket engine and team allocator.
//!
//! Updates take partial patches and merge them into the stored document. Every
//! call stands alone; there are no transactions spanning several calls.

mod memory;

pub use memory::MemoryStore;

use crate::models::{
    ApprovalStatus, Bracket, BracketId, BracketStatus, Category, Participant, ParticipantId,
    Round, Team, TeamId, TournamentId,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Errors reported by a store backend.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoreError {
    /// Document to update does not exist.
    NotFound { collection: &'static str, id: Uuid },
    /// A writer panicked while holding the collection lock.
    LockPoisoned,
    /// Backend refused or failed the call.
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound { collection, id } => write!(f, "{} {} not found", collection, id),
            StoreError::LockPoisoned => write!(f, "store lock poisoned"),
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Partial bracket update. `None` fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct BracketPatch {
    pub rounds: Option<Vec<Round>>,
    pub status: Option<BracketStatus>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl BracketPatch {
    /// Patch carrying the full progression state of `bracket`.
    pub fn progression(bracket: &Bracket) -> Self {
        Self {
            rounds: Some(bracket.rounds.clone()),
            status: Some(bracket.status),
            updated_by: Some(bracket.updated_by.clone()),
            updated_at: Some(bracket.updated_at),
        }
    }

    pub fn apply(self, bracket: &mut Bracket) {
        if let Some(rounds) = self.rounds {
            bracket.rounds = rounds;
        }
        if let Some(status) = self.status {
            bracket.status = status;
        }
        if let Some(by) = self.updated_by {
            bracket.updated_by = by;
        }
        if let Some(at) = self.updated_at {
            bracket.updated_at = at;
        }
    }
}

/// Partial team update.
#[derive(Clone, Debug, Default)]
pub struct TeamPatch {
    pub players: Option<Vec<ParticipantId>>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TeamPatch {
    /// Replace the roster, stamping the audit fields.
    pub fn roster(players: Vec<ParticipantId>, updated_by: &str) -> Self {
        Self {
            players: Some(players),
            updated_by: Some(updated_by.to_string()),
            updated_at: Some(Utc::now()),
        }
    }

    pub fn apply(self, team: &mut Team) {
        if let Some(players) = self.players {
            team.players = players;
        }
        if let Some(by) = self.updated_by {
            team.updated_by = Some(by);
        }
        if let Some(at) = self.updated_at {
            team.updated_at = Some(at);
        }
    }
}

/// Partial registration update (admin approval actions).
#[derive(Clone, Debug, Default)]
pub struct ParticipantPatch {
    pub status: Option<ApprovalStatus>,
    pub seed: Option<u32>,
}

impl ParticipantPatch {
    pub fn apply(self, participant: &mut Participant) {
        if let Some(status) = self.status {
            participant.status = status;
        }
        if let Some(seed) = self.seed {
            participant.seed = Some(seed);
        }
    }
}

/// Document store keyed by tournament and category.
pub trait DocumentStore {
    /// Registrations of one category, in registration order.
    fn get_participants(
        &self,
        tournament_id: TournamentId,
        category: &Category,
    ) -> Result<Vec<Participant>, StoreError>;

    /// Teams of one category, in creation order.
    fn get_teams(&self, tournament_id: TournamentId, category: &Category) -> Result<Vec<Team>, StoreError>;

    fn get_bracket(&self, bracket_id: BracketId) -> Result<Option<Bracket>, StoreError>;

    fn list_brackets(
        &self,
        tournament_id: TournamentId,
        category: &Category,
    ) -> Result<Vec<Bracket>, StoreError>;

    fn create_bracket(&self, bracket: Bracket) -> Result<BracketId, StoreError>;

    fn update_bracket(&self, bracket_id: BracketId, patch: BracketPatch) -> Result<(), StoreError>;

    fn update_team(&self, team_id: TeamId, patch: TeamPatch) -> Result<(), StoreError>;

    fn create_participant(&self, participant: Participant) -> Result<ParticipantId, StoreError>;

    /// Merge `patch` and return the updated registration. A registration
    /// belonging to another tournament is reported as not found and left untouched.
    fn update_participant(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
        patch: ParticipantPatch,
    ) -> Result<Participant, StoreError>;

    fn create_team(&self, team: Team) -> Result<TeamId, StoreError>;
}
