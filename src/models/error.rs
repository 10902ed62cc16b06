//! Errors surfaced to the admin UI by the bracket engine and team allocator.

use crate::models::bracket::BracketId;
use crate::models::participant::ParticipantId;
use crate::models::team::TeamId;
use crate::store::StoreError;

/// Errors that can occur during bracket and allocation operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TournamentError {
    /// Fewer than 2 eligible entrants when generating a bracket.
    InsufficientParticipants { found: usize },
    /// Spin or auto-assign invoked with zero teams for the category.
    NoTeamsAvailable,
    /// Spin invoked with nothing left to assign.
    EmptyUnassignedPool,
    /// Underlying persistence error. Earlier writes of the same batch are kept.
    StoreWriteFailure(StoreError),
    /// Participant already sits on a team of this category.
    AlreadyRostered { participant_id: ParticipantId, team_id: TeamId },
    TeamNotFound(TeamId),
    ParticipantNotFound(ParticipantId),
    BracketNotFound(BracketId),
    /// Round or match index outside the bracket.
    MatchNotFound { round: usize, index: usize },
    /// Match is still waiting for one of its entrants.
    MatchNotReady { round: usize, index: usize },
    /// Submitted winner is in neither slot of the match.
    WinnerNotInMatch(ParticipantId),
    /// Set scores do not decide the match under the scoring format.
    InvalidScore(String),
    /// Caller lacks an admin role.
    Forbidden,
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::InsufficientParticipants { found } => {
                write!(f, "Need at least 2 approved participants to generate a bracket (found {})", found)
            }
            TournamentError::NoTeamsAvailable => write!(f, "No teams exist for this category"),
            TournamentError::EmptyUnassignedPool => write!(f, "All eligible players are already assigned"),
            TournamentError::StoreWriteFailure(e) => write!(f, "Failed to save changes: {}", e),
            TournamentError::AlreadyRostered { .. } => write!(f, "Player is already assigned to a team"),
            TournamentError::TeamNotFound(_) => write!(f, "Team not found"),
            TournamentError::ParticipantNotFound(_) => write!(f, "Participant not found"),
            TournamentError::BracketNotFound(_) => write!(f, "Bracket not found"),
            TournamentError::MatchNotFound { round, index } => {
                write!(f, "No match {} in round {}", index, round)
            }
            TournamentError::MatchNotReady { round, index } => {
                write!(f, "Match {} in round {} is still waiting for an opponent", index, round)
            }
            TournamentError::WinnerNotInMatch(_) => write!(f, "Winner is not a player in this match"),
            TournamentError::InvalidScore(reason) => write!(f, "Invalid score: {}", reason),
            TournamentError::Forbidden => write!(f, "Admin role required"),
        }
    }
}

impl std::error::Error for TournamentError {}

impl From<StoreError> for TournamentError {
    fn from(error: StoreError) -> Self {
        TournamentError::StoreWriteFailure(error)
    }
}
