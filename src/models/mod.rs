//! Data structures for the tournament desk: registrations, brackets, teams, callers and errors.

mod bracket;
mod caller;
mod error;
mod participant;
mod team;

pub use bracket::{
    Bracket, BracketId, BracketMatch, BracketStatus, MatchOutcome, MatchSlot, MatchStatus,
    ReadyPolicy, Round, RoundKind, ScoringFormat, SetScore, BYE_NAME,
};
pub use caller::{Caller, Role};
pub use error::TournamentError;
pub use participant::{ApprovalStatus, Category, Gender, Level, Participant, ParticipantId, TournamentId};
pub use team::{Team, TeamId, TeamStatus};
