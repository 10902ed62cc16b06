//! Tournament desk: library with models, store port and business logic.

pub mod config;
pub mod logic;
pub mod models;
pub mod store;

pub use config::Config;
pub use logic::{
    approved_entrants, compute_stats, compute_unassigned, create_bracket, filter_eligible,
    generate_bracket, natural_cmp, record_match_result, record_match_score, submit_match_result,
    submit_match_score, AllocationFilter, AllocationStats, Assignment, SpinOutcome, TeamAllocator,
    TeamOrder,
};
pub use models::{
    ApprovalStatus, Bracket, BracketId, BracketMatch, BracketStatus, Caller, Category, Gender,
    Level, MatchOutcome, MatchSlot, MatchStatus, Participant, ParticipantId, ReadyPolicy, Role,
    Round, RoundKind, ScoringFormat, SetScore, Team, TeamId, TeamStatus, TournamentError,
    TournamentId, BYE_NAME,
};
pub use store::{DocumentStore, MemoryStore, StoreError};
