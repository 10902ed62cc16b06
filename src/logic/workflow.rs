//! Store-backed bracket operations: generate-and-save, submit a result, submit a score.

use crate::logic::bracket::{generate_bracket, record_match_result, record_match_score};
use crate::models::{
    Bracket, BracketId, Caller, Category, Participant, ParticipantId, ReadyPolicy, ScoringFormat,
    SetScore, TournamentError, TournamentId,
};
use crate::store::{BracketPatch, DocumentStore};

/// Approved registrations in registration order.
pub fn approved_entrants(registrations: &[Participant]) -> Vec<Participant> {
    registrations
        .iter()
        .filter(|p| p.is_approved())
        .cloned()
        .collect()
}

/// Generate a bracket from the category's approved registrations and persist it.
pub fn create_bracket<S: DocumentStore + ?Sized>(
    store: &S,
    tournament_id: TournamentId,
    category: &Category,
    ready_policy: ReadyPolicy,
    caller: &Caller,
) -> Result<Bracket, TournamentError> {
    caller.require_admin()?;
    let registrations = store.get_participants(tournament_id, category)?;
    let entrants = approved_entrants(&registrations);

    let mut bracket = generate_bracket(tournament_id, category.clone(), &entrants, caller)?;
    bracket.ready_policy = ready_policy;
    store.create_bracket(bracket.clone())?;
    log::info!(
        "Generated bracket {} for {} ({} entrants, {} byes)",
        bracket.id,
        category,
        entrants.len(),
        bracket.bye_count()
    );
    Ok(bracket)
}

fn load_bracket<S: DocumentStore + ?Sized>(store: &S, bracket_id: BracketId) -> Result<Bracket, TournamentError> {
    store
        .get_bracket(bracket_id)?
        .ok_or(TournamentError::BracketNotFound(bracket_id))
}

/// Record a winner and write the bracket's progression state back.
pub fn submit_match_result<S: DocumentStore + ?Sized>(
    store: &S,
    bracket_id: BracketId,
    round_index: usize,
    match_index: usize,
    winner_id: ParticipantId,
    caller: &Caller,
) -> Result<Bracket, TournamentError> {
    caller.require_admin()?;
    let mut bracket = load_bracket(store, bracket_id)?;
    record_match_result(&mut bracket, round_index, match_index, winner_id, caller)?;
    store.update_bracket(bracket_id, BracketPatch::progression(&bracket))?;
    Ok(bracket)
}

/// Record set scores and write the bracket's progression state back.
pub fn submit_match_score<S: DocumentStore + ?Sized>(
    store: &S,
    bracket_id: BracketId,
    round_index: usize,
    match_index: usize,
    scores: &[SetScore],
    format: ScoringFormat,
    caller: &Caller,
) -> Result<Bracket, TournamentError> {
    caller.require_admin()?;
    let mut bracket = load_bracket(store, bracket_id)?;
    record_match_score(&mut bracket, round_index, match_index, scores, format, caller)?;
    store.update_bracket(bracket_id, BracketPatch::progression(&bracket))?;
    Ok(bracket)
}
