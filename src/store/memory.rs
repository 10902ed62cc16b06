//! In-memory document store shared by the web server and the tests.

use crate::models::{
    Bracket, BracketId, Category, Participant, ParticipantId, Team, TeamId, TournamentId,
};
use crate::store::{BracketPatch, DocumentStore, ParticipantPatch, StoreError, TeamPatch};
use std::collections::HashMap;
use std::sync::RwLock;

/// One lock per collection, so a multi-document operation is a sequence of
/// independent writes with last-write-wins semantics.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Registration order is preserved; brackets seed from it.
    participants: RwLock<Vec<Participant>>,
    teams: RwLock<Vec<Team>>,
    brackets: RwLock<HashMap<BracketId, Bracket>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn get_participants(
        &self,
        tournament_id: TournamentId,
        category: &Category,
    ) -> Result<Vec<Participant>, StoreError> {
        let g = self.participants.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(g.iter()
            .filter(|p| p.tournament_id == tournament_id && &p.category == category)
            .cloned()
            .collect())
    }

    fn get_teams(&self, tournament_id: TournamentId, category: &Category) -> Result<Vec<Team>, StoreError> {
        let g = self.teams.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(g.iter()
            .filter(|t| t.tournament_id == tournament_id && &t.category == category)
            .cloned()
            .collect())
    }

    fn get_bracket(&self, bracket_id: BracketId) -> Result<Option<Bracket>, StoreError> {
        let g = self.brackets.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(g.get(&bracket_id).cloned())
    }

    fn list_brackets(
        &self,
        tournament_id: TournamentId,
        category: &Category,
    ) -> Result<Vec<Bracket>, StoreError> {
        let g = self.brackets.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut brackets: Vec<Bracket> = g
            .values()
            .filter(|b| b.tournament_id == tournament_id && &b.category == category)
            .cloned()
            .collect();
        brackets.sort_by_key(|b| b.created_at);
        Ok(brackets)
    }

    fn create_bracket(&self, bracket: Bracket) -> Result<BracketId, StoreError> {
        let mut g = self.brackets.write().map_err(|_| StoreError::LockPoisoned)?;
        let id = bracket.id;
        g.insert(id, bracket);
        Ok(id)
    }

    fn update_bracket(&self, bracket_id: BracketId, patch: BracketPatch) -> Result<(), StoreError> {
        let mut g = self.brackets.write().map_err(|_| StoreError::LockPoisoned)?;
        let bracket = g.get_mut(&bracket_id).ok_or(StoreError::NotFound {
            collection: "brackets",
            id: bracket_id,
        })?;
        patch.apply(bracket);
        Ok(())
    }

    fn update_team(&self, team_id: TeamId, patch: TeamPatch) -> Result<(), StoreError> {
        let mut g = self.teams.write().map_err(|_| StoreError::LockPoisoned)?;
        let team = g
            .iter_mut()
            .find(|t| t.id == team_id)
            .ok_or(StoreError::NotFound {
                collection: "teams",
                id: team_id,
            })?;
        patch.apply(team);
        Ok(())
    }

    fn create_participant(&self, participant: Participant) -> Result<ParticipantId, StoreError> {
        let mut g = self.participants.write().map_err(|_| StoreError::LockPoisoned)?;
        let id = participant.id;
        g.push(participant);
        Ok(id)
    }

    fn update_participant(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
        patch: ParticipantPatch,
    ) -> Result<Participant, StoreError> {
        let mut g = self.participants.write().map_err(|_| StoreError::LockPoisoned)?;
        let participant = g
            .iter_mut()
            .find(|p| p.id == participant_id && p.tournament_id == tournament_id)
            .ok_or(StoreError::NotFound {
                collection: "registrations",
                id: participant_id,
            })?;
        patch.apply(participant);
        Ok(participant.clone())
    }

    fn create_team(&self, team: Team) -> Result<TeamId, StoreError> {
        let mut g = self.teams.write().map_err(|_| StoreError::LockPoisoned)?;
        let id = team.id;
        g.push(team);
        Ok(id)
    }
}
