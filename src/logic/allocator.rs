//! Spin-wheel team allocator over an in-memory projection of one category.
//!
//! The allocator loads registrations and teams once, applies every mutation
//! to its projection only after the matching store write succeeded, and
//! recomputes the unassigned pool from the projection on every call.

use crate::logic::allocation::{
    compute_stats, compute_unassigned, filter_eligible, least_loaded, ordered_team_indices,
    AllocationFilter, AllocationStats, Assignment, TeamOrder,
};
use crate::models::{Caller, Participant, ParticipantId, Team, TeamId, TournamentError, TournamentId};
use crate::store::{DocumentStore, TeamPatch};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Result of a single spin.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SpinOutcome {
    /// Index the wheel animation lands on. Cosmetic: it does not decide the pick.
    pub animated_index: usize,
    pub assignment: Assignment,
}

pub struct TeamAllocator<'s, S: DocumentStore + ?Sized> {
    store: &'s S,
    caller: Caller,
    filter: AllocationFilter,
    registrations: Vec<Participant>,
    teams: Vec<Team>,
}

impl<'s, S: DocumentStore + ?Sized> TeamAllocator<'s, S> {
    /// Load the category's registrations and teams from the store.
    pub fn load(
        store: &'s S,
        tournament_id: TournamentId,
        filter: AllocationFilter,
        caller: Caller,
    ) -> Result<Self, TournamentError> {
        let registrations = store.get_participants(tournament_id, &filter.category)?;
        let teams = store.get_teams(tournament_id, &filter.category)?;
        Ok(Self::from_parts(store, filter, caller, registrations, teams))
    }

    /// Build from already fetched documents. Teams of other categories are ignored.
    pub fn from_parts(
        store: &'s S,
        filter: AllocationFilter,
        caller: Caller,
        registrations: Vec<Participant>,
        teams: Vec<Team>,
    ) -> Self {
        let teams = teams
            .into_iter()
            .filter(|t| t.category == filter.category)
            .collect();
        Self {
            store,
            caller,
            filter,
            registrations,
            teams,
        }
    }

    pub fn filter(&self) -> &AllocationFilter {
        &self.filter
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn eligible(&self) -> Vec<Participant> {
        filter_eligible(&self.registrations, &self.filter)
    }

    pub fn unassigned(&self) -> Vec<Participant> {
        compute_unassigned(&self.eligible(), &self.teams, &self.filter.category)
    }

    pub fn stats(&self) -> AllocationStats {
        let eligible = self.eligible();
        let unassigned = compute_unassigned(&eligible, &self.teams, &self.filter.category);
        compute_stats(&eligible, &self.teams, &unassigned, &self.filter.category)
    }

    /// Append a participant to a team. Refuses anyone already rostered in the category.
    pub fn assign_one(
        &mut self,
        participant_id: ParticipantId,
        team_id: TeamId,
    ) -> Result<Assignment, TournamentError> {
        self.caller.require_admin()?;
        let participant = self
            .registrations
            .iter()
            .find(|p| p.id == participant_id)
            .cloned()
            .ok_or(TournamentError::ParticipantNotFound(participant_id))?;
        if let Some(team) = self.teams.iter().find(|t| t.has_player(participant_id)) {
            return Err(TournamentError::AlreadyRostered {
                participant_id,
                team_id: team.id,
            });
        }
        let idx = self
            .teams
            .iter()
            .position(|t| t.id == team_id)
            .ok_or(TournamentError::TeamNotFound(team_id))?;

        self.push_members(idx, &[participant_id])?;
        let assignment = Assignment::new(&participant, &self.teams[idx]);
        log::info!("Assigned {} to {}", assignment.participant_name, assignment.team_name);
        Ok(assignment)
    }

    /// Pick one unassigned participant at random and place them on the least-loaded team.
    ///
    /// Two independent draws are taken: one for the wheel animation and one
    /// that actually decides who is assigned.
    pub fn spin_one<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        order: TeamOrder,
    ) -> Result<SpinOutcome, TournamentError> {
        self.caller.require_admin()?;
        let unassigned = self.unassigned();
        if unassigned.is_empty() {
            return Err(TournamentError::EmptyUnassignedPool);
        }
        let ordered = ordered_team_indices(&self.teams, order);
        let idx = least_loaded(&self.teams, &ordered).ok_or(TournamentError::NoTeamsAvailable)?;

        let animated_index = rng.gen_range(0..unassigned.len());
        let committed_index = rng.gen_range(0..unassigned.len());
        log::debug!("Spin: animated {}, committed {}", animated_index, committed_index);
        let participant = &unassigned[committed_index];

        self.push_members(idx, &[participant.id])?;
        let assignment = Assignment::new(participant, &self.teams[idx]);
        log::info!("Spin assigned {} to {}", assignment.participant_name, assignment.team_name);
        Ok(SpinOutcome {
            animated_index,
            assignment,
        })
    }

    /// Shuffle the pool and hand exactly one participant to each of the first
    /// `min(|unassigned|, |teams|)` teams in visiting order.
    ///
    /// Writes go out one team at a time; on failure the earlier writes stay applied.
    pub fn spin_round<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        order: TeamOrder,
    ) -> Result<Vec<Assignment>, TournamentError> {
        self.caller.require_admin()?;
        let mut unassigned = self.unassigned();
        if unassigned.is_empty() {
            return Err(TournamentError::EmptyUnassignedPool);
        }
        if self.teams.is_empty() {
            return Err(TournamentError::NoTeamsAvailable);
        }

        unassigned.shuffle(rng);
        let ordered = ordered_team_indices(&self.teams, order);
        let pairs: Vec<(Participant, usize)> = unassigned.into_iter().zip(ordered).collect();

        let mut assignments = Vec::with_capacity(pairs.len());
        for (participant, idx) in pairs {
            self.push_members(idx, &[participant.id])?;
            assignments.push(Assignment::new(&participant, &self.teams[idx]));
        }
        log::info!("Round spin assigned {} players", assignments.len());
        Ok(assignments)
    }

    /// Deal the whole unassigned pool over the teams, one per team per pass,
    /// until nobody is left. One write per touched team.
    pub fn auto_assign_all(&mut self, order: TeamOrder) -> Result<Vec<Assignment>, TournamentError> {
        self.caller.require_admin()?;
        if self.teams.is_empty() {
            return Err(TournamentError::NoTeamsAvailable);
        }
        let unassigned = self.unassigned();
        let ordered = ordered_team_indices(&self.teams, order);

        let mut dealt: Vec<Vec<ParticipantId>> = vec![Vec::new(); self.teams.len()];
        let mut assignments = Vec::with_capacity(unassigned.len());
        for (i, participant) in unassigned.iter().enumerate() {
            let idx = ordered[i % ordered.len()];
            dealt[idx].push(participant.id);
            assignments.push(Assignment::new(participant, &self.teams[idx]));
        }

        for &idx in &ordered {
            if !dealt[idx].is_empty() {
                self.push_members(idx, &dealt[idx])?;
            }
        }
        log::info!(
            "Auto-assigned {} players over {} teams in {}",
            assignments.len(),
            self.teams.len(),
            self.filter.category
        );
        Ok(assignments)
    }

    /// Empty every team of the category. Returns how many members were removed.
    pub fn unassign_all(&mut self) -> Result<usize, TournamentError> {
        self.caller.require_admin()?;
        let mut removed = 0;
        for idx in 0..self.teams.len() {
            let count = self.teams[idx].member_count();
            self.write_roster(idx, Vec::new())?;
            removed += count;
        }
        log::info!("Cleared {} assignments in {}", removed, self.filter.category);
        Ok(removed)
    }

    fn push_members(&mut self, idx: usize, ids: &[ParticipantId]) -> Result<(), TournamentError> {
        let mut players = self.teams[idx].players.clone();
        players.extend_from_slice(ids);
        self.write_roster(idx, players)
    }

    /// Persist a roster, then mirror it in the projection.
    fn write_roster(&mut self, idx: usize, players: Vec<ParticipantId>) -> Result<(), TournamentError> {
        let team = &mut self.teams[idx];
        let patch = TeamPatch::roster(players, &self.caller.id);
        if let Err(e) = self.store.update_team(team.id, patch.clone()) {
            log::warn!("Failed to update team {}: {}", team.name, e);
            return Err(e.into());
        }
        patch.apply(team);
        Ok(())
    }
}
