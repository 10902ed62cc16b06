//! Single-elimination bracket: rounds, matches and slots.
//!
//! Rounds are stored leaf-first: index 0 is the first round of play and the
//! last index is the Final. Display numbering runs the other way (the Final is
//! round 1), so each round carries both its `number` and `depth_from_leaf`.

use crate::models::participant::{Category, Participant, ParticipantId, TournamentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a bracket.
pub type BracketId = Uuid;

/// Display name of a synthetic bye entrant.
pub const BYE_NAME: &str = "Bye";

/// A populated player slot. Name and seed are snapshots taken when the slot was filled.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchSlot {
    /// None for a bye.
    pub id: Option<ParticipantId>,
    pub name: String,
    pub seed: u32,
}

impl MatchSlot {
    pub fn player(participant: &Participant, seed: u32) -> Self {
        Self {
            id: Some(participant.id),
            name: participant.name.clone(),
            seed,
        }
    }

    pub fn bye(seed: u32) -> Self {
        Self {
            id: None,
            name: BYE_NAME.to_string(),
            seed,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    Ready,
    Completed,
}

/// Match state as seen by the admin: a bye match is decided but not yet confirmed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchOutcome {
    Pending,
    ReadyPendingConfirmation(ParticipantId),
    Completed(ParticipantId),
}

/// Games won by each side in one set.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SetScore {
    pub player_1: u32,
    pub player_2: u32,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringFormat {
    #[default]
    SingleSet,
    BestOfThree,
}

/// When a next-round match becomes `ready` after a feeder match is decided.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadyPolicy {
    /// Only once both slots are populated.
    #[default]
    BothSlots,
    /// As soon as either slot is populated (legacy behaviour).
    AnySlot,
}

impl FromStr for ReadyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "both-slots" => Ok(ReadyPolicy::BothSlots),
            "any-slot" => Ok(ReadyPolicy::AnySlot),
            other => Err(format!("unknown ready policy '{}'", other)),
        }
    }
}

/// A match inside a bracket round.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketMatch {
    /// 1-based within the round.
    pub number: u32,
    pub player_1: Option<MatchSlot>,
    pub player_2: Option<MatchSlot>,
    pub status: MatchStatus,
    pub winner_id: Option<ParticipantId>,
    pub winner_name: Option<String>,
    /// Set scores, empty when only a winner was recorded.
    #[serde(default)]
    pub scores: Vec<SetScore>,
}

impl BracketMatch {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            player_1: None,
            player_2: None,
            status: MatchStatus::Pending,
            winner_id: None,
            winner_name: None,
            scores: Vec::new(),
        }
    }

    pub fn has_both_slots(&self) -> bool {
        self.player_1.is_some() && self.player_2.is_some()
    }

    /// The slot holding this participant, if any.
    pub fn slot_of(&self, id: ParticipantId) -> Option<&MatchSlot> {
        [&self.player_1, &self.player_2]
            .into_iter()
            .flatten()
            .find(|slot| slot.id == Some(id))
    }

    pub fn outcome(&self) -> MatchOutcome {
        match (self.status, self.winner_id) {
            (MatchStatus::Completed, Some(id)) => MatchOutcome::Completed(id),
            (MatchStatus::Ready, Some(id)) => MatchOutcome::ReadyPendingConfirmation(id),
            _ => MatchOutcome::Pending,
        }
    }
}

/// Round tag, resolved from the distance to the Final.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundKind {
    Final,
    SemiFinal,
    QuarterFinal,
    /// Round of 16, 32 or 64.
    RoundOf(u32),
    /// Deeper rounds, by display number.
    Numbered(u32),
}

impl RoundKind {
    /// `distance` is 0 for the Final, 1 for the semifinals, and so on.
    pub fn from_distance_to_final(distance: u32) -> Self {
        match distance {
            0 => RoundKind::Final,
            1 => RoundKind::SemiFinal,
            2 => RoundKind::QuarterFinal,
            3..=5 => RoundKind::RoundOf(1 << (distance + 1)),
            _ => RoundKind::Numbered(distance + 1),
        }
    }

    pub fn name(&self) -> String {
        match self {
            RoundKind::Final => "Final".to_string(),
            RoundKind::SemiFinal => "Semifinals".to_string(),
            RoundKind::QuarterFinal => "Quarterfinals".to_string(),
            RoundKind::RoundOf(n) => format!("Round of {}", n),
            RoundKind::Numbered(n) => format!("Round {}", n),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub name: String,
    pub kind: RoundKind,
    /// Display number: the Final is round 1 whatever the bracket depth.
    pub number: u32,
    /// 0 for the first round of play. Advancement always moves to depth + 1.
    pub depth_from_leaf: u32,
    pub matches: Vec<BracketMatch>,
    pub is_completed: bool,
}

impl Round {
    /// Recompute `is_completed` from the match statuses.
    pub fn refresh_completion(&mut self) {
        self.is_completed = self
            .matches
            .iter()
            .all(|m| m.status == MatchStatus::Completed);
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketStatus {
    #[default]
    Pending,
    Active,
    Completed,
}

/// A single-elimination bracket for one tournament category.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub id: BracketId,
    pub tournament_id: TournamentId,
    pub category: Category,
    /// Leaf round first, Final last.
    pub rounds: Vec<Round>,
    pub status: BracketStatus,
    #[serde(default)]
    pub ready_policy: ReadyPolicy,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

impl Bracket {
    /// Number of first-round slots (a power of two).
    pub fn size(&self) -> usize {
        self.rounds.first().map_or(0, |r| r.matches.len() * 2)
    }

    /// Synthetic byes placed in the first round.
    pub fn bye_count(&self) -> usize {
        self.rounds.first().map_or(0, |r| {
            r.matches
                .iter()
                .flat_map(|m| [&m.player_1, &m.player_2])
                .flatten()
                .filter(|slot| slot.is_bye())
                .count()
        })
    }

    pub fn final_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    /// Winner of the Final once it is completed.
    pub fn champion(&self) -> Option<(ParticipantId, &str)> {
        let m = self.final_round()?.matches.first()?;
        if m.status != MatchStatus::Completed {
            return None;
        }
        Some((m.winner_id?, m.winner_name.as_deref()?))
    }
}
