//! Pure allocation helpers: eligibility filtering, unassigned pool, team ordering and stats.

use crate::models::{Category, Gender, Level, Participant, ParticipantId, Team, TeamId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::iter::Peekable;
use std::str::Chars;

/// Transient query selecting which registrations take part in an allocation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AllocationFilter {
    pub category: Category,
    /// None means all genders.
    pub gender: Option<Gender>,
    /// None means all levels.
    pub level: Option<Level>,
}

impl AllocationFilter {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            gender: None,
            level: None,
        }
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    pub fn matches(&self, p: &Participant) -> bool {
        p.category == self.category
            && self.gender.map_or(true, |g| p.gender == g)
            && self.level.map_or(true, |l| p.level == l)
    }
}

/// Order in which teams are visited when picking a target.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamOrder {
    /// Natural collation of team names ("Team 2" before "Team 10").
    ByName,
    /// Creation order as returned by the store.
    Insertion,
}

/// One committed participant-to-team pairing.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub participant_id: ParticipantId,
    pub participant_name: String,
    pub team_id: TeamId,
    pub team_name: String,
}

impl Assignment {
    pub fn new(participant: &Participant, team: &Team) -> Self {
        Self {
            participant_id: participant.id,
            participant_name: participant.name.clone(),
            team_id: team.id,
            team_name: team.name.clone(),
        }
    }
}

/// Allocation dashboard counters, respecting the active filter.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AllocationStats {
    pub total_players: usize,
    pub total_assigned: usize,
    pub total_unassigned: usize,
    pub teams_count: usize,
    pub average_per_team: usize,
}

/// Registrations matching category, then gender, then level.
pub fn filter_eligible(registrations: &[Participant], filter: &AllocationFilter) -> Vec<Participant> {
    registrations
        .iter()
        .filter(|p| filter.matches(p))
        .cloned()
        .collect()
}

/// Ids rostered on any team of `category`.
pub fn assigned_ids(teams: &[Team], category: &Category) -> HashSet<ParticipantId> {
    teams
        .iter()
        .filter(|t| &t.category == category)
        .flat_map(|t| t.players.iter().copied())
        .collect()
}

/// Eligible registrations not rostered on any team of `category`.
pub fn compute_unassigned(eligible: &[Participant], teams: &[Team], category: &Category) -> Vec<Participant> {
    let assigned = assigned_ids(teams, category);
    eligible
        .iter()
        .filter(|p| !assigned.contains(&p.id))
        .cloned()
        .collect()
}

/// Counters for the allocation dashboard. Only members that are also eligible count as assigned.
pub fn compute_stats(
    eligible: &[Participant],
    teams: &[Team],
    unassigned: &[Participant],
    category: &Category,
) -> AllocationStats {
    let eligible_ids: HashSet<ParticipantId> = eligible.iter().map(|p| p.id).collect();
    let category_teams: Vec<&Team> = teams.iter().filter(|t| &t.category == category).collect();
    let total_assigned = category_teams
        .iter()
        .map(|t| t.players.iter().filter(|id| eligible_ids.contains(id)).count())
        .sum();
    let teams_count = category_teams.len();
    let average_per_team = if teams_count == 0 {
        0
    } else {
        (total_assigned as f64 / teams_count as f64).round() as usize
    };
    AllocationStats {
        total_players: eligible.len(),
        total_assigned,
        total_unassigned: unassigned.len(),
        teams_count,
        average_per_team,
    }
}

/// Team indices in visiting order. Sorting is stable, so equal names keep creation order.
pub fn ordered_team_indices(teams: &[Team], order: TeamOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..teams.len()).collect();
    if order == TeamOrder::ByName {
        indices.sort_by(|&a, &b| natural_cmp(&teams[a].name, &teams[b].name));
    }
    indices
}

/// Index of the team with the fewest members; the first in `ordered` wins ties.
pub fn least_loaded(teams: &[Team], ordered: &[usize]) -> Option<usize> {
    ordered.iter().copied().min_by_key(|&i| teams[i].member_count())
}

/// Case-insensitive comparison treating digit runs as numbers.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut ai, mut bi) = (a.chars().peekable(), b.chars().peekable());
    loop {
        let ord = match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let xs = take_digits(&mut ai);
                let ys = take_digits(&mut bi);
                let (xt, yt) = (xs.trim_start_matches('0'), ys.trim_start_matches('0'));
                xt.len().cmp(&yt.len()).then_with(|| xt.cmp(yt))
            }
            (Some(x), Some(y)) => {
                ai.next();
                bi.next();
                x.to_lowercase().cmp(y.to_lowercase())
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}
