//! Single-elimination bracket: generation with byes and round-by-round winner advancement.

use crate::models::{
    Bracket, BracketMatch, BracketStatus, Caller, Category, MatchSlot, MatchStatus, Participant,
    ParticipantId, ReadyPolicy, Round, RoundKind, ScoringFormat, SetScore, TournamentError,
    TournamentId,
};
use chrono::Utc;
use uuid::Uuid;

/// Build a bracket from entrants in registration order (seed 1..n).
///
/// The field is padded to the next power of two and each bye is paired with
/// one of the top seeds. Only the first round of play is populated. A bye
/// match starts `ready` with the real entrant already set as winner, so an
/// admin still has to confirm it.
pub fn generate_bracket(
    tournament_id: TournamentId,
    category: Category,
    participants: &[Participant],
    caller: &Caller,
) -> Result<Bracket, TournamentError> {
    let n = participants.len();
    if n < 2 {
        return Err(TournamentError::InsufficientParticipants { found: n });
    }

    let size = n.next_power_of_two();
    let round_count = size.trailing_zeros();
    let byes = size - n;
    log::debug!("Bracket for {} entrants: size {}, {} rounds, {} byes", n, size, round_count, byes);

    let mut slots = Vec::with_capacity(size);
    let mut next_bye_seed = n as u32 + 1;
    for (i, p) in participants.iter().enumerate() {
        slots.push(MatchSlot::player(p, i as u32 + 1));
        if i < byes {
            slots.push(MatchSlot::bye(next_bye_seed));
            next_bye_seed += 1;
        }
    }

    let mut rounds: Vec<Round> = (0..round_count)
        .map(|depth| {
            let distance = round_count - 1 - depth;
            let kind = RoundKind::from_distance_to_final(distance);
            let match_count = size >> (depth + 1);
            Round {
                name: kind.name(),
                kind,
                number: distance + 1,
                depth_from_leaf: depth,
                matches: (1..=match_count as u32).map(BracketMatch::new).collect(),
                is_completed: false,
            }
        })
        .collect();

    let mut slots = slots.into_iter();
    for m in &mut rounds[0].matches {
        m.player_1 = slots.next();
        m.player_2 = slots.next();
        let bye_winner = match (&m.player_1, &m.player_2) {
            (Some(a), Some(b)) if b.is_bye() => Some(a.clone()),
            (Some(a), Some(b)) if a.is_bye() => Some(b.clone()),
            _ => None,
        };
        if let Some(winner) = bye_winner {
            m.status = MatchStatus::Ready;
            m.winner_id = winner.id;
            m.winner_name = Some(winner.name);
        }
    }

    let now = Utc::now();
    Ok(Bracket {
        id: Uuid::new_v4(),
        tournament_id,
        category,
        rounds,
        status: BracketStatus::Pending,
        ready_policy: ReadyPolicy::default(),
        created_by: caller.id.clone(),
        created_at: now,
        updated_by: caller.id.clone(),
        updated_at: now,
    })
}

/// Record the winner of a match and feed them into the next round.
///
/// `round_index` is the storage index (0 = first round of play, last = Final).
/// The winner of match `m` moves to match `m / 2` of the following round,
/// into slot 1 for even `m` and slot 2 for odd `m`. Resubmitting the same
/// winner only bumps the audit fields. A match needs both slots filled
/// (a bye counts) before it can be decided.
pub fn record_match_result(
    bracket: &mut Bracket,
    round_index: usize,
    match_index: usize,
    winner_id: ParticipantId,
    caller: &Caller,
) -> Result<(), TournamentError> {
    let not_found = TournamentError::MatchNotFound {
        round: round_index,
        index: match_index,
    };
    let m = bracket
        .rounds
        .get_mut(round_index)
        .and_then(|r| r.matches.get_mut(match_index))
        .ok_or(not_found)?;
    if !m.has_both_slots() {
        return Err(TournamentError::MatchNotReady {
            round: round_index,
            index: match_index,
        });
    }
    let winner = m
        .slot_of(winner_id)
        .cloned()
        .ok_or(TournamentError::WinnerNotInMatch(winner_id))?;

    if m.winner_id != Some(winner_id) {
        m.scores.clear();
    }
    m.status = MatchStatus::Completed;
    m.winner_id = Some(winner_id);
    m.winner_name = Some(winner.name.clone());
    bracket.rounds[round_index].refresh_completion();

    let policy = bracket.ready_policy;
    if let Some(next_round) = bracket.rounds.get_mut(round_index + 1) {
        let next = &mut next_round.matches[match_index / 2];
        let slot = if match_index % 2 == 0 {
            &mut next.player_1
        } else {
            &mut next.player_2
        };
        let occupant_changed = slot.as_ref().and_then(|s| s.id) != winner.id;
        *slot = Some(winner.clone());
        if occupant_changed {
            reopen(next, policy);
            next_round.refresh_completion();
        }
    }

    bracket.status = if bracket.rounds.iter().all(|r| r.is_completed) {
        BracketStatus::Completed
    } else {
        BracketStatus::Active
    };
    bracket.updated_by = caller.id.clone();
    bracket.updated_at = Utc::now();

    log::info!(
        "Bracket {}: {} wins match {} of {}",
        bracket.id,
        winner.name,
        match_index + 1,
        bracket.rounds[round_index].name
    );
    Ok(())
}

/// Record set scores, derive the winner and advance them like `record_match_result`.
pub fn record_match_score(
    bracket: &mut Bracket,
    round_index: usize,
    match_index: usize,
    scores: &[SetScore],
    format: ScoringFormat,
    caller: &Caller,
) -> Result<(), TournamentError> {
    let m = bracket
        .rounds
        .get(round_index)
        .and_then(|r| r.matches.get(match_index))
        .ok_or(TournamentError::MatchNotFound {
            round: round_index,
            index: match_index,
        })?;
    let (Some(p1), Some(p2)) = (&m.player_1, &m.player_2) else {
        return Err(TournamentError::MatchNotReady {
            round: round_index,
            index: match_index,
        });
    };
    let winner_slot = if first_player_wins(scores, format)? { p1 } else { p2 };
    let winner_id = winner_slot
        .id
        .ok_or_else(|| TournamentError::InvalidScore("a bye cannot win a match".to_string()))?;

    record_match_result(bracket, round_index, match_index, winner_id, caller)?;
    bracket.rounds[round_index].matches[match_index].scores = scores.to_vec();
    Ok(())
}

/// Whether slot 1 wins the given sets. Tied or surplus sets are rejected.
fn first_player_wins(scores: &[SetScore], format: ScoringFormat) -> Result<bool, TournamentError> {
    let sets_to_win = match format {
        ScoringFormat::SingleSet => 1,
        ScoringFormat::BestOfThree => 2,
    };
    let (mut won_1, mut won_2) = (0, 0);
    for (i, set) in scores.iter().enumerate() {
        if won_1 == sets_to_win || won_2 == sets_to_win {
            return Err(TournamentError::InvalidScore(format!(
                "set {} played after the match was decided",
                i + 1
            )));
        }
        if set.player_1 == set.player_2 {
            return Err(TournamentError::InvalidScore(format!("set {} is tied", i + 1)));
        }
        if set.player_1 > set.player_2 {
            won_1 += 1;
        } else {
            won_2 += 1;
        }
    }
    if won_1 == sets_to_win {
        Ok(true)
    } else if won_2 == sets_to_win {
        Ok(false)
    } else {
        Err(TournamentError::InvalidScore("match is not decided".to_string()))
    }
}

/// Reset a match whose slot just received a different entrant.
///
/// Any result it held was played against someone else, so the winner and
/// scores are dropped.
fn reopen(m: &mut BracketMatch, policy: ReadyPolicy) {
    m.winner_id = None;
    m.winner_name = None;
    m.scores.clear();
    let ready = match policy {
        ReadyPolicy::BothSlots => m.has_both_slots(),
        ReadyPolicy::AnySlot => true,
    };
    m.status = if ready {
        MatchStatus::Ready
    } else {
        MatchStatus::Pending
    };
}
