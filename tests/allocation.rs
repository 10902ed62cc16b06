//! Integration tests for eligibility, stats and the spin-wheel team allocator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::HashSet;
use tournament_desk::store::{BracketPatch, ParticipantPatch, TeamPatch};
use tournament_desk::{
    compute_stats, compute_unassigned, filter_eligible, natural_cmp, AllocationFilter, Bracket,
    BracketId, Caller, Category, DocumentStore, Gender, Level, MemoryStore, Participant,
    ParticipantId, Role, StoreError, Team, TeamAllocator, TeamId, TeamOrder, TournamentError,
    TournamentId,
};
use uuid::Uuid;

const CATEGORY: &str = "mixed-team";

fn admin() -> Caller {
    Caller::new("admin-1", Role::Admin)
}

fn category() -> Category {
    Category::from(CATEGORY)
}

fn player(tournament_id: TournamentId, name: &str, gender: Gender, level: Level) -> Participant {
    Participant::new(tournament_id, name, category(), gender, level)
}

/// Store seeded with `players` registrations and the named teams (in creation order).
fn seeded_store(players: usize, team_names: &[&str]) -> (MemoryStore, TournamentId) {
    let store = MemoryStore::new();
    let tournament_id = Uuid::new_v4();
    for i in 0..players {
        let gender = if i % 2 == 0 { Gender::Male } else { Gender::Female };
        store
            .create_participant(player(tournament_id, &format!("P{}", i + 1), gender, Level::Beginner))
            .unwrap();
    }
    for name in team_names {
        store.create_team(Team::new(tournament_id, category(), *name)).unwrap();
    }
    (store, tournament_id)
}

fn allocator(store: &MemoryStore, tournament_id: TournamentId) -> TeamAllocator<'_, MemoryStore> {
    TeamAllocator::load(store, tournament_id, AllocationFilter::new(category()), admin()).unwrap()
}

fn roster_sizes(store: &MemoryStore, tournament_id: TournamentId) -> Vec<usize> {
    store
        .get_teams(tournament_id, &category())
        .unwrap()
        .iter()
        .map(|t| t.players.len())
        .collect()
}

#[test]
fn filter_applies_category_gender_and_level() {
    let tid = Uuid::new_v4();
    let mut other = player(tid, "Other", Gender::Male, Level::Beginner);
    other.category = Category::from("mens-single");
    let registrations = vec![
        player(tid, "A", Gender::Male, Level::Beginner),
        player(tid, "B", Gender::Female, Level::Beginner),
        player(tid, "C", Gender::Female, Level::Expert),
        other,
    ];

    let all = filter_eligible(&registrations, &AllocationFilter::new(category()));
    assert_eq!(all.len(), 3);

    let women = filter_eligible(&registrations, &AllocationFilter::new(category()).with_gender(Gender::Female));
    let names: Vec<&str> = women.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["B", "C"]);

    let expert_women = AllocationFilter::new(category())
        .with_gender(Gender::Female)
        .with_level(Level::Expert);
    let names: Vec<String> = filter_eligible(&registrations, &expert_women)
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["C"]);
}

#[test]
fn natural_collation_orders_numbers_by_value() {
    assert_eq!(natural_cmp("Team 2", "Team 10"), Ordering::Less);
    assert_eq!(natural_cmp("Team 10", "Team 9"), Ordering::Greater);
    assert_eq!(natural_cmp("alpha", "Beta"), Ordering::Less);
    assert!(natural_cmp("Team 02", "Team 2").is_ne());
    assert_eq!(natural_cmp("Team", "Team 1"), Ordering::Less);

    let mut names = vec!["Team 10", "Team 1", "team 3", "Team 2"];
    names.sort_by(|a, b| natural_cmp(a, b));
    assert_eq!(names, ["Team 1", "Team 2", "team 3", "Team 10"]);
}

#[test]
fn unassigned_ignores_teams_of_other_categories() {
    let tid = Uuid::new_v4();
    let eligible = vec![
        player(tid, "A", Gender::Male, Level::Beginner),
        player(tid, "B", Gender::Male, Level::Beginner),
    ];
    let mut ours = Team::new(tid, category(), "Team 1");
    ours.players.push(eligible[0].id);
    let mut theirs = Team::new(tid, Category::from("mens-double"), "Team X");
    theirs.players.push(eligible[1].id);

    let unassigned = compute_unassigned(&eligible, &[ours, theirs], &category());
    assert_eq!(unassigned.len(), 1);
    assert_eq!(unassigned[0].id, eligible[1].id);
}

#[test]
fn stats_count_only_filtered_members() {
    let tid = Uuid::new_v4();
    let registrations = vec![
        player(tid, "A", Gender::Male, Level::Beginner),
        player(tid, "B", Gender::Female, Level::Beginner),
        player(tid, "C", Gender::Female, Level::Beginner),
        player(tid, "D", Gender::Female, Level::Beginner),
    ];
    let mut t1 = Team::new(tid, category(), "Team 1");
    t1.players = vec![registrations[0].id, registrations[1].id];
    let mut t2 = Team::new(tid, category(), "Team 2");
    t2.players = vec![registrations[2].id];
    let teams = vec![t1, t2];

    let women = filter_eligible(&registrations, &AllocationFilter::new(category()).with_gender(Gender::Female));
    let unassigned = compute_unassigned(&women, &teams, &category());
    let stats = compute_stats(&women, &teams, &unassigned, &category());
    assert_eq!(stats.total_players, 3);
    assert_eq!(stats.total_assigned, 2);
    assert_eq!(stats.total_unassigned, 1);
    assert_eq!(stats.teams_count, 2);
    assert_eq!(stats.average_per_team, 1);

    let everyone = filter_eligible(&registrations, &AllocationFilter::new(category()));
    let unassigned = compute_unassigned(&everyone, &teams, &category());
    let stats = compute_stats(&everyone, &teams, &unassigned, &category());
    assert_eq!(stats.total_assigned, 3);
    // 3 / 2 rounds up.
    assert_eq!(stats.average_per_team, 2);

    let empty = compute_stats(&everyone, &[], &everyone, &category());
    assert_eq!(empty.average_per_team, 0);
    assert_eq!(empty.teams_count, 0);
}

#[test]
fn spin_one_targets_least_loaded_team_by_name() {
    let (store, tid) = seeded_store(6, &["Team 10", "Team 2", "Team 1"]);
    let mut alloc = allocator(&store, tid);
    let mut rng = StdRng::seed_from_u64(7);

    let targets: Vec<String> = (0..4)
        .map(|_| alloc.spin_one(&mut rng, TeamOrder::ByName).unwrap().assignment.team_name)
        .collect();
    assert_eq!(targets, ["Team 1", "Team 2", "Team 10", "Team 1"]);
}

#[test]
fn spin_one_never_repeats_a_rostered_participant() {
    let (store, tid) = seeded_store(9, &["Team A", "Team B"]);
    let mut alloc = allocator(&store, tid);
    let mut rng = StdRng::seed_from_u64(42);

    let mut seen = HashSet::new();
    for _ in 0..9 {
        let outcome = alloc.spin_one(&mut rng, TeamOrder::ByName).unwrap();
        assert!(outcome.animated_index < 9);
        assert!(seen.insert(outcome.assignment.participant_id));
    }
    assert!(alloc.unassigned().is_empty());
    assert_eq!(
        alloc.spin_one(&mut rng, TeamOrder::ByName),
        Err(TournamentError::EmptyUnassignedPool)
    );
    assert_eq!(roster_sizes(&store, tid), [5, 4]);
}

#[test]
fn spin_one_commits_the_second_of_two_draws() {
    let (store, tid) = seeded_store(9, &["Team A", "Team B"]);
    let mut alloc = allocator(&store, tid);
    let mut rng = StdRng::seed_from_u64(11);
    let mut replay = StdRng::seed_from_u64(11);

    let mut draws_differed = false;
    for _ in 0..9 {
        let pool = alloc.unassigned();
        let animated = replay.gen_range(0..pool.len());
        let committed = replay.gen_range(0..pool.len());
        draws_differed |= animated != committed;

        let outcome = alloc.spin_one(&mut rng, TeamOrder::ByName).unwrap();
        assert_eq!(outcome.animated_index, animated);
        assert_eq!(outcome.assignment.participant_id, pool[committed].id);
    }
    // Exactly two draws per spin: both generators are still in step.
    assert_eq!(rng.gen::<u64>(), replay.gen::<u64>());
    assert!(draws_differed);
}

#[test]
fn spin_requires_teams() {
    let (store, tid) = seeded_store(3, &[]);
    let mut alloc = allocator(&store, tid);
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(alloc.spin_one(&mut rng, TeamOrder::ByName), Err(TournamentError::NoTeamsAvailable));
    assert_eq!(alloc.spin_round(&mut rng, TeamOrder::ByName), Err(TournamentError::NoTeamsAvailable));
    assert_eq!(alloc.auto_assign_all(TeamOrder::Insertion), Err(TournamentError::NoTeamsAvailable));
}

#[test]
fn spin_round_gives_each_team_at_most_one_player() {
    let (store, tid) = seeded_store(4, &["TeamB", "TeamA"]);
    // P4 already sits on TeamB, leaving P1..P3 unassigned.
    let regs = store.get_participants(tid, &category()).unwrap();
    let team_b = store.get_teams(tid, &category()).unwrap()[0].id;
    let mut alloc = allocator(&store, tid);
    alloc.assign_one(regs[3].id, team_b).unwrap();
    assert_eq!(alloc.unassigned().len(), 3);

    let mut rng = StdRng::seed_from_u64(3);
    let assignments = alloc.spin_round(&mut rng, TeamOrder::ByName).unwrap();
    assert_eq!(assignments.len(), 2);
    assert_eq!(assignments[0].team_name, "TeamA");
    assert_eq!(assignments[1].team_name, "TeamB");
    assert_ne!(assignments[0].participant_id, assignments[1].participant_id);
    assert!(assignments.iter().all(|a| a.participant_id != regs[3].id));
    assert_eq!(alloc.unassigned().len(), 1);
    assert_eq!(roster_sizes(&store, tid), [2, 1]);
}

#[test]
fn spin_round_with_more_teams_than_players() {
    let (store, tid) = seeded_store(2, &["T1", "T2", "T3", "T4"]);
    let mut alloc = allocator(&store, tid);
    let mut rng = StdRng::seed_from_u64(11);
    let assignments = alloc.spin_round(&mut rng, TeamOrder::ByName).unwrap();

    let teams: Vec<&str> = assignments.iter().map(|a| a.team_name.as_str()).collect();
    assert_eq!(teams, ["T1", "T2"]);
    assert_eq!(
        alloc.spin_round(&mut rng, TeamOrder::ByName),
        Err(TournamentError::EmptyUnassignedPool)
    );
}

#[test]
fn auto_assign_deals_in_insertion_order() {
    let (store, tid) = seeded_store(10, &["Team 3", "Team 1", "Team 2"]);
    let mut alloc = allocator(&store, tid);
    let assignments = alloc.auto_assign_all(TeamOrder::Insertion).unwrap();

    assert_eq!(assignments.len(), 10);
    assert_eq!(assignments[0].team_name, "Team 3");
    assert_eq!(assignments[1].team_name, "Team 1");
    assert_eq!(roster_sizes(&store, tid), [4, 3, 3]);
    assert!(alloc.unassigned().is_empty());
}

#[test]
fn unassign_then_auto_assign_restores_balance() {
    let (store, tid) = seeded_store(11, &["A", "B", "C", "D"]);
    let mut alloc = allocator(&store, tid);
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..5 {
        alloc.spin_one(&mut rng, TeamOrder::ByName).unwrap();
    }

    let removed = alloc.unassign_all().unwrap();
    assert_eq!(removed, 5);
    let stats = alloc.stats();
    assert_eq!(stats.total_assigned, 0);
    assert_eq!(stats.total_unassigned, stats.total_players);
    assert_eq!(roster_sizes(&store, tid), [0, 0, 0, 0]);

    alloc.auto_assign_all(TeamOrder::Insertion).unwrap();
    let sizes = roster_sizes(&store, tid);
    let (min, max) = (sizes.iter().min().unwrap(), sizes.iter().max().unwrap());
    assert!(max - min <= 1, "{:?}", sizes);
    assert_eq!(sizes.iter().sum::<usize>(), 11);
}

#[test]
fn stats_follow_active_filter_after_unassign() {
    let (store, tid) = seeded_store(6, &["A", "B"]);
    let mut alloc = allocator(&store, tid);
    alloc.auto_assign_all(TeamOrder::Insertion).unwrap();

    let filter = AllocationFilter::new(category()).with_gender(Gender::Female);
    let mut women = TeamAllocator::load(&store, tid, filter, admin()).unwrap();
    assert_eq!(women.stats().total_assigned, 3);
    women.unassign_all().unwrap();
    let stats = women.stats();
    assert_eq!(stats.total_players, 3);
    assert_eq!(stats.total_assigned, 0);
    assert_eq!(stats.total_unassigned, 3);
}

#[test]
fn assign_one_rejects_double_rostering() {
    let (store, tid) = seeded_store(2, &["A", "B"]);
    let regs = store.get_participants(tid, &category()).unwrap();
    let teams = store.get_teams(tid, &category()).unwrap();
    let mut alloc = allocator(&store, tid);

    let assignment = alloc.assign_one(regs[0].id, teams[0].id).unwrap();
    assert_eq!(assignment.team_name, "A");
    assert_eq!(
        alloc.assign_one(regs[0].id, teams[1].id),
        Err(TournamentError::AlreadyRostered {
            participant_id: regs[0].id,
            team_id: teams[0].id,
        })
    );

    let stored = store.get_teams(tid, &category()).unwrap();
    assert_eq!(stored[0].players, vec![regs[0].id]);
    assert_eq!(stored[0].updated_by.as_deref(), Some("admin-1"));
    assert!(stored[1].players.is_empty());

    let missing = Uuid::new_v4();
    assert_eq!(alloc.assign_one(regs[1].id, missing), Err(TournamentError::TeamNotFound(missing)));
    assert_eq!(
        alloc.assign_one(missing, teams[1].id),
        Err(TournamentError::ParticipantNotFound(missing))
    );
}

#[test]
fn public_caller_cannot_allocate() {
    let (store, tid) = seeded_store(2, &["A"]);
    let mut alloc =
        TeamAllocator::load(&store, tid, AllocationFilter::new(category()), Caller::public()).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    assert_eq!(alloc.spin_one(&mut rng, TeamOrder::ByName), Err(TournamentError::Forbidden));
    assert_eq!(alloc.unassign_all(), Err(TournamentError::Forbidden));
    assert_eq!(alloc.stats().total_players, 2);
}

/// Delegates to a memory store but fails team writes once its budget is spent.
struct FlakyStore {
    inner: MemoryStore,
    writes_left: Cell<usize>,
}

impl DocumentStore for FlakyStore {
    fn get_participants(&self, t: TournamentId, c: &Category) -> Result<Vec<Participant>, StoreError> {
        self.inner.get_participants(t, c)
    }

    fn get_teams(&self, t: TournamentId, c: &Category) -> Result<Vec<Team>, StoreError> {
        self.inner.get_teams(t, c)
    }

    fn get_bracket(&self, id: BracketId) -> Result<Option<Bracket>, StoreError> {
        self.inner.get_bracket(id)
    }

    fn list_brackets(&self, t: TournamentId, c: &Category) -> Result<Vec<Bracket>, StoreError> {
        self.inner.list_brackets(t, c)
    }

    fn create_bracket(&self, bracket: Bracket) -> Result<BracketId, StoreError> {
        self.inner.create_bracket(bracket)
    }

    fn update_bracket(&self, id: BracketId, patch: BracketPatch) -> Result<(), StoreError> {
        self.inner.update_bracket(id, patch)
    }

    fn update_team(&self, id: TeamId, patch: TeamPatch) -> Result<(), StoreError> {
        match self.writes_left.get() {
            0 => Err(StoreError::Unavailable("network down".to_string())),
            n => {
                self.writes_left.set(n - 1);
                self.inner.update_team(id, patch)
            }
        }
    }

    fn create_participant(&self, p: Participant) -> Result<ParticipantId, StoreError> {
        self.inner.create_participant(p)
    }

    fn update_participant(
        &self,
        t: TournamentId,
        id: ParticipantId,
        patch: ParticipantPatch,
    ) -> Result<Participant, StoreError> {
        self.inner.update_participant(t, id, patch)
    }

    fn create_team(&self, team: Team) -> Result<TeamId, StoreError> {
        self.inner.create_team(team)
    }
}

#[test]
fn failed_write_keeps_earlier_batch_writes() {
    let (inner, tid) = seeded_store(5, &["A", "B", "C"]);
    let store = FlakyStore {
        inner,
        writes_left: Cell::new(1),
    };
    let mut alloc = TeamAllocator::load(&store, tid, AllocationFilter::new(category()), admin()).unwrap();
    let mut rng = StdRng::seed_from_u64(9);

    let result = alloc.spin_round(&mut rng, TeamOrder::ByName);
    assert_eq!(
        result,
        Err(TournamentError::StoreWriteFailure(StoreError::Unavailable(
            "network down".to_string()
        )))
    );
    let sizes: Vec<usize> = alloc.teams().iter().map(|t| t.players.len()).collect();
    assert_eq!(sizes, [1, 0, 0]);
    assert_eq!(roster_sizes(&store.inner, tid), [1, 0, 0]);
    assert_eq!(alloc.unassigned().len(), 4);
}
