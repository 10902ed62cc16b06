//! Tournament business logic: bracket engine, allocation helpers, spin-wheel allocator.

mod allocation;
mod allocator;
mod bracket;
mod workflow;

pub use allocation::{
    assigned_ids, compute_stats, compute_unassigned, filter_eligible, least_loaded, natural_cmp,
    ordered_team_indices, AllocationFilter, AllocationStats, Assignment, TeamOrder,
};
pub use allocator::{SpinOutcome, TeamAllocator};
pub use bracket::{generate_bracket, record_match_result, record_match_score};
pub use workflow::{approved_entrants, create_bracket, submit_match_result, submit_match_score};
