//! Central solver data structure.
use partial_ref::{part, partial, PartialRef, PartialRefTarget};

use crate::analyze_conflict::AnalyzeConflict;
use crate::assumptions::Assumptions;
use crate::config::SolverConfig;
use crate::constraint::{ConstraintActivity, ConstraintDb};
use crate::decision::{vsids::Vsids, Order};
use crate::listener::Listener;
use crate::prop::{Assignment, ImplGraph, Trail, Watchlists};
use crate::schedule::Schedule;
use crate::state::SolverState;
use crate::stats::SearchStats;
use crate::tmp::TmpData;

/// Part declarations for the [`Context`] struct.
pub mod parts {
    use super::*;

    part!(pub AnalyzeConflictP: AnalyzeConflict);
    part!(pub AssignmentP: Assignment);
    part!(pub AssumptionsP: Assumptions);
    part!(pub ConstraintActivityP: ConstraintActivity);
    part!(pub ConstraintDbP: ConstraintDb);
    part!(pub ImplGraphP: ImplGraph);
    part!(pub ListenerP: Listener);
    part!(pub OrderP: Order);
    part!(pub ScheduleP: Schedule);
    part!(pub SolverConfigP: SolverConfig);
    part!(pub SolverStateP: SolverState);
    part!(pub StatsP: SearchStats);
    part!(pub TmpDataP: TmpData);
    part!(pub TrailP: Trail);
    part!(pub VsidsP: Vsids);
    part!(pub WatchlistsP: Watchlists);
}

pub use parts::*;

/// Central solver data structure.
///
/// Functions operating on several fields take partial references (see the `partial_ref` crate),
/// which documents their data dependencies and lets disjoint parts be borrowed independently.
#[derive(PartialRefTarget, Default)]
pub struct Context {
    #[part = "AnalyzeConflictP"]
    analyze_conflict: AnalyzeConflict,
    #[part = "AssignmentP"]
    assignment: Assignment,
    #[part = "AssumptionsP"]
    assumptions: Assumptions,
    #[part = "ConstraintActivityP"]
    constraint_activity: ConstraintActivity,
    #[part = "ConstraintDbP"]
    constraint_db: ConstraintDb,
    #[part = "ImplGraphP"]
    impl_graph: ImplGraph,
    #[part = "ListenerP"]
    listener: Listener,
    #[part = "OrderP"]
    order: Order,
    #[part = "ScheduleP"]
    schedule: Schedule,
    #[part = "SolverConfigP"]
    solver_config: SolverConfig,
    #[part = "SolverStateP"]
    solver_state: SolverState,
    #[part = "StatsP"]
    stats: SearchStats,
    #[part = "TmpDataP"]
    tmp_data: TmpData,
    #[part = "TrailP"]
    trail: Trail,
    #[part = "VsidsP"]
    vsids: Vsids,
    #[part = "WatchlistsP"]
    watchlists: Watchlists,
}

/// Update structures for a new variable count.
pub fn set_var_count(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut ImplGraphP,
        mut OrderP,
        mut TmpDataP,
        mut VsidsP,
        mut WatchlistsP,
    ),
    count: usize,
) {
    ctx.part_mut(AnalyzeConflictP).set_var_count(count);
    ctx.part_mut(AssignmentP).set_var_count(count);
    ctx.part_mut(ImplGraphP).set_var_count(count);
    ctx.part_mut(OrderP).set_var_count(count);
    ctx.part_mut(TmpDataP).set_var_count(count);
    ctx.part_mut(VsidsP).set_var_count(count);
    ctx.part_mut(WatchlistsP).set_var_count(count);
}

/// Increases the variable count to at least the given value.
pub fn ensure_var_count(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut ImplGraphP,
        mut OrderP,
        mut TmpDataP,
        mut VsidsP,
        mut WatchlistsP,
    ),
    count: usize,
) {
    if count > ctx.part(AssignmentP).assignment().len() {
        set_var_count(ctx.borrow(), count)
    }
}
