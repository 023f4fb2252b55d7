//! Unit propagation.
use partial_ref::{partial, PartialRef};

use crate::context::{parts::*, Context};

pub mod assignment;
pub mod graph;
pub mod stored;
pub mod watch;

pub use assignment::{backtrack, enqueue_assignment, restart, Assignment, Trail};
pub use graph::{Conflict, ImplGraph, Reason};
pub use stored::propagate_watches;
pub use watch::{Watch, Watchlists};

/// Propagate enqueued assignments.
///
/// Returns when all enqueued assignments are propagated, including newly propagated assignments,
/// or if there is a conflict.
///
/// On conflict the first falsified constraint found is returned and the trail is not fully
/// propagated.
pub fn propagate(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ConstraintDbP,
        mut ImplGraphP,
        mut ListenerP,
        mut StatsP,
        mut TmpDataP,
        mut TrailP,
        mut WatchlistsP,
    ),
) -> Result<(), Conflict> {
    while let Some(lit) = ctx.part(TrailP).queue_head() {
        ctx.part_mut(TrailP).pop_queue();
        propagate_watches(ctx.borrow(), lit)?;
    }
    Ok(())
}
