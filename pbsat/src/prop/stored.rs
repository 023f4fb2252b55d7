//! Propagation of stored constraints.
use std::mem::replace;

use partial_ref::{partial, PartialRef};
use vec_mut_scan::VecMutScan;

use crate::constraint::Propagation;
use crate::context::{parts::*, Context};
use crate::lit::Lit;

use super::enqueue_assignment;
use super::{Conflict, Reason, Watch};

/// Update all constraints watching the negation of the given literal and enqueue the literals they
/// force.
///
/// On conflict return the falsified constraint.
///
/// See [`prop::watch`](crate::prop::watch) for the invariants that this has to uphold.
#[inline(never)]
pub fn propagate_watches(
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
    lit: Lit,
) -> Result<(), Conflict> {
    let (db, mut ctx) = ctx.split_part_mut(ConstraintDbP);
    let (watchlists, mut ctx) = ctx.split_part_mut(WatchlistsP);
    let (tmp, mut ctx) = ctx.split_part_mut(TmpDataP);

    let false_lit = !lit;
    let forced = &mut tmp.forced;

    // Temporarily move watches out of the watchlists struct, so we are free to add watches to other
    // lists during propagation. Constraints only add watches on non-false literals, which never
    // end up in this list.
    let mut watches = replace(watchlists.watched_by_mut(lit), vec![]);

    let mut scan = VecMutScan::new(&mut watches);

    let mut result = Ok(());

    while let Some(watch) = scan.next() {
        if ctx.part(AssignmentP).lit_is_true(watch.blocking) {
            continue;
        }

        let cref = watch.cref;

        forced.clear();

        let propagation = db.constraint_mut(cref).propagate(
            cref,
            false_lit,
            ctx.part(AssignmentP),
            watchlists,
            forced,
        );

        match propagation {
            Propagation::Keep(blocking) => {
                watch.replace(Watch { cref, blocking });
            }
            Propagation::Moved => {
                watch.remove();
                continue;
            }
            Propagation::Conflict => {
                result = Err(Conflict { cref });
                break;
            }
        }

        let id = db.header(cref).id();

        for &forced_lit in forced.iter() {
            enqueue_assignment(ctx.borrow(), forced_lit, Reason::Constraint(cref));
            ctx.part_mut(StatsP).propagations += 1;
            ctx.part_mut(ListenerP)
                .get_mut()
                .on_propagate(forced_lit, id);
        }
    }

    // This keeps all unprocessed watches in the current watchlist.
    drop(scan);

    *watchlists.watched_by_mut(lit) = watches;

    result
}
