//! Learnt constraint database reduction.
use ordered_float::OrderedFloat;
use partial_ref::{partial, PartialRef};
use vec_mut_scan::VecMutScan;

use crate::context::{parts::*, Context};
use crate::deletion::DeletionPolicy;

use super::db::{collect_garbage, try_delete_constraint};

/// Delete the worst ranked fraction of the unprotected learnt constraints.
///
/// Constraints that are the reason of a current assignment are skipped. Returns the number of
/// deleted constraints.
pub fn reduce_learnts(
    mut ctx: partial!(
        Context,
        mut ConstraintDbP,
        mut WatchlistsP,
        AssignmentP,
        ImplGraphP,
    ),
    policy: &dyn DeletionPolicy,
) -> usize {
    let mut candidates: Vec<_> = {
        let db = ctx.part(ConstraintDbP);
        db.learnts()
            .iter()
            .cloned()
            .filter(|&cref| {
                let header = db.header(cref);
                !header.deleted() && !policy.is_protected(header)
            })
            .collect()
    };

    // Worst first
    {
        let db = ctx.part(ConstraintDbP);
        candidates.sort_by_cached_key(|&cref| OrderedFloat(policy.score(db.header(cref))));
    }

    let mut to_delete = (candidates.len() as f64 * policy.removal_fraction()) as usize;
    let mut deleted = 0;

    let mut scan = VecMutScan::new(&mut candidates);

    while to_delete > 0 {
        let cref = match scan.next() {
            Some(cref) => cref,
            None => break,
        };
        if try_delete_constraint(ctx.borrow(), *cref) {
            cref.remove();
            to_delete -= 1;
            deleted += 1;
        }
    }

    drop(scan);

    collect_garbage(ctx.borrow());

    deleted
}
