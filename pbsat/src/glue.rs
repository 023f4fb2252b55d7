//! Literal block distance of learnt constraints.
//!
//! The literal block distance (LBD), also called glue, of a constraint is the number of distinct
//! decision levels among its literals. Constraints with a small LBD connect few parts of the
//! search and tend to stay useful, which the LBD based deletion and restart policies exploit.

use partial_ref::{partial, PartialRef};

use crate::context::{parts::*, Context};
use crate::lit::Lit;

/// Number of distinct decision levels of the given assigned literals.
pub fn compute_glue(mut ctx: partial!(Context, mut TmpDataP, ImplGraphP), lits: &[Lit]) -> usize {
    let (tmp_data, ctx) = ctx.split_part_mut(TmpDataP);
    let impl_graph = ctx.part(ImplGraphP);
    let seen = &mut tmp_data.flags;

    let mut glue = 0;

    for &lit in lits {
        let level = impl_graph.level(lit.var());
        if !seen[level] {
            seen[level] = true;
            glue += 1;
        }
    }

    for &lit in lits {
        seen[impl_graph.level(lit.var())] = false;
    }

    glue
}
