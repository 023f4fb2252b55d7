//! Watchlists to detect constraints that became propagating or falsified.
//!
//! Every stored constraint keeps watches in the lists of some of its literals. A watch on the
//! constraint literal `l` is stored in the list of `!l`, so the list of a literal holds exactly the
//! constraints to revisit when that literal becomes true. Which literals are watched is up to the
//! constraint kind:
//!
//! * Clauses watch two literals. Both are non-false unless the clause is propagating or falsified,
//!   in which case the true or the last falsified literal is kept in position 0.
//! * Cardinality constraints requiring `k` true literals watch `k + 1` literals, kept at the front.
//! * General pseudo-Boolean constraints watch non-false literals until their coefficients exceed
//!   the degree by at least the largest coefficient. Then no single falsification can make the
//!   constraint propagate. Below that, every non-false literal is watched.
//!
//! No watch needs updating on backtracking, unassigning literals cannot invalidate these
//! invariants.
//!
//! Clause watches use blocking literals: each watch also stores another literal of the clause,
//! when that literal is true the clause is satisfied and the clause itself need not be accessed.
//! Other kinds are not satisfied by a single true literal, their watches use the watched literal
//! itself as blocking literal, which is always false when the watch is visited.
use crate::constraint::ConstraintRef;
use crate::lit::Lit;

/// A watch on a stored constraint.
#[derive(Copy, Clone, Debug)]
pub struct Watch {
    pub cref: ConstraintRef,
    /// When this literal is true the constraint need not be visited.
    pub blocking: Lit,
}

/// Watchlists to detect constraints that became propagating or falsified.
#[derive(Default)]
pub struct Watchlists {
    /// Indexed by literal code.
    watches: Vec<Vec<Watch>>,
}

impl Watchlists {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.watches.resize(count * 2, vec![]);
    }

    /// Watch the constraint literal `lit` with the given blocking literal.
    pub fn watch(&mut self, cref: ConstraintRef, lit: Lit, blocking: Lit) {
        self.add_watch(!lit, Watch { cref, blocking });
    }

    /// Return watches for a given literal.
    pub fn watched_by_mut(&mut self, lit: Lit) -> &mut Vec<Watch> {
        &mut self.watches[lit.code()]
    }

    /// Make a literal watch a constraint.
    pub fn add_watch(&mut self, lit: Lit, watch: Watch) {
        self.watches[lit.code()].push(watch)
    }

    /// Remove all watches for which `remove` returns true.
    pub fn remove_watches(&mut self, mut remove: impl FnMut(&Watch) -> bool) {
        for watchlist in self.watches.iter_mut() {
            watchlist.retain(|watch| !remove(watch));
        }
    }

    /// Total number of watches.
    pub fn len(&self) -> usize {
        self.watches.iter().map(|watchlist| watchlist.len()).sum()
    }
}
