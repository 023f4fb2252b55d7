//! Database for stored constraints.
use std::fmt;

use partial_ref::{partial, PartialRef};
use serde::{Deserialize, Serialize};

use crate::context::{parts::*, Context};
use crate::lit::LitIdx;
use crate::prop::Reason;

use super::{Constraint, ConstraintKind};

/// Index of a stored constraint.
///
/// Slots of deleted constraints are reused after garbage collection, so a `ConstraintRef` is only
/// valid as long as the constraint is stored.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ConstraintRef(LitIdx);

impl ConstraintRef {
    pub fn from_index(index: usize) -> ConstraintRef {
        ConstraintRef(index as LitIdx)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifies a constraint towards the user and in listener events.
///
/// Ids are issued in order of addition and never reused. Both halves of an equality share an id.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct ConstraintId(u64);

impl ConstraintId {
    pub fn index(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Metadata for a stored constraint.
#[derive(Copy, Clone, Debug)]
pub struct ConstraintHeader {
    id: ConstraintId,
    learnt: bool,
    deleted: bool,
    activity: f32,
    /// Literal block distance when learnt.
    lbd: u32,
}

impl ConstraintHeader {
    /// Header for a constraint of the input formula.
    pub fn original(id: ConstraintId) -> ConstraintHeader {
        ConstraintHeader {
            id,
            learnt: false,
            deleted: false,
            activity: 0.0,
            lbd: 0,
        }
    }

    /// Header for a learnt constraint with the given literal block distance.
    pub fn learnt(lbd: usize) -> ConstraintHeader {
        ConstraintHeader {
            id: ConstraintId(0),
            learnt: true,
            deleted: false,
            activity: 0.0,
            lbd: lbd.min(u32::max_value() as usize) as u32,
        }
    }

    pub fn id(&self) -> ConstraintId {
        self.id
    }

    pub fn set_id(&mut self, id: ConstraintId) {
        self.id = id;
    }

    pub fn is_learnt(&self) -> bool {
        self.learnt
    }

    /// Whether the constraint is deleted but its slot not yet collected.
    pub fn deleted(&self) -> bool {
        self.deleted
    }

    pub fn activity(&self) -> f32 {
        self.activity
    }

    pub fn set_activity(&mut self, activity: f32) {
        self.activity = activity;
    }

    pub fn lbd(&self) -> u32 {
        self.lbd
    }
}

/// Database for stored constraints.
///
/// Deletion only marks a constraint. Its watches stay in the watchlists until the next
/// [`collect_garbage`], which also makes the slot available again.
#[derive(Default)]
pub struct ConstraintDb {
    constraints: Vec<Constraint>,
    headers: Vec<ConstraintHeader>,
    /// Collected slots.
    free: Vec<ConstraintRef>,
    /// Deleted constraints with watches still present.
    garbage: Vec<ConstraintRef>,
    /// May contain deleted constraints.
    learnts: Vec<ConstraintRef>,
    next_id: u64,
    /// Kept up to date on addition and deletion.
    count_by_kind: [usize; ConstraintKind::count()],
    learnt_count: usize,
}

impl ConstraintDb {
    /// Allocate a fresh id.
    pub fn issue_id(&mut self) -> ConstraintId {
        let id = ConstraintId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn constraint(&self, cref: ConstraintRef) -> &Constraint {
        &self.constraints[cref.index()]
    }

    pub fn constraint_mut(&mut self, cref: ConstraintRef) -> &mut Constraint {
        &mut self.constraints[cref.index()]
    }

    pub fn header(&self, cref: ConstraintRef) -> &ConstraintHeader {
        &self.headers[cref.index()]
    }

    pub fn header_mut(&mut self, cref: ConstraintRef) -> &mut ConstraintHeader {
        &mut self.headers[cref.index()]
    }

    /// Learnt constraints, may include deleted ones.
    pub fn learnts(&self) -> &[ConstraintRef] {
        &self.learnts
    }

    /// Number of stored learnt constraints.
    pub fn learnt_count(&self) -> usize {
        self.learnt_count
    }

    /// Number of stored constraints of the given kind, original and learnt.
    pub fn count_by_kind(&self, kind: ConstraintKind) -> usize {
        self.count_by_kind[kind as usize]
    }

    /// Number of stored constraints.
    pub fn len(&self) -> usize {
        self.count_by_kind.iter().sum()
    }

    /// All stored constraints that are not deleted.
    pub fn live_refs(&self) -> impl Iterator<Item = ConstraintRef> + '_ {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, header)| !header.deleted())
            .map(|(index, _)| ConstraintRef::from_index(index))
    }

    /// Mark a constraint as deleted.
    pub fn delete(&mut self, cref: ConstraintRef) {
        let header = &mut self.headers[cref.index()];
        debug_assert!(!header.deleted, "delete for already deleted constraint");

        header.deleted = true;
        if header.learnt {
            self.learnt_count -= 1;
        }
        self.count_by_kind[self.constraints[cref.index()].kind() as usize] -= 1;
        self.garbage.push(cref);
    }
}

/// Store a constraint and add its watches.
pub fn add_constraint(
    mut ctx: partial!(Context, mut ConstraintDbP, mut WatchlistsP, AssignmentP),
    header: ConstraintHeader,
    mut constraint: Constraint,
) -> ConstraintRef {
    let (db, mut ctx) = ctx.split_part_mut(ConstraintDbP);

    let cref = match db.free.pop() {
        Some(cref) => cref,
        None => {
            db.constraints.push(Constraint::default());
            db.headers.push(header);
            ConstraintRef::from_index(db.constraints.len() - 1)
        }
    };

    let (watchlists, ctx) = ctx.split_part_mut(WatchlistsP);
    constraint.attach(cref, ctx.part(AssignmentP), watchlists);

    db.count_by_kind[constraint.kind() as usize] += 1;
    if header.is_learnt() {
        db.learnts.push(cref);
        db.learnt_count += 1;
    }

    db.constraints[cref.index()] = constraint;
    db.headers[cref.index()] = header;

    cref
}

/// Whether the constraint is the reason of a current assignment.
pub fn is_locked(
    ctx: partial!(Context, AssignmentP, ConstraintDbP, ImplGraphP),
    cref: ConstraintRef,
) -> bool {
    let assignment = ctx.part(AssignmentP);
    let impl_graph = ctx.part(ImplGraphP);
    ctx.part(ConstraintDbP)
        .constraint(cref)
        .lits()
        .iter()
        .any(|&lit| {
            assignment.lit_is_true(lit)
                && impl_graph.reason(lit.var()) == &Reason::Constraint(cref)
        })
}

/// Delete a constraint unless it is locked.
///
/// Returns whether the constraint was deleted.
pub fn try_delete_constraint(
    mut ctx: partial!(Context, mut ConstraintDbP, AssignmentP, ImplGraphP),
    cref: ConstraintRef,
) -> bool {
    if is_locked(ctx.borrow(), cref) {
        false
    } else {
        ctx.part_mut(ConstraintDbP).delete(cref);
        true
    }
}

/// Remove the watches of deleted constraints and make their slots available.
pub fn collect_garbage(mut ctx: partial!(Context, mut ConstraintDbP, mut WatchlistsP)) {
    let (db, mut ctx) = ctx.split_part_mut(ConstraintDbP);

    if db.garbage.is_empty() {
        return;
    }

    let headers = &db.headers;
    ctx.part_mut(WatchlistsP)
        .remove_watches(|watch| headers[watch.cref.index()].deleted());

    for cref in db.garbage.drain(..) {
        db.constraints[cref.index()] = Constraint::default();
        db.free.push(cref);
    }

    let headers = &db.headers;
    db.learnts.retain(|cref| !headers[cref.index()].deleted());
}
