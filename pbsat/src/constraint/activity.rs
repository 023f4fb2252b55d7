//! Learnt constraint activity.
use partial_ref::{partial, PartialRef};

use crate::config::SolverConfig;
use crate::context::{parts::*, Context};

use super::ConstraintRef;

/// Learnt constraint activity.
///
/// The individual activities are stored in the constraint headers. This stores global metadata
/// used for bumping and decaying activities.
pub struct ConstraintActivity {
    /// The value to add on bumping.
    bump: f32,
    /// The inverse of the decay factor.
    inv_decay: f32,
}

impl Default for ConstraintActivity {
    fn default() -> ConstraintActivity {
        ConstraintActivity {
            bump: 1.0,
            inv_decay: 1.0 / SolverConfig::default().constraint_activity_decay,
        }
    }
}

impl ConstraintActivity {
    /// Change the decay factor.
    pub fn set_decay(&mut self, decay: f32) {
        assert!(decay < 1.0);
        assert!(decay > 1.0 / 16.0);
        self.inv_decay = 1.0 / decay;
    }
}

/// Rescale activities if any value exceeds this value.
fn rescale_limit() -> f32 {
    std::f32::MAX / 16.0
}

/// Increase a learnt constraint's activity.
///
/// Original constraints have no activity.
pub fn bump_constraint_activity(
    mut ctx: partial!(Context, mut ConstraintActivityP, mut ConstraintDbP),
    cref: ConstraintRef,
) {
    let bump = ctx.part(ConstraintActivityP).bump;
    let header = ctx.part_mut(ConstraintDbP).header_mut(cref);

    if !header.is_learnt() {
        return;
    }

    let activity = header.activity() + bump;

    header.set_activity(activity);

    if activity > rescale_limit() {
        rescale_constraint_activities(ctx.borrow());
    }
}

/// Rescale all values to avoid an overflow.
fn rescale_constraint_activities(
    mut ctx: partial!(Context, mut ConstraintActivityP, mut ConstraintDbP),
) {
    let rescale_factor = 1.0 / rescale_limit();

    let db = ctx.part_mut(ConstraintDbP);
    let learnts = db.learnts().to_vec();
    for cref in learnts {
        let header = db.header_mut(cref);
        if !header.deleted() {
            let activity = header.activity() * rescale_factor;
            header.set_activity(activity);
        }
    }
    ctx.part_mut(ConstraintActivityP).bump *= rescale_factor;
}

/// Decay the learnt constraint activities.
pub fn decay_constraint_activities(
    mut ctx: partial!(Context, mut ConstraintActivityP, mut ConstraintDbP),
) {
    let activities = ctx.part_mut(ConstraintActivityP);
    activities.bump *= activities.inv_decay;
    if activities.bump >= rescale_limit() {
        rescale_constraint_activities(ctx.borrow());
    }
}
