//! Scheduling of restarts, database reductions and solving steps.
use log::debug;

use partial_ref::{partial, PartialRef};

use crate::cdcl::conflict_step;
use crate::config::SolverConfig;
use crate::constraint::reduce_learnts;
use crate::context::{parts::*, Context};
use crate::control::{ActiveLimits, SolveLimits, SolverControl};
use crate::deletion::DeletionPolicy;
use crate::prop::restart;
use crate::restart::RestartPolicy;
use crate::state::SatState;

/// Scheduling of restarts, database reductions and solving steps.
pub struct Schedule {
    restart_policy: Box<dyn RestartPolicy>,
    deletion_policy: Box<dyn DeletionPolicy>,
    control: SolverControl,
    limits: ActiveLimits,
}

impl Default for Schedule {
    fn default() -> Schedule {
        let config = SolverConfig::default();
        Schedule {
            restart_policy: config.restart_policy(),
            deletion_policy: config.deletion_policy(),
            control: SolverControl::default(),
            limits: ActiveLimits::default(),
        }
    }
}

impl Schedule {
    pub fn set_restart_policy(&mut self, policy: Box<dyn RestartPolicy>) {
        self.restart_policy = policy;
    }

    pub fn set_deletion_policy(&mut self, policy: Box<dyn DeletionPolicy>) {
        self.deletion_policy = policy;
    }

    pub fn restart_policy(&self) -> &dyn RestartPolicy {
        &*self.restart_policy
    }

    pub fn deletion_policy(&self) -> &dyn DeletionPolicy {
        &*self.deletion_policy
    }

    /// Handle shared with the users of the solver.
    pub fn control(&self) -> &SolverControl {
        &self.control
    }

    /// Start the limits of a new solve call.
    pub fn start(&mut self, limits: SolveLimits, conflicts: u64) {
        self.limits = ActiveLimits::start(limits, conflicts);
    }
}

/// Perform one step of the schedule.
///
/// Returns false when the search is finished or was interrupted.
pub fn schedule_step(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut AssumptionsP,
        mut ConstraintActivityP,
        mut ConstraintDbP,
        mut ImplGraphP,
        mut ListenerP,
        mut OrderP,
        mut ScheduleP,
        mut SolverStateP,
        mut StatsP,
        mut TmpDataP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
        SolverConfigP,
    ),
) -> bool {
    let (schedule, mut ctx) = ctx.split_part_mut(ScheduleP);

    if ctx.part(SolverStateP).sat_state != SatState::Unknown {
        return false;
    }

    let conflicts = ctx.part(StatsP).conflicts;
    if schedule.control.take_cancel() || schedule.limits.exceeded(conflicts) {
        debug!("search interrupted after {} conflicts", conflicts);
        ctx.part_mut(SolverStateP).sat_state = SatState::Interrupted;
        return false;
    }

    if schedule.restart_policy.should_restart() | schedule.control.take_restart() {
        restart(ctx.borrow());
        schedule.restart_policy.on_restart();

        let stats = ctx.part_mut(StatsP);
        stats.restarts += 1;
        debug!(
            "restart {} ({}), next after {} conflicts",
            stats.restarts,
            schedule.restart_policy.name(),
            schedule.restart_policy.next_bound()
        );
        ctx.part_mut(ListenerP).get_mut().on_restart();
    }

    if schedule.deletion_policy.should_clean() | schedule.control.take_clean() {
        let deleted = reduce_learnts(ctx.borrow(), &*schedule.deletion_policy);
        schedule.deletion_policy.on_clean();

        let learnt = ctx.part(ConstraintDbP).learnt_count();
        let stats = ctx.part_mut(StatsP);
        stats.reductions += 1;
        stats.deleted_learnts += deleted as u64;
        debug!(
            "reduction {} ({}) deleted {} learnt constraints, {} left",
            stats.reductions,
            schedule.deletion_policy.name(),
            deleted,
            learnt
        );
        ctx.part_mut(ListenerP).get_mut().on_clean();
    }

    let conflicts = ctx.part(StatsP).conflicts;

    let glue = conflict_step(ctx.borrow());

    if ctx.part(StatsP).conflicts > conflicts {
        schedule.restart_policy.on_conflict();
        schedule.deletion_policy.on_conflict();
    }
    if let Some(glue) = glue {
        schedule.restart_policy.on_learnt(glue);
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use pbsat_formula::test::pigeon_hole;
    use pbsat_formula::LinearConstraint;

    use crate::deletion::ActivityDeletion;
    use crate::listener::test::{Event, Recorder};
    use crate::load::load_constraint;
    use crate::restart::FixedPeriodRestarts;

    #[test]
    fn restarts_and_cleans_on_schedule() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        let recorder = Recorder::default();
        ctx.part_mut(ListenerP).set(Box::new(recorder.clone()));

        let schedule = ctx.part_mut(ScheduleP);
        schedule.set_restart_policy(Box::new(FixedPeriodRestarts::new(2)));
        schedule.set_deletion_policy(Box::new(ActivityDeletion::new(3)));

        for clause in pigeon_hole(4).iter() {
            load_constraint(ctx.borrow(), &LinearConstraint::clause(clause)).unwrap();
        }

        while schedule_step(ctx.borrow()) {}

        assert_eq!(ctx.part(SolverStateP).sat_state, SatState::Unsat);

        let stats = *ctx.part(StatsP);
        assert!(stats.conflicts > 6);
        assert!(stats.restarts >= 2);
        assert!(stats.reductions >= 1);

        let events = recorder.events();
        let restarts = events.iter().filter(|&event| event == &Event::Restart).count();
        let cleans = events.iter().filter(|&event| event == &Event::Clean).count();
        assert_eq!(restarts as u64, stats.restarts);
        assert_eq!(cleans as u64, stats.reductions);
    }

    #[test]
    fn conflict_limit_interrupts() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        for clause in pigeon_hole(6).iter() {
            load_constraint(ctx.borrow(), &LinearConstraint::clause(clause)).unwrap();
        }

        ctx.part_mut(ScheduleP)
            .start(SolveLimits::with_conflicts(5), 0);

        while schedule_step(ctx.borrow()) {}

        assert_eq!(ctx.part(SolverStateP).sat_state, SatState::Interrupted);
        assert_eq!(ctx.part(StatsP).conflicts, 5);
    }

    #[test]
    fn control_requests() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        for clause in pigeon_hole(5).iter() {
            load_constraint(ctx.borrow(), &LinearConstraint::clause(clause)).unwrap();
        }

        let control = ctx.part(ScheduleP).control().clone();
        control.request_restart();
        control.request_clean();

        assert!(schedule_step(ctx.borrow()));
        assert_eq!(ctx.part(StatsP).restarts, 1);
        assert_eq!(ctx.part(StatsP).reductions, 1);

        control.cancel();
        assert!(!schedule_step(ctx.borrow()));
        assert_eq!(ctx.part(SolverStateP).sat_state, SatState::Interrupted);
        assert!(!control.is_cancelled());
    }
}
