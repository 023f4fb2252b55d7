//! Limits and remote control of a running search.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Resource limits for a single solve call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SolveLimits {
    /// Wall clock time after which the search gives up.
    pub timeout: Option<Duration>,
    /// Number of conflicts after which the search gives up.
    pub conflicts: Option<u64>,
}

impl SolveLimits {
    pub fn unlimited() -> SolveLimits {
        SolveLimits::default()
    }

    pub fn with_timeout(timeout: Duration) -> SolveLimits {
        SolveLimits {
            timeout: Some(timeout),
            conflicts: None,
        }
    }

    pub fn with_conflicts(conflicts: u64) -> SolveLimits {
        SolveLimits {
            timeout: None,
            conflicts: Some(conflicts),
        }
    }
}

#[derive(Debug, Default)]
struct Requests {
    cancel: AtomicBool,
    restart: AtomicBool,
    clean: AtomicBool,
}

/// Handle to steer a solver from another thread.
///
/// Requests are polled by the search between propagation and decisions, so they take effect after
/// a short delay. Each request is consumed by the search when acted upon: a cancellation stops the
/// running solve call, or the next one when no search is running.
#[derive(Clone, Debug, Default)]
pub struct SolverControl {
    requests: Arc<Requests>,
}

impl SolverControl {
    pub fn new() -> SolverControl {
        SolverControl::default()
    }

    /// Stop the search, which then reports an unknown outcome.
    pub fn cancel(&self) {
        self.requests.cancel.store(true, Ordering::Relaxed);
    }

    /// Restart the search at the next opportunity.
    pub fn request_restart(&self) {
        self.requests.restart.store(true, Ordering::Relaxed);
    }

    /// Reduce the learnt constraint database at the next opportunity.
    pub fn request_clean(&self) {
        self.requests.clean.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.requests.cancel.load(Ordering::Relaxed)
    }

    pub(crate) fn take_cancel(&self) -> bool {
        self.requests.cancel.swap(false, Ordering::Relaxed)
    }

    pub(crate) fn take_restart(&self) -> bool {
        self.requests.restart.swap(false, Ordering::Relaxed)
    }

    pub(crate) fn take_clean(&self) -> bool {
        self.requests.clean.swap(false, Ordering::Relaxed)
    }
}

/// Limits of the running solve call converted to absolute values.
#[derive(Copy, Clone, Debug, Default)]
pub struct ActiveLimits {
    deadline: Option<Instant>,
    conflict_limit: Option<u64>,
}

impl ActiveLimits {
    /// Start counting `limits` from now and from the given conflict count.
    ///
    /// A timeout too large to represent as a point in time imposes no deadline.
    pub fn start(limits: SolveLimits, conflicts: u64) -> ActiveLimits {
        ActiveLimits {
            deadline: limits
                .timeout
                .and_then(|timeout| Instant::now().checked_add(timeout)),
            conflict_limit: limits
                .conflicts
                .map(|limit| conflicts.saturating_add(limit)),
        }
    }

    /// Whether the given conflict count or the current time exceed the limits.
    pub fn exceeded(&self, conflicts: u64) -> bool {
        if let Some(limit) = self.conflict_limit {
            if conflicts >= limit {
                return true;
            }
        }
        match self.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_are_consumed() {
        let control = SolverControl::new();
        let remote = control.clone();

        remote.request_restart();
        assert!(control.take_restart());
        assert!(!control.take_restart());

        assert!(!control.is_cancelled());
        remote.cancel();
        assert!(control.is_cancelled());
        assert!(control.take_cancel());
        assert!(!control.is_cancelled());

        assert!(!control.take_clean());
    }

    #[test]
    fn conflict_limit() {
        let limits = ActiveLimits::start(SolveLimits::with_conflicts(10), 5);
        assert!(!limits.exceeded(14));
        assert!(limits.exceeded(15));
        assert!(!ActiveLimits::default().exceeded(u64::max_value()));
    }

    #[test]
    fn expired_deadline() {
        let limits = ActiveLimits::start(SolveLimits::with_timeout(Duration::from_secs(0)), 0);
        assert!(limits.exceeded(0));
    }

    #[test]
    fn huge_timeout_has_no_deadline() {
        let huge = Duration::from_secs(u64::max_value());
        let limits = ActiveLimits::start(SolveLimits::with_timeout(huge), 0);
        assert!(limits.deadline.is_none());
        assert!(!limits.exceeded(u64::max_value()));

        let limits = ActiveLimits::start(
            SolveLimits {
                timeout: Some(Duration::new(u64::max_value(), 999_999_999)),
                conflicts: Some(3),
            },
            0,
        );
        assert!(!limits.exceeded(2));
        assert!(limits.exceeded(3));
    }
}
