//! Budgets, timers and the governor that issues them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The timed operations an agent goes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BudgetKind {
    Construction,
    Decision,
    Teardown,
}

impl fmt::Display for BudgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BudgetKind::Construction => "construction",
            BudgetKind::Decision => "decision",
            BudgetKind::Teardown => "teardown",
        };
        f.write_str(name)
    }
}

/// Immutable time allowance for one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeBudget(Duration);

/// Budget for building an agent.
pub const DEFAULT_CONSTRUCTION_BUDGET: TimeBudget = TimeBudget::from_millis(1000);

/// Budget for a single `act` call.
pub const DEFAULT_DECISION_BUDGET: TimeBudget = TimeBudget::from_millis(40);

/// Budget for the end-of-game `result` hook.
pub const DEFAULT_TEARDOWN_BUDGET: TimeBudget = TimeBudget::from_millis(500);

impl TimeBudget {
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    #[must_use]
    pub const fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }

    #[must_use]
    pub const fn duration(self) -> Duration {
        self.0
    }

    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0.as_millis() as u64
    }

    /// Start a fresh timer against this budget.
    #[must_use]
    pub fn start(self) -> Timer {
        Timer {
            started: Instant::now(),
            budget: self.0,
        }
    }
}

/// Running clock for one timed call.
///
/// Timers are never reset; every call gets its own. Agents receive a clone
/// so they can pace themselves, and the harness keeps the original.
#[derive(Clone, Debug)]
pub struct Timer {
    started: Instant,
    budget: Duration,
}

impl Timer {
    #[must_use]
    pub fn budget(&self) -> Duration {
        self.budget
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    #[must_use]
    pub fn elapsed_millis(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    /// Time until the deadline in nanoseconds, negative once it has passed.
    #[must_use]
    pub fn remaining_nanos(&self) -> i128 {
        self.budget.as_nanos() as i128 - self.elapsed().as_nanos() as i128
    }

    /// Time until the deadline in milliseconds, negative once it has passed.
    #[must_use]
    pub fn remaining_millis(&self) -> i64 {
        (self.remaining_nanos() / 1_000_000) as i64
    }

    /// Time until the deadline, zero once it has passed.
    #[must_use]
    pub fn time_left(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }

    #[must_use]
    pub fn exceeded(&self) -> bool {
        self.elapsed() > self.budget
    }
}

/// Issues timers for the three budgets of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Governor {
    construction: TimeBudget,
    decision: TimeBudget,
    teardown: TimeBudget,
}

impl Default for Governor {
    fn default() -> Self {
        Self::new(
            DEFAULT_CONSTRUCTION_BUDGET,
            DEFAULT_DECISION_BUDGET,
            DEFAULT_TEARDOWN_BUDGET,
        )
    }
}

impl Governor {
    #[must_use]
    pub fn new(construction: TimeBudget, decision: TimeBudget, teardown: TimeBudget) -> Self {
        Self {
            construction,
            decision,
            teardown,
        }
    }

    #[must_use]
    pub fn budget(&self, kind: BudgetKind) -> TimeBudget {
        match kind {
            BudgetKind::Construction => self.construction,
            BudgetKind::Decision => self.decision,
            BudgetKind::Teardown => self.teardown,
        }
    }

    #[must_use]
    pub fn construction(&self) -> TimeBudget {
        self.construction
    }

    #[must_use]
    pub fn decision(&self) -> TimeBudget {
        self.decision
    }

    #[must_use]
    pub fn teardown(&self) -> TimeBudget {
        self.teardown
    }

    /// Fresh timer for a `kind` call.
    #[must_use]
    pub fn start(&self, kind: BudgetKind) -> Timer {
        self.budget(kind).start()
    }
}

/// Advisory stop flag shared between the harness and a running agent call.
///
/// Cancelling does not interrupt anything by itself. Script agents poll it
/// from the interpreter's progress hook; native agents may check it.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_budget_constants_are_distinct() {
        assert_ne!(DEFAULT_CONSTRUCTION_BUDGET, DEFAULT_DECISION_BUDGET);
        assert_ne!(DEFAULT_DECISION_BUDGET, DEFAULT_TEARDOWN_BUDGET);
        assert_eq!(DEFAULT_DECISION_BUDGET.as_millis(), 40);
    }

    #[test]
    fn test_fresh_timer_within_budget() {
        let timer = TimeBudget::from_millis(5_000).start();
        assert!(!timer.exceeded());
        assert!(timer.remaining_millis() > 0);
        assert!(timer.time_left() <= Duration::from_millis(5_000));
    }

    #[test]
    fn test_remaining_goes_negative() {
        let timer = TimeBudget::from_millis(1).start();
        thread::sleep(Duration::from_millis(15));
        assert!(timer.exceeded());
        assert!(timer.remaining_nanos() < 0);
        assert!(timer.remaining_millis() <= -10);
        assert_eq!(timer.time_left(), Duration::ZERO);
    }

    #[test]
    fn test_governor_picks_budget_by_kind() {
        let governor = Governor::new(
            TimeBudget::from_millis(100),
            TimeBudget::from_millis(10),
            TimeBudget::from_millis(50),
        );
        assert_eq!(governor.start(BudgetKind::Construction).budget(), Duration::from_millis(100));
        assert_eq!(governor.start(BudgetKind::Decision).budget(), Duration::from_millis(10));
        assert_eq!(governor.start(BudgetKind::Teardown).budget(), Duration::from_millis(50));
    }

    #[test]
    fn test_timers_are_independent() {
        let governor = Governor::default();
        let first = governor.start(BudgetKind::Decision);
        thread::sleep(Duration::from_millis(5));
        let second = governor.start(BudgetKind::Decision);
        assert!(first.elapsed() > second.elapsed());
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let seen_by_worker = token.clone();
        assert!(!seen_by_worker.is_cancelled());
        token.cancel();
        assert!(seen_by_worker.is_cancelled());
    }
}
