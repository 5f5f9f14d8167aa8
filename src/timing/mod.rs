//! Wall-clock budget enforcement.
//!
//! Every timed agent call (construction, each decision, teardown) gets a
//! fresh [`Timer`] from the [`Governor`]. Timers only report. Deciding what
//! an overrun costs is up to the caller, normally the agent session.
//!
//! Timing is wall-clock on every platform.

pub mod budget;

pub use budget::{
    BudgetKind, CancelToken, Governor, TimeBudget, Timer, DEFAULT_CONSTRUCTION_BUDGET,
    DEFAULT_DECISION_BUDGET, DEFAULT_TEARDOWN_BUDGET,
};
