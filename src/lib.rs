//! # rust-arcade
//!
//! A harness that runs untrusted game-playing agents under wall-clock
//! budgets, records every game it plays and proves a recording by replaying
//! it.
//!
//! ## Design Principles
//!
//! 1. **Budgets are enforced, not advised**: construction, every decision
//!    and teardown each get a fresh timer. An agent that overruns or fails
//!    is disqualified and its slot plays the default action from then on.
//!    The game itself always runs to the end.
//!
//! 2. **N-Player First**: every API takes the player count from the game.
//!    Single- and multi-agent games differ only in the plugin contract and
//!    the trace layout.
//!
//! 3. **Deterministic replay**: a trace is a seed plus the actions that
//!    were actually applied. Replaying it must reproduce the tick count,
//!    every win flag and every score exactly.
//!
//! ## Architecture
//!
//! - **Worker threads per agent**: agent code never runs on the driver
//!   thread, so a hung agent costs at most one budget.
//!
//! - **Isolated plugins**: script plugins are compiled once and loaded into
//!   a fresh namespace per game. Every agent gets its own engine and scope.
//!
//! - **Persistent Data Structures**: the bundled game clones in O(1) via
//!   `im-rs`, which keeps warm-up probing cheap.
//!
//! ## Modules
//!
//! - `core`: players, actions, RNG, configuration, errors
//! - `timing`: budgets, timers, cancellation
//! - `game`: the `Game` trait and observations
//! - `agents`: the agent capability and built-in agents
//! - `plugin`: script compilation and isolated loading
//! - `session`: per-slot agent lifecycle and disqualification
//! - `driver`: the tick loop and warm-up
//! - `replay`: traces, recording and verification
//! - `arcade`: end-to-end runs
//! - `games`: bundled games

pub mod agents;
pub mod arcade;
pub mod core;
pub mod driver;
pub mod game;
pub mod games;
pub mod observability;
pub mod plugin;
pub mod replay;
pub mod session;
pub mod timing;

// Re-export commonly used types
pub use crate::core::{
    Action, ActionSet, UnknownAction,
    PlayerId, PlayerMap,
    GameRng,
    HarnessConfig, BudgetConfig, WarmupConfig, DriverConfig, TimeoutPolicy,
    HarnessError, Result,
};

pub use crate::timing::{BudgetKind, CancelToken, Governor, TimeBudget, Timer};

pub use crate::game::{Game, Observation, Winner};

pub use crate::agents::{fn_agent, Agent, AgentFactory, AgentFault, IndexAgent, RandomAgent};

pub use crate::plugin::{CompiledUnit, Contract, Diagnostic, IsolatedLoader, Namespace, PluginCompiler, PluginFactory};

pub use crate::session::{AgentSession, Controller, DisqualifyReason, SessionStatus, TeardownOutcome};

pub use crate::driver::{AgentHandle, GameDriver, PlayerOutcome, RunOutcome, WarmupScheduler, WarmupStats, WarmupStop};

pub use crate::replay::{ActionRecord, RecordedResult, ReplayRecorder, ReplayVerifier};

pub use crate::arcade::{Arcade, ControllerSpec, GameReport};

pub use crate::observability::init_tracing;
