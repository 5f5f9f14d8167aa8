//! Game orchestration.
//!
//! - `handle`: [`AgentHandle`], one per player slot
//! - `game_driver`: [`GameDriver`], the per-tick decision loop, and [`GameSession`]
//! - `warmup`: [`WarmupScheduler`], run before the first timed call

pub mod game_driver;
pub mod handle;
pub mod warmup;

pub use game_driver::{GameDriver, GameSession, PlayerOutcome, RunOutcome, Standing};
pub use handle::AgentHandle;
pub use warmup::{WarmupScheduler, WarmupStats, WarmupStop};
