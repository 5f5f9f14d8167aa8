//! Shared building blocks: player slots, actions, seeded RNG, configuration
//! and the error type.
//!
//! Nothing here knows about plugins or games; the rest of the crate builds
//! on these.

pub mod action;
pub mod config;
pub mod error;
pub mod player;
pub mod rng;

pub use action::{Action, ActionSet, UnknownAction};
pub use config::{BudgetConfig, DriverConfig, HarnessConfig, TimeoutPolicy, WarmupConfig};
pub use error::{HarnessError, Result};
pub use player::{check_player_count, PlayerId, PlayerMap, MAX_PLAYERS};
pub use rng::GameRng;
