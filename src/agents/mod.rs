//! The agent capability and the built-in agents.
//!
//! Everything above the plugin boundary talks to agents through two traits:
//!
//! - [`AgentFactory`]: builds an agent for one slot from the first
//!   observation. Script plugins reach the harness as a factory produced
//!   by the loader; native Rust agents implement it directly.
//! - [`Agent`]: picks an action each tick and optionally hears the final
//!   result.
//!
//! The session runs both on the agent's own worker thread, so neither
//! needs to be thread-safe beyond `AgentFactory: Send`.

pub mod builtin;

pub use builtin::{fn_agent, FnAgent, IndexAgent, RandomAgent};

use thiserror::Error;

use crate::core::Action;
use crate::game::Observation;
use crate::timing::{CancelToken, Timer};

/// Error raised from inside agent code.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct AgentFault(pub String);

impl AgentFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A constructed agent bound to one player slot.
pub trait Agent {
    /// Choose this tick's action. `timer` is a copy of the harness timer.
    fn act(&mut self, obs: &Observation, timer: &Timer) -> Result<Action, AgentFault>;

    /// End-of-game hook.
    fn result(&mut self, _obs: &Observation, _timer: &Timer) -> Result<(), AgentFault> {
        Ok(())
    }
}

/// Builds agents.
pub trait AgentFactory: Send {
    /// Name used in logs and reports.
    fn name(&self) -> &str;

    /// Build the agent for `obs.player`. `cancel` is raised once the
    /// harness has given up on the current call.
    fn construct(
        &self,
        obs: &Observation,
        timer: &Timer,
        cancel: &CancelToken,
    ) -> Result<Box<dyn Agent>, AgentFault>;
}
