//! Native agents shipped with the harness.

use crate::core::{Action, GameRng};
use crate::game::Observation;
use crate::timing::{CancelToken, Timer};

use super::{Agent, AgentFactory, AgentFault};

/// Always plays the legal action at a fixed index, falling back to
/// `ACTION_NIL` when there are fewer actions than that.
#[derive(Clone, Debug)]
pub struct IndexAgent {
    index: usize,
}

impl IndexAgent {
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self { index }
    }
}

impl Agent for IndexAgent {
    fn act(&mut self, obs: &Observation, _timer: &Timer) -> Result<Action, AgentFault> {
        Ok(obs.action_at(self.index).unwrap_or_default())
    }
}

impl AgentFactory for IndexAgent {
    fn name(&self) -> &str {
        "builtin.index"
    }

    fn construct(
        &self,
        _obs: &Observation,
        _timer: &Timer,
        _cancel: &CancelToken,
    ) -> Result<Box<dyn Agent>, AgentFault> {
        Ok(Box::new(self.clone()))
    }
}

/// Uniformly random legal actions from a seeded stream.
///
/// Each slot draws from its own context stream, so two random agents built
/// from the same seed still play differently.
#[derive(Clone, Debug)]
pub struct RandomAgent {
    seed: u64,
    rng: Option<GameRng>,
}

impl RandomAgent {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { seed, rng: None }
    }
}

impl Agent for RandomAgent {
    fn act(&mut self, obs: &Observation, _timer: &Timer) -> Result<Action, AgentFault> {
        let seed = self.seed;
        let rng = self
            .rng
            .get_or_insert_with(|| GameRng::new(seed).for_context(&obs.player.to_string()));
        Ok(rng.choose(&obs.available_actions).copied().unwrap_or_default())
    }
}

impl AgentFactory for RandomAgent {
    fn name(&self) -> &str {
        "builtin.random"
    }

    fn construct(
        &self,
        _obs: &Observation,
        _timer: &Timer,
        _cancel: &CancelToken,
    ) -> Result<Box<dyn Agent>, AgentFault> {
        Ok(Box::new(RandomAgent::new(self.seed)))
    }
}

/// Agent backed by a closure. Each construction clones the closure, so
/// captured state is per slot.
#[derive(Clone)]
pub struct FnAgent<F> {
    name: String,
    decide: F,
}

/// Wrap `decide` as an agent factory.
pub fn fn_agent<F>(name: impl Into<String>, decide: F) -> FnAgent<F>
where
    F: FnMut(&Observation, &Timer) -> Result<Action, AgentFault> + Clone + Send + 'static,
{
    FnAgent {
        name: name.into(),
        decide,
    }
}

impl<F> Agent for FnAgent<F>
where
    F: FnMut(&Observation, &Timer) -> Result<Action, AgentFault>,
{
    fn act(&mut self, obs: &Observation, timer: &Timer) -> Result<Action, AgentFault> {
        (self.decide)(obs, timer)
    }
}

impl<F> AgentFactory for FnAgent<F>
where
    F: FnMut(&Observation, &Timer) -> Result<Action, AgentFault> + Clone + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn construct(
        &self,
        _obs: &Observation,
        _timer: &Timer,
        _cancel: &CancelToken,
    ) -> Result<Box<dyn Agent>, AgentFault> {
        Ok(Box::new(self.clone()))
    }
}
