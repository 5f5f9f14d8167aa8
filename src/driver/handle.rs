//! Participant handles.

use crate::agents::AgentFactory;
use crate::core::{Action, PlayerId, TimeoutPolicy};
use crate::game::Observation;
use crate::plugin::PluginFactory;
use crate::session::{AgentSession, Controller, DisqualifyReason};
use crate::timing::Governor;

/// One participant: its slot, its session and the actions it played.
#[derive(Debug)]
pub struct AgentHandle {
    session: AgentSession,
    actions: Vec<Action>,
}

impl AgentHandle {
    fn from_session(session: AgentSession) -> Self {
        Self {
            session,
            actions: Vec::new(),
        }
    }

    /// Slot driven by a resolved script plugin.
    pub fn plugin(player: PlayerId, factory: PluginFactory) -> Self {
        Self::from_session(AgentSession::new(player, Controller::Plugin, Box::new(factory)))
    }

    /// Slot driven by a native agent.
    pub fn builtin(player: PlayerId, factory: impl AgentFactory + 'static) -> Self {
        Self::from_session(AgentSession::new(player, Controller::BuiltIn, Box::new(factory)))
    }

    pub fn boxed(player: PlayerId, controller: Controller, factory: Box<dyn AgentFactory>) -> Self {
        Self::from_session(AgentSession::new(player, controller, factory))
    }

    #[must_use]
    pub fn human(player: PlayerId) -> Self {
        Self::from_session(AgentSession::human(player))
    }

    #[must_use]
    pub fn replay(player: PlayerId, actions: Vec<Action>) -> Self {
        Self::from_session(AgentSession::replay(player, actions))
    }

    /// Slot lost before the game started, e.g. to a contract mismatch.
    pub fn forfeited(player: PlayerId, name: impl Into<String>, reason: DisqualifyReason) -> Self {
        Self::from_session(AgentSession::forfeited(player, name, reason))
    }

    #[must_use]
    pub fn player(&self) -> PlayerId {
        self.session.player()
    }

    #[must_use]
    pub fn controller(&self) -> Controller {
        self.session.controller()
    }

    #[must_use]
    pub fn is_human(&self) -> bool {
        self.controller() == Controller::Human
    }

    #[must_use]
    pub fn session(&self) -> &AgentSession {
        &self.session
    }

    pub(crate) fn session_mut(&mut self) -> &mut AgentSession {
        &mut self.session
    }

    /// Effective actions, one per tick played.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Decide and log this tick's action.
    pub(crate) fn decide(
        &mut self,
        obs: &Observation,
        governor: &Governor,
        policy: TimeoutPolicy,
    ) -> Action {
        let action = self.session.decide(obs, governor, policy);
        self.actions.push(action);
        action
    }

    pub(crate) fn into_parts(self) -> (AgentSession, Vec<Action>) {
        (self.session, self.actions)
    }
}
