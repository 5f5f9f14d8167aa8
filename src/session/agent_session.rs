//! Per-agent lifecycle under time budgets.

use std::fmt;
use std::mem;
use tracing::{debug, warn};

use crate::agents::AgentFactory;
use crate::core::{Action, HarnessError, PlayerId, TimeoutPolicy};
use crate::game::Observation;
use crate::timing::{BudgetKind, Governor};

use super::worker::{AgentWorker, CallOutcome};

/// Why a slot was forfeited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisqualifyReason {
    /// The plugin never satisfied the entry-point contract.
    ContractMismatch(String),
    ConstructionTimeout { elapsed_ms: u64, budget_ms: u64 },
    ConstructionFault(String),
    DecisionTimeout { tick: u32, elapsed_ms: u64, budget_ms: u64 },
    DecisionFault { tick: u32, message: String },
}

impl DisqualifyReason {
    /// The same reason as a harness error for `player`.
    #[must_use]
    pub fn to_error(&self, player: PlayerId, name: &str) -> HarnessError {
        match self.clone() {
            DisqualifyReason::ContractMismatch(reason) => HarnessError::ContractMismatch {
                identifier: name.to_string(),
                reason,
            },
            DisqualifyReason::ConstructionTimeout { elapsed_ms, budget_ms } => {
                HarnessError::ConstructionTimeout {
                    player,
                    elapsed_ms,
                    budget_ms,
                }
            }
            DisqualifyReason::ConstructionFault(message) => HarnessError::AgentFault {
                player,
                phase: BudgetKind::Construction,
                message,
            },
            DisqualifyReason::DecisionTimeout {
                tick,
                elapsed_ms,
                budget_ms,
            } => HarnessError::DecisionTimeout {
                player,
                tick,
                elapsed_ms,
                budget_ms,
            },
            DisqualifyReason::DecisionFault { message, .. } => HarnessError::AgentFault {
                player,
                phase: BudgetKind::Decision,
                message,
            },
        }
    }
}

impl fmt::Display for DisqualifyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisqualifyReason::ContractMismatch(reason) => write!(f, "contract mismatch: {reason}"),
            DisqualifyReason::ConstructionTimeout { elapsed_ms, budget_ms } => {
                write!(f, "construction took {elapsed_ms} ms (limit {budget_ms} ms)")
            }
            DisqualifyReason::ConstructionFault(message) => write!(f, "construction failed: {message}"),
            DisqualifyReason::DecisionTimeout {
                tick,
                elapsed_ms,
                budget_ms,
            } => write!(f, "decision at tick {tick} took {elapsed_ms} ms (limit {budget_ms} ms)"),
            DisqualifyReason::DecisionFault { tick, message } => {
                write!(f, "decision at tick {tick} failed: {message}")
            }
        }
    }
}

/// Lifecycle state. Moves only forward:
/// `Uninitialized -> Active -> {Disqualified | Finished}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Uninitialized,
    Active,
    Disqualified(DisqualifyReason),
    Finished,
}

/// How the end-of-game hook went.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TeardownOutcome {
    Completed,
    TimedOut { elapsed_ms: u64, budget_ms: u64 },
    Faulted(String),
    /// No live agent to call.
    Skipped,
}

impl TeardownOutcome {
    /// The outcome as an error, if it was one.
    #[must_use]
    pub fn to_error(&self, player: PlayerId) -> Option<HarnessError> {
        match self {
            TeardownOutcome::TimedOut { elapsed_ms, budget_ms } => Some(HarnessError::TeardownTimeout {
                player,
                elapsed_ms: *elapsed_ms,
                budget_ms: *budget_ms,
            }),
            TeardownOutcome::Faulted(message) => Some(HarnessError::AgentFault {
                player,
                phase: BudgetKind::Teardown,
                message: message.clone(),
            }),
            TeardownOutcome::Completed | TeardownOutcome::Skipped => None,
        }
    }
}

/// What kind of controller drives a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Controller {
    Plugin,
    BuiltIn,
    Human,
    Replay,
}

enum Backend {
    Pending(Box<dyn AgentFactory>),
    Worker(AgentWorker),
    Human,
    Replay(std::vec::IntoIter<Action>),
    /// Never built, abandoned or exited.
    Gone,
}

/// One agent's lifecycle: construction, one decision per tick, teardown.
///
/// Every call is timed against a fresh timer from the governor. An overrun
/// or a fault in construction or a decision forfeits the slot for the rest
/// of the game. From then on the session answers with the policy default
/// without calling the agent.
pub struct AgentSession {
    player: PlayerId,
    name: String,
    controller: Controller,
    status: SessionStatus,
    backend: Backend,
    last_action: Option<Action>,
    teardown: Option<TeardownOutcome>,
}

impl AgentSession {
    /// Session for an agent built by `factory`.
    pub fn new(player: PlayerId, controller: Controller, factory: Box<dyn AgentFactory>) -> Self {
        Self {
            player,
            name: factory.name().to_string(),
            controller,
            status: SessionStatus::Uninitialized,
            backend: Backend::Pending(factory),
            last_action: None,
            teardown: None,
        }
    }

    /// Human slot: always plays the default action.
    #[must_use]
    pub fn human(player: PlayerId) -> Self {
        Self {
            player,
            name: "human".to_string(),
            controller: Controller::Human,
            status: SessionStatus::Uninitialized,
            backend: Backend::Human,
            last_action: None,
            teardown: None,
        }
    }

    /// Replay slot: plays back `actions` one per tick.
    #[must_use]
    pub fn replay(player: PlayerId, actions: Vec<Action>) -> Self {
        Self {
            player,
            name: "replay".to_string(),
            controller: Controller::Replay,
            status: SessionStatus::Uninitialized,
            backend: Backend::Replay(actions.into_iter()),
            last_action: None,
            teardown: None,
        }
    }

    /// Slot forfeited before construction.
    pub fn forfeited(player: PlayerId, name: impl Into<String>, reason: DisqualifyReason) -> Self {
        Self {
            player,
            name: name.into(),
            controller: Controller::Plugin,
            status: SessionStatus::Disqualified(reason),
            backend: Backend::Gone,
            last_action: None,
            teardown: None,
        }
    }

    #[must_use]
    pub fn player(&self) -> PlayerId {
        self.player
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn controller(&self) -> Controller {
        self.controller
    }

    #[must_use]
    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    #[must_use]
    pub fn disqualification(&self) -> Option<&DisqualifyReason> {
        match &self.status {
            SessionStatus::Disqualified(reason) => Some(reason),
            _ => None,
        }
    }

    /// Action substituted when the agent is not consulted.
    #[must_use]
    pub fn default_action(&self, policy: TimeoutPolicy) -> Action {
        match policy {
            TimeoutPolicy::NoOp => Action::Nil,
            TimeoutPolicy::RepeatLast => self.last_action.unwrap_or_default(),
        }
    }

    /// Build the agent under the construction budget.
    ///
    /// Only acts on an `Uninitialized` session.
    pub fn construct(&mut self, obs: &Observation, governor: &Governor) {
        if self.status != SessionStatus::Uninitialized {
            return;
        }

        match mem::replace(&mut self.backend, Backend::Gone) {
            Backend::Pending(factory) => {
                let worker = match AgentWorker::spawn(self.player, factory) {
                    Ok(worker) => worker,
                    Err(err) => {
                        self.disqualify(DisqualifyReason::ConstructionFault(format!(
                            "could not start worker: {err}"
                        )));
                        return;
                    }
                };

                let timer = governor.start(BudgetKind::Construction);
                match worker.construct(obs.clone(), &timer) {
                    CallOutcome::Replied(()) => {
                        debug!(player = %self.player, agent = %self.name, elapsed_ms = timer.elapsed_millis(), "agent constructed");
                        self.backend = Backend::Worker(worker);
                        self.status = SessionStatus::Active;
                    }
                    CallOutcome::Faulted(fault) => {
                        self.disqualify(DisqualifyReason::ConstructionFault(fault.0));
                    }
                    CallOutcome::TimedOut => {
                        worker.abandon();
                        self.disqualify(DisqualifyReason::ConstructionTimeout {
                            elapsed_ms: timer.elapsed_millis(),
                            budget_ms: governor.construction().as_millis(),
                        });
                    }
                    CallOutcome::Crashed => {
                        self.disqualify(DisqualifyReason::ConstructionFault("worker exited".into()));
                    }
                }
            }
            backend @ (Backend::Human | Backend::Replay(_)) => {
                self.backend = backend;
                self.status = SessionStatus::Active;
            }
            backend => self.backend = backend,
        }
    }

    /// This tick's effective action.
    ///
    /// Consults the agent only while `Active`. An overrun or fault
    /// disqualifies the session and yields the policy default for this tick.
    pub fn decide(
        &mut self,
        obs: &Observation,
        governor: &Governor,
        policy: TimeoutPolicy,
    ) -> Action {
        let default = self.default_action(policy);
        if !self.is_active() {
            return default;
        }

        let action = match mem::replace(&mut self.backend, Backend::Gone) {
            Backend::Worker(worker) => {
                let timer = governor.start(BudgetKind::Decision);
                match worker.act(obs.clone(), &timer) {
                    CallOutcome::Replied(action) => {
                        self.backend = Backend::Worker(worker);
                        action
                    }
                    CallOutcome::Faulted(fault) => {
                        self.backend = Backend::Worker(worker);
                        self.disqualify(DisqualifyReason::DecisionFault {
                            tick: obs.tick,
                            message: fault.0,
                        });
                        default
                    }
                    CallOutcome::TimedOut => {
                        worker.abandon();
                        self.disqualify(DisqualifyReason::DecisionTimeout {
                            tick: obs.tick,
                            elapsed_ms: timer.elapsed_millis(),
                            budget_ms: governor.decision().as_millis(),
                        });
                        default
                    }
                    CallOutcome::Crashed => {
                        self.disqualify(DisqualifyReason::DecisionFault {
                            tick: obs.tick,
                            message: "worker exited".into(),
                        });
                        default
                    }
                }
            }
            Backend::Replay(mut actions) => {
                let action = actions.next().unwrap_or_default();
                self.backend = Backend::Replay(actions);
                action
            }
            backend => {
                self.backend = backend;
                default
            }
        };

        self.last_action = Some(action);
        action
    }

    /// `Active -> Finished`. Other states are left alone.
    pub fn finish(&mut self) {
        if self.is_active() {
            self.status = SessionStatus::Finished;
        }
    }

    /// Run the end-of-game hook once, under the teardown budget.
    ///
    /// Later calls return the first outcome without calling the agent.
    /// Teardown never changes the session status.
    pub fn teardown(&mut self, obs: &Observation, governor: &Governor) -> TeardownOutcome {
        if let Some(outcome) = &self.teardown {
            return outcome.clone();
        }
        self.finish();

        let outcome = match mem::replace(&mut self.backend, Backend::Gone) {
            Backend::Worker(worker) => {
                let timer = governor.start(BudgetKind::Teardown);
                match worker.result(obs.clone(), &timer) {
                    CallOutcome::Replied(()) => TeardownOutcome::Completed,
                    CallOutcome::Faulted(fault) => TeardownOutcome::Faulted(fault.0),
                    CallOutcome::TimedOut => {
                        worker.abandon();
                        TeardownOutcome::TimedOut {
                            elapsed_ms: timer.elapsed_millis(),
                            budget_ms: governor.teardown().as_millis(),
                        }
                    }
                    CallOutcome::Crashed => TeardownOutcome::Faulted("worker exited".into()),
                }
            }
            _ => TeardownOutcome::Skipped,
        };

        match &outcome {
            TeardownOutcome::TimedOut { elapsed_ms, budget_ms } => {
                warn!(player = %self.player, agent = %self.name, elapsed_ms, budget_ms, "teardown overran its budget");
            }
            TeardownOutcome::Faulted(message) => {
                warn!(player = %self.player, agent = %self.name, %message, "teardown failed");
            }
            _ => {}
        }

        self.teardown = Some(outcome.clone());
        outcome
    }

    #[must_use]
    pub fn teardown_outcome(&self) -> Option<&TeardownOutcome> {
        self.teardown.as_ref()
    }

    fn disqualify(&mut self, reason: DisqualifyReason) {
        warn!(player = %self.player, agent = %self.name, %reason, "agent disqualified");
        self.status = SessionStatus::Disqualified(reason);
    }
}

impl fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSession")
            .field("player", &self.player)
            .field("name", &self.name)
            .field("controller", &self.controller)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
