//! Isolated plugin namespaces.
//!
//! Each [`IsolatedLoader::load`] call produces a new [`Namespace`] that owns
//! its units outright. Nothing is cached between loads, so two games that
//! load the same identifier, or a reload of edited source, never see each
//! other's definitions.
//!
//! Instances are isolated one level further down. Every agent constructed
//! from a unit gets its own interpreter, its own scope and its own `this`
//! object, so two agents built from one unit share no mutable state.

use rhai::{CallFnOptions, Dynamic, Engine, Map, Scope, AST, INT};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::agents::{Agent, AgentFactory, AgentFault};
use crate::core::{Action, HarnessError, Result};
use crate::game::Observation;
use crate::timing::{CancelToken, Timer};

use super::api::{action_from_dynamic, register_api};
use super::compiler::CompiledUnit;

static NEXT_NAMESPACE: AtomicU64 = AtomicU64::new(1);

/// Entry-point signatures a plugin must define.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contract {
    /// `fn init(obs, timer)` and `fn act(obs, timer)`.
    SingleAgent,
    /// `fn init(obs, timer, player)` and `fn act(obs, timer)`.
    MultiAgent,
}

impl Contract {
    #[must_use]
    pub fn for_player_count(player_count: usize) -> Self {
        if player_count > 1 {
            Contract::MultiAgent
        } else {
            Contract::SingleAgent
        }
    }

    fn init_signature(self) -> (&'static str, usize) {
        match self {
            Contract::SingleAgent => ("fn init(obs, timer)", 2),
            Contract::MultiAgent => ("fn init(obs, timer, player)", 3),
        }
    }
}

/// A compiled unit owned by exactly one namespace.
#[derive(Debug)]
pub struct PluginUnit {
    identifier: String,
    ast: AST,
    digest: u64,
    namespace: u64,
}

impl PluginUnit {
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[must_use]
    pub fn digest(&self) -> u64 {
        self.digest
    }

    /// Id of the namespace holding this unit.
    #[must_use]
    pub fn namespace(&self) -> u64 {
        self.namespace
    }

    fn arities(&self, name: &str) -> Vec<usize> {
        self.ast
            .iter_functions()
            .filter(|f| f.name == name)
            .map(|f| f.params.len())
            .collect()
    }
}

/// Private set of loaded plugin units.
#[derive(Debug)]
pub struct Namespace {
    id: u64,
    units: FxHashMap<String, Arc<PluginUnit>>,
}

impl Namespace {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.units.contains_key(identifier)
    }

    /// Bind `identifier` to the agent capability under `contract`.
    ///
    /// Fails with `ContractMismatch` if the unit is absent or its entry
    /// points do not match. Resolving the same unit twice is fine; each
    /// factory builds fully separate instances.
    pub fn resolve(&self, identifier: &str, contract: Contract) -> Result<PluginFactory> {
        let unit = self
            .units
            .get(identifier)
            .ok_or_else(|| mismatch(identifier, format!("not loaded in namespace {}", self.id)))?;

        let (init_sig, init_arity) = contract.init_signature();
        if !unit.arities("init").contains(&init_arity) {
            return Err(mismatch(identifier, format!("missing `{init_sig}`")));
        }
        if !unit.arities("act").contains(&2) {
            return Err(mismatch(identifier, "missing `fn act(obs, timer)`"));
        }
        let result_arities = unit.arities("result");
        if !result_arities.is_empty() && !result_arities.contains(&2) {
            return Err(mismatch(identifier, "`result` must take (obs, timer)"));
        }

        debug!(plugin = identifier, namespace = self.id, ?contract, "resolved plugin");
        Ok(PluginFactory {
            unit: Arc::clone(unit),
            contract,
            has_result: !result_arities.is_empty(),
        })
    }
}

fn mismatch(identifier: &str, reason: impl Into<String>) -> HarnessError {
    HarnessError::ContractMismatch {
        identifier: identifier.to_string(),
        reason: reason.into(),
    }
}

/// Creates namespaces.
#[derive(Clone, Copy, Debug, Default)]
pub struct IsolatedLoader;

impl IsolatedLoader {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Load `units` into a brand-new namespace.
    ///
    /// A unit may appear only once per namespace: a second unit with an
    /// identifier already present is rejected rather than replacing it.
    pub fn load(&self, units: impl IntoIterator<Item = CompiledUnit>) -> Result<Namespace> {
        let id = NEXT_NAMESPACE.fetch_add(1, Ordering::Relaxed);
        let mut namespace = Namespace {
            id,
            units: FxHashMap::default(),
        };

        for unit in units {
            let (identifier, ast, digest) = unit.into_parts();
            if namespace.units.contains_key(&identifier) {
                return Err(HarnessError::Config(format!(
                    "plugin `{identifier}` already loaded in namespace {id}"
                )));
            }
            let unit = PluginUnit {
                identifier: identifier.clone(),
                ast,
                digest,
                namespace: id,
            };
            namespace.units.insert(identifier, Arc::new(unit));
        }

        info!(namespace = id, units = namespace.len(), "loaded plugin namespace");
        Ok(namespace)
    }
}

/// Agent factory for a resolved script plugin.
#[derive(Clone, Debug)]
pub struct PluginFactory {
    unit: Arc<PluginUnit>,
    contract: Contract,
    has_result: bool,
}

impl PluginFactory {
    #[must_use]
    pub fn unit(&self) -> &PluginUnit {
        &self.unit
    }

    #[must_use]
    pub fn contract(&self) -> Contract {
        self.contract
    }

    fn engine(cancel: &CancelToken) -> Engine {
        let mut engine = Engine::new();
        register_api(&mut engine);
        let cancel = cancel.clone();
        engine.on_progress(move |_ops| {
            if cancel.is_cancelled() {
                Some(Dynamic::UNIT)
            } else {
                None
            }
        });
        engine
    }
}

impl AgentFactory for PluginFactory {
    fn name(&self) -> &str {
        &self.unit.identifier
    }

    fn construct(
        &self,
        obs: &Observation,
        timer: &Timer,
        cancel: &CancelToken,
    ) -> std::result::Result<Box<dyn Agent>, AgentFault> {
        let engine = Self::engine(cancel);
        let mut scope = Scope::new();
        let mut state = Dynamic::from_map(Map::new());

        // Top-level statements run once per instance, into its own scope.
        let options = CallFnOptions::new()
            .eval_ast(true)
            .rewind_scope(false)
            .bind_this_ptr(&mut state);
        let ast = &self.unit.ast;
        let constructed = match self.contract {
            Contract::SingleAgent => engine.call_fn_with_options::<Dynamic>(
                options,
                &mut scope,
                ast,
                "init",
                (obs.clone(), timer.clone()),
            ),
            Contract::MultiAgent => engine.call_fn_with_options::<Dynamic>(
                options,
                &mut scope,
                ast,
                "init",
                (obs.clone(), timer.clone(), obs.player.index() as INT),
            ),
        };
        constructed.map_err(|e| AgentFault::new(format!("init: {e}")))?;

        Ok(Box::new(ScriptAgent {
            engine,
            scope,
            state,
            unit: Arc::clone(&self.unit),
            has_result: self.has_result,
        }))
    }
}

/// One live instance of a script plugin.
struct ScriptAgent {
    engine: Engine,
    scope: Scope<'static>,
    state: Dynamic,
    unit: Arc<PluginUnit>,
    has_result: bool,
}

impl ScriptAgent {
    fn call(&mut self, name: &str, obs: &Observation, timer: &Timer) -> std::result::Result<Dynamic, AgentFault> {
        let options = CallFnOptions::new()
            .eval_ast(false)
            .rewind_scope(true)
            .bind_this_ptr(&mut self.state);
        self.engine
            .call_fn_with_options::<Dynamic>(
                options,
                &mut self.scope,
                &self.unit.ast,
                name,
                (obs.clone(), timer.clone()),
            )
            .map_err(|e| AgentFault::new(format!("{name}: {e}")))
    }
}

impl Agent for ScriptAgent {
    fn act(&mut self, obs: &Observation, timer: &Timer) -> std::result::Result<Action, AgentFault> {
        let value = self.call("act", obs, timer)?;
        action_from_dynamic(&value, obs).map_err(AgentFault)
    }

    fn result(&mut self, obs: &Observation, timer: &Timer) -> std::result::Result<(), AgentFault> {
        if self.has_result {
            self.call("result", obs, timer)?;
        }
        Ok(())
    }
}
