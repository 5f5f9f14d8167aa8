//! Running whole games.

use rustc_hash::FxHashMap;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use crate::agents::AgentFactory;
use crate::core::{check_player_count, HarnessConfig, HarnessError, PlayerId, Result};
use crate::driver::{AgentHandle, GameDriver, RunOutcome, WarmupScheduler, WarmupStats};
use crate::game::Game;
use crate::plugin::{Contract, IsolatedLoader, PluginCompiler};
use crate::replay::{ActionRecord, ReplayVerifier};
use crate::session::{Controller, DisqualifyReason};

/// Who plays a slot.
pub enum ControllerSpec {
    /// Script plugin compiled for this game.
    Source { identifier: String, source: String },
    /// Native agent.
    Native(Box<dyn AgentFactory>),
    Human,
}

impl ControllerSpec {
    pub fn source(identifier: impl Into<String>, source: impl Into<String>) -> Self {
        ControllerSpec::Source {
            identifier: identifier.into(),
            source: source.into(),
        }
    }

    pub fn native(factory: impl AgentFactory + 'static) -> Self {
        ControllerSpec::Native(Box::new(factory))
    }
}

impl fmt::Debug for ControllerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerSpec::Source { identifier, .. } => write!(f, "Source({identifier})"),
            ControllerSpec::Native(factory) => write!(f, "Native({})", factory.name()),
            ControllerSpec::Human => f.write_str("Human"),
        }
    }
}

/// Everything a finished game produced.
#[derive(Clone, Debug)]
pub struct GameReport {
    pub outcome: RunOutcome,
    pub warmup: WarmupStats,
}

impl GameReport {
    /// Trace of the run.
    #[must_use]
    pub fn record(&self) -> Option<&ActionRecord> {
        self.outcome.record.as_ref()
    }

    /// Write the trace in the text format.
    pub fn save_trace(&self, path: impl AsRef<Path>) -> Result<()> {
        match self.record() {
            Some(record) => record.save(path),
            None => Err(HarnessError::Config("run was not recorded".into())),
        }
    }
}

/// Runs games end to end.
///
/// Each game gets its own namespace, timers and session; only the compiler
/// is shared, so one `Arcade` can run games on several threads at once.
/// Nothing here exits the process: every failure comes back as an error
/// for the caller to handle.
pub struct Arcade {
    config: HarnessConfig,
    compiler: PluginCompiler,
    loader: IsolatedLoader,
    verifier: ReplayVerifier,
}

impl Arcade {
    pub fn new(config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            compiler: PluginCompiler::new(),
            loader: IsolatedLoader::new(),
            verifier: ReplayVerifier::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    #[must_use]
    pub fn compiler(&self) -> &PluginCompiler {
        &self.compiler
    }

    /// Play one recorded game.
    ///
    /// `controllers[i]` drives slot `i`; slots past the end are human.
    /// Any plugin that fails to compile aborts the game before an agent is
    /// built. A plugin that compiles but breaks the entry-point contract
    /// only forfeits its own slot.
    pub fn run_game<G: Game>(
        &self,
        mut game: G,
        seed: u64,
        controllers: Vec<ControllerSpec>,
    ) -> Result<GameReport> {
        let player_count = game.player_count();
        check_player_count(player_count)?;
        if controllers.len() > player_count {
            return Err(HarnessError::Config(format!(
                "{} controllers for a {player_count}-player game",
                controllers.len()
            )));
        }

        let mut digests: FxHashMap<&str, u64> = FxHashMap::default();
        let mut units = Vec::new();
        for controller in &controllers {
            if let ControllerSpec::Source { identifier, source } = controller {
                let unit = self.compiler.compile_or_error(identifier, source)?;
                match digests.get(identifier.as_str()) {
                    Some(digest) if *digest == unit.digest() => continue,
                    Some(_) => {
                        return Err(HarnessError::Config(format!(
                            "plugin `{identifier}` given two different sources"
                        )))
                    }
                    None => {
                        digests.insert(identifier.as_str(), unit.digest());
                        units.push(unit);
                    }
                }
            }
        }
        let namespace = self.loader.load(units)?;

        let warmup = WarmupScheduler::new(self.config.warmup.clone()).run(&mut game, seed);

        let contract = Contract::for_player_count(player_count);
        let mut driver = GameDriver::new(
            game,
            seed,
            self.config.budgets.governor(),
            self.config.driver.clone(),
        )
        .with_recorder();

        for (player, controller) in PlayerId::all(player_count).zip(controllers) {
            let handle = match controller {
                ControllerSpec::Source { identifier, .. } => match namespace.resolve(&identifier, contract) {
                    Ok(factory) => AgentHandle::plugin(player, factory),
                    Err(err) => {
                        warn!(%player, plugin = %identifier, %err, "slot forfeited");
                        let reason = match err {
                            HarnessError::ContractMismatch { reason, .. } => reason,
                            other => other.to_string(),
                        };
                        AgentHandle::forfeited(player, identifier, DisqualifyReason::ContractMismatch(reason))
                    }
                },
                ControllerSpec::Native(factory) => AgentHandle::boxed(player, Controller::BuiltIn, factory),
                ControllerSpec::Human => AgentHandle::human(player),
            };
            driver.add_handle(handle)?;
        }

        let outcome = driver.run();
        info!(seed, ticks = outcome.tick_count, scores = ?outcome.scores(), "game complete");
        Ok(GameReport { outcome, warmup })
    }

    /// Play several games in order, carrying on past failed ones.
    pub fn run_batch<G: Game>(
        &self,
        games: impl IntoIterator<Item = (G, u64, Vec<ControllerSpec>)>,
    ) -> Vec<Result<GameReport>> {
        games
            .into_iter()
            .enumerate()
            .map(|(index, (game, seed, controllers))| {
                let report = self.run_game(game, seed, controllers);
                if let Err(err) = &report {
                    warn!(game = index, seed, %err, "game failed, continuing with the next");
                }
                report
            })
            .collect()
    }

    /// Verify a recorded game. See [`ReplayVerifier::verify`].
    pub fn replay<G: Game>(&self, build: impl FnOnce(u64) -> G, record: &ActionRecord) -> Result<RunOutcome> {
        self.verifier.verify(build, record)
    }

    /// Play a game built from `seed`, then immediately verify its trace.
    pub fn run_verified<G: Game>(
        &self,
        build: impl Fn(u64) -> G,
        seed: u64,
        controllers: Vec<ControllerSpec>,
    ) -> Result<GameReport> {
        let report = self.run_game(build(seed), seed, controllers)?;
        if let Some(record) = report.record() {
            self.verifier.verify(&build, record)?;
        }
        Ok(report)
    }
}
