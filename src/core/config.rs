//! Run configuration.
//!
//! All durations are plain milliseconds so a config file stays readable.
//! `HarnessConfig` nests one section per component and every section has
//! working defaults, so a config file only names what it changes:
//!
//! ```
//! use rust_arcade::core::{HarnessConfig, TimeoutPolicy};
//!
//! let config = HarnessConfig::from_json(r#"{ "budgets": { "decision_ms": 10 } }"#).unwrap();
//! assert_eq!(config.budgets.decision_ms, 10);
//! assert_eq!(config.budgets.construction_ms, 1000);
//! assert_eq!(config.driver.timeout_policy, TimeoutPolicy::NoOp);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::error::{HarnessError, Result};
use crate::timing::{
    Governor, TimeBudget, DEFAULT_CONSTRUCTION_BUDGET, DEFAULT_DECISION_BUDGET,
    DEFAULT_TEARDOWN_BUDGET,
};

/// What a forfeited slot plays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// `ACTION_NIL` every tick.
    #[default]
    NoOp,
    /// The slot's last effective action, or `ACTION_NIL` if it never acted.
    RepeatLast,
}

/// Per-call time budgets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Agent construction (`init`).
    pub construction_ms: u64,

    /// One decision (`act`).
    pub decision_ms: u64,

    /// End-of-game hook (`result`).
    pub teardown_ms: u64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            construction_ms: DEFAULT_CONSTRUCTION_BUDGET.as_millis(),
            decision_ms: DEFAULT_DECISION_BUDGET.as_millis(),
            teardown_ms: DEFAULT_TEARDOWN_BUDGET.as_millis(),
        }
    }
}

impl BudgetConfig {
    pub fn with_construction_ms(mut self, ms: u64) -> Self {
        self.construction_ms = ms;
        self
    }

    pub fn with_decision_ms(mut self, ms: u64) -> Self {
        self.decision_ms = ms;
        self
    }

    pub fn with_teardown_ms(mut self, ms: u64) -> Self {
        self.teardown_ms = ms;
        self
    }

    /// Governor handing out timers for these budgets.
    #[must_use]
    pub fn governor(&self) -> Governor {
        Governor::new(
            TimeBudget::from_millis(self.construction_ms),
            TimeBudget::from_millis(self.decision_ms),
            TimeBudget::from_millis(self.teardown_ms),
        )
    }
}

/// Warm-up limits. Warm-up stops at whichever limit is hit first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarmupConfig {
    pub enabled: bool,

    /// Wall-clock limit.
    pub time_ms: u64,

    /// Iteration limit: warm-up ends once more than `copy_limit` copies
    /// and more than `advance_limit` advances have been made.
    pub copy_limit: u32,
    pub advance_limit: u32,

    /// Random ticks played on each warm-up copy.
    pub playout_length: usize,
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            time_ms: 1000,
            copy_limit: 100,
            advance_limit: 1000,
            playout_length: 10,
        }
    }
}

impl WarmupConfig {
    /// Warm-up switched off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_time_ms(mut self, ms: u64) -> Self {
        self.time_ms = ms;
        self
    }

    pub fn with_limits(mut self, copies: u32, advances: u32) -> Self {
        self.copy_limit = copies;
        self.advance_limit = advances;
        self
    }

    pub fn with_playout_length(mut self, ticks: usize) -> Self {
        self.playout_length = ticks;
        self
    }

    #[must_use]
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_ms)
    }
}

/// Decision loop settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Hard cap on ticks in a live run.
    pub max_ticks: u32,

    pub timeout_policy: TimeoutPolicy,

    /// End a live run once every non-human slot has left `Active`.
    pub stop_when_all_disqualified: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_ticks: 2000,
            timeout_policy: TimeoutPolicy::NoOp,
            stop_when_all_disqualified: true,
        }
    }
}

impl DriverConfig {
    pub fn with_max_ticks(mut self, ticks: u32) -> Self {
        self.max_ticks = ticks;
        self
    }

    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.timeout_policy = policy;
        self
    }

    pub fn with_stop_when_all_disqualified(mut self, stop: bool) -> Self {
        self.stop_when_all_disqualified = stop;
        self
    }
}

/// Complete harness configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub budgets: BudgetConfig,
    pub warmup: WarmupConfig,
    pub driver: DriverConfig,
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budgets(mut self, budgets: BudgetConfig) -> Self {
        self.budgets = budgets;
        self
    }

    pub fn with_warmup(mut self, warmup: WarmupConfig) -> Self {
        self.warmup = warmup;
        self
    }

    pub fn with_driver(mut self, driver: DriverConfig) -> Self {
        self.driver = driver;
        self
    }

    /// Parse and validate a JSON config.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let budgets = [
            ("construction", self.budgets.construction_ms),
            ("decision", self.budgets.decision_ms),
            ("teardown", self.budgets.teardown_ms),
        ];
        if let Some((name, _)) = budgets.iter().find(|(_, ms)| *ms == 0) {
            return Err(HarnessError::Config(format!("{name} budget must be positive")));
        }
        if self.driver.max_ticks == 0 {
            return Err(HarnessError::Config("max_ticks must be positive".into()));
        }
        if self.warmup.enabled && self.warmup.playout_length == 0 {
            return Err(HarnessError::Config(
                "warm-up playout_length must be positive".into(),
            ));
        }
        Ok(())
    }
}
