//! What an agent is shown each tick.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{Action, PlayerId};

/// Owned snapshot of the game from one player's point of view.
///
/// Built by the game, handed to the agent by value, so agents never hold a
/// reference into live state. Game-specific detail goes into `features`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub tick: u32,
    pub player: PlayerId,
    pub player_count: usize,
    pub score: f64,
    pub game_over: bool,

    /// Legal actions for `player`, in the game's order.
    pub available_actions: Vec<Action>,

    pub features: FxHashMap<String, i64>,
}

impl Observation {
    #[must_use]
    pub fn new(player: PlayerId, player_count: usize, tick: u32) -> Self {
        Self {
            tick,
            player,
            player_count,
            score: 0.0,
            game_over: false,
            available_actions: Vec::new(),
            features: FxHashMap::default(),
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    pub fn with_game_over(mut self, over: bool) -> Self {
        self.game_over = over;
        self
    }

    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.available_actions = actions;
        self
    }

    pub fn with_feature(mut self, name: impl Into<String>, value: i64) -> Self {
        self.features.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn feature(&self, name: &str) -> Option<i64> {
        self.features.get(name).copied()
    }

    /// Action at `index` in `available_actions`.
    #[must_use]
    pub fn action_at(&self, index: usize) -> Option<Action> {
        self.available_actions.get(index).copied()
    }
}
