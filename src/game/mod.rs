//! The contract the harness needs from a game.
//!
//! The harness never looks inside a game. It advances it one tick at a time
//! with one action per player, asks whether it is over, and reads scores,
//! winners and observations back. Everything else, including how
//! randomness is seeded, is the game's business, with one rule: two games
//! built from the same seed and fed the same actions must end identically,
//! or replays of them will diverge.

pub mod observation;

pub use observation::Observation;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{Action, PlayerId};

/// A player's standing as the game reports it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    PlayerWins,
    PlayerLoses,
    /// No result yet, or the game ended without one.
    #[default]
    NoWinner,
}

impl Winner {
    #[must_use]
    pub fn is_win(self) -> bool {
        self == Winner::PlayerWins
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Winner::PlayerWins => "PLAYER_WINS",
            Winner::PlayerLoses => "PLAYER_LOSES",
            Winner::NoWinner => "NO_WINNER",
        };
        f.write_str(name)
    }
}

/// A tick-based game driven by the harness.
///
/// `Clone` must give a fully independent copy: warm-up plays on copies
/// without touching the game it was handed.
pub trait Game: Clone {
    fn player_count(&self) -> usize;

    /// Ticks applied so far.
    fn tick(&self) -> u32;

    /// Apply one tick. `actions` holds exactly one entry per player.
    fn advance(&mut self, actions: &[Action]);

    /// Independent snapshot for look-ahead.
    fn copy(&self) -> Self {
        self.clone()
    }

    fn is_game_over(&self) -> bool;

    fn winner(&self, player: PlayerId) -> Winner;

    fn score(&self, player: PlayerId) -> f64;

    /// Legal actions for `player`, in a stable order.
    fn available_actions(&self, player: PlayerId) -> Vec<Action>;

    fn observe(&self, player: PlayerId) -> Observation;

    /// Clear any input state left behind by warm-up. Called once before the
    /// timed run starts.
    fn reset_input(&mut self) {}
}
