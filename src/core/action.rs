//! Discrete player actions.
//!
//! The harness only moves actions around: it collects one per player per
//! tick, hands them to the game, and writes them to traces. Their meaning
//! belongs to the game.
//!
//! Actions travel through traces and plugin return values as tokens like
//! `ACTION_UP`. Parsing is strict: an unknown token is an error, never a
//! silent `ACTION_NIL`.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// One player's choice for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Do nothing. Substituted for forfeited or idle slots.
    #[default]
    Nil,
    Use,
    Left,
    Right,
    Down,
    Up,
    Escape,
}

/// Every player's action for one tick, in slot order.
pub type ActionSet = SmallVec<[Action; 4]>;

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Nil,
        Action::Use,
        Action::Left,
        Action::Right,
        Action::Down,
        Action::Up,
        Action::Escape,
    ];

    /// Wire token, e.g. `ACTION_LEFT`.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Action::Nil => "ACTION_NIL",
            Action::Use => "ACTION_USE",
            Action::Left => "ACTION_LEFT",
            Action::Right => "ACTION_RIGHT",
            Action::Down => "ACTION_DOWN",
            Action::Up => "ACTION_UP",
            Action::Escape => "ACTION_ESCAPE",
        }
    }

    /// Movement delta on a grid, `(dx, dy)` with y growing downwards.
    #[must_use]
    pub const fn direction(self) -> (i32, i32) {
        match self {
            Action::Left => (-1, 0),
            Action::Right => (1, 0),
            Action::Up => (0, -1),
            Action::Down => (0, 1),
            Action::Nil | Action::Use | Action::Escape => (0, 0),
        }
    }

    /// An `ActionSet` of `player_count` no-ops.
    #[must_use]
    pub fn nil_set(player_count: usize) -> ActionSet {
        smallvec::smallvec![Action::Nil; player_count]
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Token that names no known action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action token `{}`", self.0)
    }
}

impl std::error::Error for UnknownAction {}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.token() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}
