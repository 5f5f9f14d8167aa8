//! Small games shared by the integration tests.

#![allow(dead_code)]

use rust_arcade::{Action, Game, Observation, PlayerId, Winner};

/// A game with three legal moves per tick.
///
/// `ACTION_RIGHT` scores 1 and `ACTION_LEFT` scores 0.5; `ACTION_NIL`
/// scores nothing. The game ends at `end_at` if set, and never on its own
/// otherwise.
#[derive(Clone, Debug)]
pub struct LineGame {
    seed: u64,
    tick: u32,
    end_at: Option<u32>,
    scores: Vec<f64>,
}

impl LineGame {
    pub fn new(player_count: usize, seed: u64) -> Self {
        Self {
            seed,
            tick: 0,
            end_at: None,
            scores: vec![0.0; player_count],
        }
    }

    pub fn ending_at(mut self, tick: u32) -> Self {
        self.end_at = Some(tick);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Game for LineGame {
    fn player_count(&self) -> usize {
        self.scores.len()
    }

    fn tick(&self) -> u32 {
        self.tick
    }

    fn advance(&mut self, actions: &[Action]) {
        for (score, action) in self.scores.iter_mut().zip(actions) {
            match action {
                Action::Right => *score += 1.0,
                Action::Left => *score += 0.5,
                _ => {}
            }
        }
        self.tick += 1;
    }

    fn is_game_over(&self) -> bool {
        self.end_at.is_some_and(|end| self.tick >= end)
    }

    fn winner(&self, player: PlayerId) -> Winner {
        if !self.is_game_over() {
            return Winner::NoWinner;
        }
        let top = self.scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if top > 0.0 && self.scores[player.index()] == top {
            Winner::PlayerWins
        } else {
            Winner::PlayerLoses
        }
    }

    fn score(&self, player: PlayerId) -> f64 {
        self.scores[player.index()]
    }

    fn available_actions(&self, _player: PlayerId) -> Vec<Action> {
        vec![Action::Nil, Action::Left, Action::Right]
    }

    fn observe(&self, player: PlayerId) -> Observation {
        Observation::new(player, self.player_count(), self.tick)
            .with_score(self.score(player))
            .with_game_over(self.is_game_over())
            .with_actions(self.available_actions(player))
    }
}
