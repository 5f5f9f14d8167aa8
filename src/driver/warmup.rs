//! Warm-up before the timed run.
//!
//! Drives throwaway copies of the game through every player's legal
//! actions plus short random playouts, so one-off first-use costs are paid
//! before any budget starts counting. The game handed in is only read,
//! apart from the single [`Game::reset_input`] call at the end.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::core::{Action, ActionSet, GameRng, PlayerId, WarmupConfig};
use crate::game::Game;

/// Which limit ended warm-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarmupStop {
    Disabled,
    TimeBudget,
    IterationBudget,
    /// No player had any legal action to try.
    NoLegalActions,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmupStats {
    pub copies: u32,
    pub advances: u32,
    pub elapsed: Duration,
    pub stopped_by: WarmupStop,
}

pub struct WarmupScheduler {
    config: WarmupConfig,
}

impl WarmupScheduler {
    pub fn new(config: WarmupConfig) -> Self {
        Self { config }
    }

    /// Warm up on copies of `game`, then reset its input once.
    ///
    /// Never fails: running out of time or iterations just ends warm-up.
    pub fn run<G: Game>(&self, game: &mut G, seed: u64) -> WarmupStats {
        let started = Instant::now();
        let mut stats = WarmupStats {
            copies: 0,
            advances: 0,
            elapsed: Duration::ZERO,
            stopped_by: WarmupStop::Disabled,
        };

        if self.config.enabled {
            let stop = self.rehearse(game, seed, started, &mut stats);
            stats.stopped_by = stop;
        }
        game.reset_input();

        stats.elapsed = started.elapsed();
        debug!(
            copies = stats.copies,
            advances = stats.advances,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            stopped_by = ?stats.stopped_by,
            "warm-up done"
        );
        stats
    }

    fn rehearse<G: Game>(&self, game: &G, seed: u64, started: Instant, stats: &mut WarmupStats) -> WarmupStop {
        let mut rng = GameRng::new(seed).for_context("warmup");
        let player_count = game.player_count();
        let budget = self.config.time_budget();

        loop {
            let copies_before = stats.copies;
            for player in PlayerId::all(player_count) {
                for action in game.available_actions(player) {
                    if started.elapsed() >= budget {
                        return WarmupStop::TimeBudget;
                    }
                    if stats.copies > self.config.copy_limit && stats.advances > self.config.advance_limit {
                        return WarmupStop::IterationBudget;
                    }

                    let mut scratch = game.copy();
                    stats.copies += 1;

                    let mut actions = Action::nil_set(player_count);
                    actions[player.index()] = action;
                    scratch.advance(&actions);
                    stats.advances += 1;

                    for _ in 0..self.config.playout_length {
                        if scratch.is_game_over() {
                            break;
                        }
                        let random: ActionSet = PlayerId::all(player_count)
                            .map(|p| rng.choose(&scratch.available_actions(p)).copied().unwrap_or_default())
                            .collect();
                        scratch.advance(&random);
                        stats.advances += 1;
                    }
                }
            }
            if stats.copies == copies_before {
                return WarmupStop::NoLegalActions;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Observation, Winner};
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone)]
    struct Scripted {
        tick: u32,
        actions: Vec<Action>,
        resets: Rc<Cell<u32>>,
    }

    impl Game for Scripted {
        fn player_count(&self) -> usize {
            2
        }
        fn tick(&self) -> u32 {
            self.tick
        }
        fn advance(&mut self, actions: &[Action]) {
            assert_eq!(actions.len(), 2);
            self.tick += 1;
        }
        fn is_game_over(&self) -> bool {
            self.tick >= 6
        }
        fn winner(&self, _: PlayerId) -> Winner {
            Winner::NoWinner
        }
        fn score(&self, _: PlayerId) -> f64 {
            0.0
        }
        fn available_actions(&self, _: PlayerId) -> Vec<Action> {
            self.actions.clone()
        }
        fn observe(&self, player: PlayerId) -> Observation {
            Observation::new(player, 2, self.tick)
        }
        fn reset_input(&mut self) {
            self.resets.set(self.resets.get() + 1);
        }
    }

    fn scripted_game(actions: Vec<Action>) -> Scripted {
        Scripted {
            tick: 0,
            actions,
            resets: Rc::new(Cell::new(0)),
        }
    }

    #[test]
    fn test_iteration_budget_ends_warmup() {
        let mut game = scripted_game(vec![Action::Nil, Action::Left, Action::Right]);
        let config = WarmupConfig::default().with_time_ms(60_000).with_limits(10, 20);
        let stats = WarmupScheduler::new(config).run(&mut game, 3);

        assert_eq!(stats.stopped_by, WarmupStop::IterationBudget);
        assert!(stats.copies > 10 && stats.advances > 20);
        // the real game is untouched apart from one reset
        assert_eq!(game.tick, 0);
        assert_eq!(game.resets.get(), 1);
    }

    #[test]
    fn test_time_budget_ends_warmup() {
        let mut game = scripted_game(vec![Action::Nil, Action::Up]);
        let config = WarmupConfig::default().with_time_ms(5).with_limits(u32::MAX, u32::MAX);
        let stats = WarmupScheduler::new(config).run(&mut game, 3);
        assert_eq!(stats.stopped_by, WarmupStop::TimeBudget);
        assert!(stats.elapsed >= Duration::from_millis(5));
    }

    #[test]
    fn test_disabled_still_resets() {
        let mut game = scripted_game(vec![Action::Nil]);
        let stats = WarmupScheduler::new(WarmupConfig::disabled()).run(&mut game, 3);
        assert_eq!(stats.stopped_by, WarmupStop::Disabled);
        assert_eq!(stats.copies, 0);
        assert_eq!(game.resets.get(), 1);
    }

    #[test]
    fn test_no_actions_does_not_spin() {
        let mut game = scripted_game(Vec::new());
        let stats = WarmupScheduler::new(WarmupConfig::default()).run(&mut game, 3);
        assert_eq!(stats.stopped_by, WarmupStop::NoLegalActions);
    }
}
