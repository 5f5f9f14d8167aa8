//! Trace capture during a live run.

use crate::core::{Action, ActionSet};

use super::record::{ActionRecord, RecordedResult};

/// Collects the effective actions of a run, tick by tick.
///
/// The driver feeds it the action set it is about to apply, after every
/// substitution for forfeited or idle slots, so the trace replays exactly
/// what the game saw.
#[derive(Clone, Debug)]
pub struct ReplayRecorder {
    seed: u64,
    player_count: usize,
    ticks: Vec<ActionSet>,
}

impl ReplayRecorder {
    #[must_use]
    pub fn new(seed: u64, player_count: usize) -> Self {
        Self {
            seed,
            player_count,
            ticks: Vec::new(),
        }
    }

    pub fn record_tick(&mut self, actions: &[Action]) {
        debug_assert_eq!(actions.len(), self.player_count);
        self.ticks.push(actions.iter().copied().collect());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Close the trace with the final result.
    #[must_use]
    pub fn finish(self, scores: Vec<f64>, wins: Vec<bool>, tick_count: u32) -> ActionRecord {
        ActionRecord {
            seed: self.seed,
            player_count: self.player_count,
            ticks: self.ticks,
            result: RecordedResult {
                wins,
                scores,
                tick_count,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_builds_valid_record() {
        let mut recorder = ReplayRecorder::new(5, 2);
        recorder.record_tick(&[Action::Left, Action::Nil]);
        recorder.record_tick(&[Action::Up, Action::Down]);
        assert_eq!(recorder.len(), 2);

        let record = recorder.finish(vec![1.0, 0.0], vec![true, false], 2);
        assert!(record.validate().is_ok());
        assert_eq!(record.seed, 5);
        assert_eq!(record.ticks[1].as_slice(), &[Action::Up, Action::Down]);
    }
}
