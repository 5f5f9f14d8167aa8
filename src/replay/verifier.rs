//! Deterministic replay checks.

use tracing::{info, warn};

use crate::core::{check_player_count, DriverConfig, HarnessError, PlayerId, Result};
use crate::driver::{AgentHandle, GameDriver, RunOutcome};
use crate::game::Game;
use crate::timing::Governor;

use super::record::ActionRecord;

/// Re-runs a recorded game and demands the identical outcome.
///
/// The game is rebuilt from the recorded seed and each slot plays back its
/// recorded actions instead of consulting an agent. The replay stops when
/// the game ends or the recorded tick count is reached. The tick count,
/// then every player's win flag and score, must match the recording
/// exactly. A mismatch means the game is nondeterministic or the trace was
/// altered; either way the run cannot be trusted and nothing is repaired.
#[derive(Clone, Debug, Default)]
pub struct ReplayVerifier {
    governor: Governor,
}

impl ReplayVerifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay `record` on the game `build` makes from its seed.
    pub fn verify<G: Game>(&self, build: impl FnOnce(u64) -> G, record: &ActionRecord) -> Result<RunOutcome> {
        record.validate()?;

        let game = build(record.seed);
        check_player_count(game.player_count())?;
        if game.player_count() < record.player_count {
            return Err(HarnessError::divergence(
                "player count",
                record.player_count,
                game.player_count(),
            ));
        }
        let record = &record.padded_to(game.player_count());

        let tick_limit = record.result.tick_count.min(record.len() as u32);
        let mut driver = GameDriver::new(game, record.seed, self.governor.clone(), DriverConfig::default())
            .replaying(tick_limit);
        for player in PlayerId::all(record.player_count) {
            driver.add_handle(AgentHandle::replay(player, record.player_actions(player)))?;
        }
        let outcome = driver.run();

        if let Err(err) = compare(record, &outcome) {
            warn!(seed = record.seed, %err, "replay diverged");
            return Err(err);
        }
        info!(seed = record.seed, ticks = outcome.tick_count, "replay verified");
        Ok(outcome)
    }
}

fn compare(record: &ActionRecord, outcome: &RunOutcome) -> Result<()> {
    if outcome.tick_count != record.result.tick_count {
        return Err(HarnessError::divergence(
            "tick count",
            record.result.tick_count,
            outcome.tick_count,
        ));
    }
    for (player, replayed) in outcome.players.iter() {
        let index = player.index();
        let won = replayed.winner.is_win();
        if won != record.result.wins[index] {
            return Err(HarnessError::divergence(
                format!("win flag of {player}"),
                record.result.wins[index],
                won,
            ));
        }
        if replayed.score != record.result.scores[index] {
            return Err(HarnessError::divergence(
                format!("score of {player}"),
                record.result.scores[index],
                replayed.score,
            ));
        }
    }
    Ok(())
}
