//! The decision loop.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

use crate::core::{Action, ActionSet, DriverConfig, HarnessError, PlayerId, PlayerMap, Result};
use crate::game::{Game, Observation, Winner};
use crate::replay::{ActionRecord, ReplayRecorder};
use crate::session::{Controller, DisqualifyReason, TeardownOutcome};
use crate::timing::Governor;

use super::handle::AgentHandle;

/// A player's standing in a running game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub score: f64,
    pub winner: Winner,
    pub disqualified: bool,
}

/// A live or replayed run: the game, its seed, the tick counter and
/// per-player standings.
///
/// Standings are written by the driver only: refreshed once per applied
/// tick, then finalized once. After that they never change.
#[derive(Debug)]
pub struct GameSession<G: Game> {
    game: G,
    seed: u64,
    tick: u32,
    is_replay: bool,
    standings: PlayerMap<Standing>,
    finalized: bool,
}

impl<G: Game> GameSession<G> {
    pub fn new(game: G, seed: u64, is_replay: bool) -> Self {
        let mut session = Self {
            standings: PlayerMap::with_default(game.player_count()),
            game,
            seed,
            tick: 0,
            is_replay,
            finalized: false,
        };
        session.refresh();
        session
    }

    #[must_use]
    pub fn game(&self) -> &G {
        &self.game
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Ticks applied in this run.
    #[must_use]
    pub fn tick(&self) -> u32 {
        self.tick
    }

    #[must_use]
    pub fn is_replay(&self) -> bool {
        self.is_replay
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    #[must_use]
    pub fn standings(&self) -> &PlayerMap<Standing> {
        &self.standings
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.standings.player_count()
    }

    fn observe_all(&self) -> Vec<Observation> {
        PlayerId::all(self.player_count())
            .map(|p| self.game.observe(p))
            .collect()
    }

    fn apply(&mut self, actions: &[Action]) {
        debug_assert!(!self.finalized, "tick applied after finalize");
        self.game.advance(actions);
        self.tick += 1;
        self.refresh();
    }

    fn refresh(&mut self) {
        for (player, standing) in self.standings.iter_mut() {
            standing.score = self.game.score(player);
            standing.winner = self.game.winner(player);
        }
    }

    /// Fix the final standings. Returns `false` if already finalized.
    fn finalize(&mut self, disqualified: impl Fn(PlayerId) -> bool) -> bool {
        if self.finalized {
            return false;
        }
        self.refresh();
        for (player, standing) in self.standings.iter_mut() {
            standing.disqualified = disqualified(player);
        }
        self.finalized = true;
        true
    }
}

/// How one player's run ended.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerOutcome {
    pub player: PlayerId,
    pub agent: String,
    pub controller: Controller,
    pub score: f64,
    pub winner: Winner,
    pub disqualified: Option<DisqualifyReason>,
    pub teardown: TeardownOutcome,
    /// Effective actions, one per tick.
    pub actions: Vec<Action>,
}

/// Result of [`GameDriver::run`].
#[derive(Clone, Debug)]
pub struct RunOutcome {
    pub seed: u64,
    pub tick_count: u32,
    pub game_over: bool,
    pub is_replay: bool,
    pub players: PlayerMap<PlayerOutcome>,
    /// Trace of the run, when a recorder was attached.
    pub record: Option<ActionRecord>,
}

impl RunOutcome {
    #[must_use]
    pub fn player(&self, player: PlayerId) -> &PlayerOutcome {
        &self.players[player]
    }

    #[must_use]
    pub fn scores(&self) -> Vec<f64> {
        self.players.values().map(|p| p.score).collect()
    }

    #[must_use]
    pub fn wins(&self) -> Vec<bool> {
        self.players.values().map(|p| p.winner.is_win()).collect()
    }

    /// Timeouts and faults of every player, as errors.
    #[must_use]
    pub fn errors(&self) -> Vec<HarnessError> {
        let mut errors = Vec::new();
        for (player, outcome) in self.players.iter() {
            if let Some(reason) = &outcome.disqualified {
                errors.push(reason.to_error(player, &outcome.agent));
            }
            errors.extend(outcome.teardown.to_error(player));
        }
        errors
    }
}

/// Runs one game: construct every agent, then collect and apply one action
/// set per tick until the game ends, then tear every agent down.
///
/// Within a tick every player observes the game before any action is
/// applied, so no agent sees another's choice for the same tick.
pub struct GameDriver<G: Game> {
    session: GameSession<G>,
    handles: Vec<Option<AgentHandle>>,
    governor: Governor,
    config: DriverConfig,
    recorder: Option<ReplayRecorder>,
    tick_limit: Option<u32>,
}

impl<G: Game> GameDriver<G> {
    /// Driver for `game` with every slot empty.
    ///
    /// # Panics
    ///
    /// If the game's player count fails [`check_player_count`](crate::core::check_player_count).
    /// [`Arcade`](crate::Arcade) and [`ReplayVerifier`](crate::ReplayVerifier)
    /// check it first and return an error instead.
    pub fn new(game: G, seed: u64, governor: Governor, config: DriverConfig) -> Self {
        let player_count = game.player_count();
        Self {
            session: GameSession::new(game, seed, false),
            handles: (0..player_count).map(|_| None).collect(),
            governor,
            config,
            recorder: None,
            tick_limit: None,
        }
    }

    /// Record the effective actions of this run.
    pub fn with_recorder(mut self) -> Self {
        let recorder = ReplayRecorder::new(self.session.seed(), self.session.player_count());
        self.recorder = Some(recorder);
        self
    }

    /// Run as a replay pass that stops after `tick_limit` ticks.
    pub fn replaying(mut self, tick_limit: u32) -> Self {
        self.session.is_replay = true;
        self.tick_limit = Some(tick_limit);
        self
    }

    #[must_use]
    pub fn session(&self) -> &GameSession<G> {
        &self.session
    }

    /// Seat `handle` in its slot.
    pub fn add_handle(&mut self, handle: AgentHandle) -> Result<()> {
        let player = handle.player();
        let slot = self.handles.get_mut(player.index()).ok_or_else(|| {
            HarnessError::Config(format!(
                "{player} out of range for a {}-player game",
                self.session.player_count()
            ))
        })?;
        if slot.is_some() {
            return Err(HarnessError::Config(format!("{player} already seated")));
        }
        *slot = Some(handle);
        Ok(())
    }

    /// Play the game to the end. Empty slots are seated as humans.
    pub fn run(mut self) -> RunOutcome {
        let span = info_span!("game", seed = self.session.seed(), replay = self.session.is_replay());
        let _guard = span.enter();

        let slots = PlayerId::all(self.handles.len());
        let mut handles: Vec<AgentHandle> = self
            .handles
            .drain(..)
            .zip(slots)
            .map(|(slot, player)| slot.unwrap_or_else(|| AgentHandle::human(player)))
            .collect();

        info!(players = handles.len(), "starting game");
        for handle in &mut handles {
            let obs = self.session.game.observe(handle.player());
            handle.session_mut().construct(&obs, &self.governor);
        }

        while self.should_continue(&handles) {
            let observations = self.session.observe_all();
            let actions: ActionSet = handles
                .iter_mut()
                .zip(&observations)
                .map(|(handle, obs)| handle.decide(obs, &self.governor, self.config.timeout_policy))
                .collect();

            if let Some(recorder) = &mut self.recorder {
                recorder.record_tick(&actions);
            }
            self.session.apply(&actions);
            debug!(tick = self.session.tick(), ?actions, "tick applied");
        }

        for handle in &mut handles {
            handle.session_mut().finish();
        }
        self.session
            .finalize(|p| handles[p.index()].session().disqualification().is_some());

        let mut teardowns = Vec::with_capacity(handles.len());
        for handle in &mut handles {
            let obs = self.session.game.observe(handle.player());
            teardowns.push(handle.session_mut().teardown(&obs, &self.governor));
        }

        let standings = self.session.standings().clone();
        let players = handles
            .into_iter()
            .zip(teardowns)
            .map(|(handle, teardown)| {
                let player = handle.player();
                let standing = standings[player];
                let (session, actions) = handle.into_parts();
                PlayerOutcome {
                    player,
                    agent: session.name().to_string(),
                    controller: session.controller(),
                    score: standing.score,
                    winner: standing.winner,
                    disqualified: session.disqualification().cloned(),
                    teardown,
                    actions,
                }
            })
            .collect();
        let players = PlayerMap::from_vec(players);

        let tick_count = self.session.tick();
        let record = self.recorder.take().map(|recorder| {
            let scores = standings.values().map(|s| s.score).collect();
            let wins = standings.values().map(|s| s.winner.is_win()).collect();
            recorder.finish(scores, wins, tick_count)
        });

        let game_over = self.session.game.is_game_over();
        info!(ticks = tick_count, game_over, "game finished");
        RunOutcome {
            seed: self.session.seed(),
            tick_count,
            game_over,
            is_replay: self.session.is_replay(),
            players,
            record,
        }
    }

    fn should_continue(&self, handles: &[AgentHandle]) -> bool {
        if self.session.game.is_game_over() {
            return false;
        }
        let limit = self.tick_limit.unwrap_or(self.config.max_ticks);
        if self.session.tick() >= limit {
            return false;
        }
        if !self.session.is_replay() && self.config.stop_when_all_disqualified {
            let mut agents = handles.iter().filter(|h| !h.is_human()).peekable();
            if agents.peek().is_some() && agents.all(|h| !h.session().is_active()) {
                info!(tick = self.session.tick(), "no active agents left");
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{fn_agent, AgentFault, IndexAgent};
    use crate::timing::{TimeBudget, Timer};
    use std::thread;
    use std::time::Duration;

    /// Counts ticks; each player scores when it plays `Right`. Ends at `end`.
    #[derive(Clone, Debug)]
    struct Tally {
        players: usize,
        tick: u32,
        end: u32,
        scores: Vec<f64>,
        seen: Vec<ActionSet>,
    }

    impl Tally {
        fn new(players: usize, end: u32) -> Self {
            Self {
                players,
                tick: 0,
                end,
                scores: vec![0.0; players],
                seen: Vec::new(),
            }
        }
    }

    impl Game for Tally {
        fn player_count(&self) -> usize {
            self.players
        }
        fn tick(&self) -> u32 {
            self.tick
        }
        fn advance(&mut self, actions: &[Action]) {
            assert_eq!(actions.len(), self.players);
            for (score, action) in self.scores.iter_mut().zip(actions) {
                if *action == Action::Right {
                    *score += 1.0;
                }
            }
            self.seen.push(actions.iter().copied().collect());
            self.tick += 1;
        }
        fn is_game_over(&self) -> bool {
            self.tick >= self.end
        }
        fn winner(&self, player: PlayerId) -> Winner {
            if !self.is_game_over() {
                return Winner::NoWinner;
            }
            let best = self.scores.iter().copied().fold(f64::MIN, f64::max);
            if self.scores[player.index()] == best && best > 0.0 {
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
            Observation::new(player, self.players, self.tick)
                .with_score(self.score(player))
                .with_actions(self.available_actions(player))
        }
    }

    fn governor(decision_ms: u64) -> Governor {
        Governor::new(
            TimeBudget::from_millis(1000),
            TimeBudget::from_millis(decision_ms),
            TimeBudget::from_millis(1000),
        )
    }

    #[test]
    fn test_runs_until_game_over() {
        let mut driver = GameDriver::new(Tally::new(2, 4), 1, governor(1000), DriverConfig::default());
        driver.add_handle(AgentHandle::builtin(PlayerId(0), IndexAgent::new(2))).unwrap();
        driver.add_handle(AgentHandle::builtin(PlayerId(1), IndexAgent::new(1))).unwrap();
        let outcome = driver.with_recorder().run();

        assert_eq!(outcome.tick_count, 4);
        assert!(outcome.game_over);
        assert_eq!(outcome.scores(), vec![4.0, 0.0]);
        assert_eq!(outcome.wins(), vec![true, false]);
        assert_eq!(outcome.player(PlayerId(1)).actions, vec![Action::Left; 4]);

        let record = outcome.record.unwrap();
        assert_eq!(record.ticks.len(), 4);
        assert_eq!(record.result.tick_count, 4);
    }

    #[test]
    fn test_max_ticks_stops_open_game() {
        let config = DriverConfig::default().with_max_ticks(5);
        let mut driver = GameDriver::new(Tally::new(1, 100), 1, governor(1000), config);
        driver.add_handle(AgentHandle::builtin(PlayerId(0), IndexAgent::new(0))).unwrap();
        let outcome = driver.run();

        assert_eq!(outcome.tick_count, 5);
        assert!(!outcome.game_over);
        assert_eq!(outcome.player(PlayerId(0)).winner, Winner::NoWinner);
    }

    #[test]
    fn test_empty_slots_become_humans() {
        let config = DriverConfig::default().with_max_ticks(3);
        let mut driver = GameDriver::new(Tally::new(2, 100), 1, governor(1000), config);
        driver.add_handle(AgentHandle::builtin(PlayerId(0), IndexAgent::new(2))).unwrap();
        let outcome = driver.run();

        let human = outcome.player(PlayerId(1));
        assert_eq!(human.controller, Controller::Human);
        assert_eq!(human.actions, vec![Action::Nil; 3]);
        assert_eq!(human.teardown, TeardownOutcome::Skipped);
    }

    #[test]
    fn test_seat_errors() {
        let mut driver = GameDriver::new(Tally::new(1, 1), 1, governor(1000), DriverConfig::default());
        assert!(driver.add_handle(AgentHandle::human(PlayerId(3))).is_err());
        driver.add_handle(AgentHandle::human(PlayerId(0))).unwrap();
        assert!(driver.add_handle(AgentHandle::human(PlayerId(0))).is_err());
    }

    #[test]
    fn test_slow_agent_gets_default_but_others_play_on() {
        let slow = fn_agent("slow", |_: &Observation, _: &Timer| {
            thread::sleep(Duration::from_millis(60));
            Ok(Action::Right)
        });
        let config = DriverConfig::default().with_max_ticks(3);
        let mut driver = GameDriver::new(Tally::new(2, 100), 1, governor(15), config);
        driver.add_handle(AgentHandle::builtin(PlayerId(0), slow)).unwrap();
        driver.add_handle(AgentHandle::builtin(PlayerId(1), IndexAgent::new(2))).unwrap();
        let outcome = driver.run();

        let p0 = outcome.player(PlayerId(0));
        assert!(matches!(p0.disqualified, Some(DisqualifyReason::DecisionTimeout { tick: 0, .. })));
        assert_eq!(p0.actions, vec![Action::Nil; 3]);
        assert_eq!(outcome.player(PlayerId(1)).actions, vec![Action::Right; 3]);
        assert_eq!(outcome.errors().len(), 1);
    }

    #[test]
    fn test_all_disqualified_ends_run() {
        let broken = fn_agent("broken", |_: &Observation, _: &Timer| Err(AgentFault::new("nope")));
        let mut driver = GameDriver::new(Tally::new(1, 100), 1, governor(1000), DriverConfig::default());
        driver.add_handle(AgentHandle::builtin(PlayerId(0), broken)).unwrap();
        let outcome = driver.run();

        assert_eq!(outcome.tick_count, 1);
        assert!(outcome.player(PlayerId(0)).disqualified.is_some());
        assert_eq!(outcome.player(PlayerId(0)).teardown, TeardownOutcome::Completed);
    }

    #[test]
    fn test_standings_finalize_once() {
        let mut session = GameSession::new(Tally::new(1, 1), 9, false);
        session.apply(&[Action::Right]);
        assert!(session.finalize(|_| false));
        assert!(!session.finalize(|_| true));
        assert!(!session.standings()[PlayerId(0)].disqualified);
        assert_eq!(session.standings()[PlayerId(0)].score, 1.0);
    }
}
