//! Gem collection game.

use im::Vector;

use crate::core::{Action, GameRng, PlayerId, PlayerMap};
use crate::game::{Game, Observation, Winner};

type Cell = (i32, i32);

const MOVES: [Action; 5] = [Action::Nil, Action::Left, Action::Right, Action::Up, Action::Down];

/// Grid game state. Cloning is cheap: the board lives in persistent
/// vectors.
#[derive(Clone, Debug)]
pub struct GemGame {
    width: i32,
    height: i32,
    tick: u32,
    time_limit: u32,
    avatars: Vector<Cell>,
    gems: Vector<Cell>,
    scores: PlayerMap<f64>,
    hazard: Option<Cell>,
    rng: GameRng,
}

impl GemGame {
    #[must_use]
    pub fn gems_left(&self) -> usize {
        self.gems.len()
    }

    #[must_use]
    pub fn avatar(&self, player: PlayerId) -> Cell {
        self.avatars[player.index()]
    }

    #[must_use]
    pub fn hazard(&self) -> Option<Cell> {
        self.hazard
    }

    fn step(&self, from: Cell, action: Action) -> Cell {
        let (dx, dy) = action.direction();
        let x = (from.0 + dx).clamp(0, self.width - 1);
        let y = (from.1 + dy).clamp(0, self.height - 1);
        (x, y)
    }

    fn nearest_gem(&self, from: Cell) -> Option<Cell> {
        self.gems
            .iter()
            .copied()
            .min_by_key(|g| ((g.0 - from.0).abs() + (g.1 - from.1).abs(), g.1, g.0))
    }

    fn move_hazard(&mut self) {
        if let Some(at) = self.hazard {
            let choice = *self.rng.choose(&MOVES).unwrap_or(&Action::Nil);
            self.hazard = Some(self.step(at, choice));
        }
    }

    fn top_score(&self) -> f64 {
        self.scores.values().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

impl Game for GemGame {
    fn player_count(&self) -> usize {
        self.avatars.len()
    }

    fn tick(&self) -> u32 {
        self.tick
    }

    fn advance(&mut self, actions: &[Action]) {
        for (index, action) in actions.iter().enumerate().take(self.avatars.len()) {
            let to = self.step(self.avatars[index], *action);
            self.avatars.set(index, to);
            if let Some(gem) = self.gems.index_of(&to) {
                self.gems.remove(gem);
                self.scores[PlayerId(index as u8)] += 1.0;
            }
        }

        self.move_hazard();
        if let Some(hazard) = self.hazard {
            for index in 0..self.avatars.len() {
                if self.avatars[index] == hazard {
                    self.scores[PlayerId(index as u8)] -= 1.0;
                }
            }
        }
        self.tick += 1;
    }

    fn is_game_over(&self) -> bool {
        self.gems.is_empty() || self.tick >= self.time_limit
    }

    fn winner(&self, player: PlayerId) -> Winner {
        if !self.is_game_over() {
            return Winner::NoWinner;
        }
        let won = if self.player_count() == 1 {
            self.gems.is_empty()
        } else {
            let top = self.top_score();
            top > 0.0 && self.scores[player] == top
        };
        if won {
            Winner::PlayerWins
        } else {
            Winner::PlayerLoses
        }
    }

    fn score(&self, player: PlayerId) -> f64 {
        self.scores[player]
    }

    fn available_actions(&self, _player: PlayerId) -> Vec<Action> {
        MOVES.to_vec()
    }

    fn observe(&self, player: PlayerId) -> Observation {
        let (x, y) = self.avatar(player);
        let mut obs = Observation::new(player, self.player_count(), self.tick)
            .with_score(self.score(player))
            .with_game_over(self.is_game_over())
            .with_actions(self.available_actions(player))
            .with_feature("x", x.into())
            .with_feature("y", y.into())
            .with_feature("width", self.width.into())
            .with_feature("height", self.height.into())
            .with_feature("gems_left", self.gems.len() as i64);
        if let Some((gx, gy)) = self.nearest_gem((x, y)) {
            obs = obs.with_feature("gem_dx", (gx - x).into()).with_feature("gem_dy", (gy - y).into());
        }
        if let Some((hx, hy)) = self.hazard {
            obs = obs.with_feature("hazard_x", hx.into()).with_feature("hazard_y", hy.into());
        }
        obs
    }
}

/// Builds seeded [`GemGame`]s.
///
/// ```
/// use rust_arcade::games::gems::GemGameBuilder;
/// use rust_arcade::game::Game;
///
/// let game = GemGameBuilder::new().player_count(2).gems(5).build(42);
/// assert_eq!(game.player_count(), 2);
/// assert_eq!(game.gems_left(), 5);
/// ```
#[derive(Clone, Debug)]
pub struct GemGameBuilder {
    player_count: usize,
    width: i32,
    height: i32,
    gems: usize,
    time_limit: u32,
    hazard: bool,
}

impl Default for GemGameBuilder {
    fn default() -> Self {
        Self {
            player_count: 1,
            width: 8,
            height: 8,
            gems: 6,
            time_limit: 200,
            hazard: true,
        }
    }
}

impl GemGameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player_count(mut self, count: usize) -> Self {
        assert!((1..=8).contains(&count), "Player count must be 1-8");
        self.player_count = count;
        self
    }

    pub fn size(mut self, width: i32, height: i32) -> Self {
        assert!(width >= 2 && height >= 2, "Board must be at least 2x2");
        self.width = width;
        self.height = height;
        self
    }

    pub fn gems(mut self, count: usize) -> Self {
        self.gems = count;
        self
    }

    pub fn time_limit(mut self, ticks: u32) -> Self {
        self.time_limit = ticks;
        self
    }

    pub fn hazard(mut self, enabled: bool) -> Self {
        self.hazard = enabled;
        self
    }

    /// Lay out the board for `seed`. Gem count is capped by free cells.
    pub fn build(self, seed: u64) -> GemGame {
        let root = GameRng::new(seed);
        let mut layout = root.for_context("gems");

        let cells = self.width * self.height;
        let avatars: Vector<Cell> = (0..self.player_count as i32)
            .map(|i| {
                let slot = (i * 2) % cells;
                (slot % self.width, slot / self.width)
            })
            .collect();

        let mut free: Vec<Cell> = (0..cells)
            .map(|c| (c % self.width, c / self.width))
            .filter(|c| !avatars.contains(c))
            .collect();

        let mut gems = Vector::new();
        while gems.len() < self.gems && !free.is_empty() {
            let pick = layout.gen_range_usize(0..free.len());
            gems.push_back(free.swap_remove(pick));
        }

        let hazard = self.hazard.then(|| (self.width - 1, self.height - 1));

        GemGame {
            width: self.width,
            height: self.height,
            tick: 0,
            time_limit: self.time_limit,
            scores: PlayerMap::with_value(self.player_count, 0.0),
            avatars,
            gems,
            hazard,
            rng: root.for_context("hazard"),
        }
    }
}
