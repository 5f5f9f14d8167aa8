//! Player slots and per-player storage.
//!
//! ## PlayerId
//!
//! 0-based index of a participant slot. A game declares its player count
//! and every slot, whether it is driven by a plugin, a built-in agent, a
//! human or a replay trace, is addressed by one of these.
//!
//! ## PlayerMap
//!
//! Dense per-slot storage backed by a `Vec`. Standings, action logs and
//! recorded results are all kept in one.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

use crate::core::error::{HarnessError, Result};

/// Most slots a game may declare.
pub const MAX_PLAYERS: usize = u8::MAX as usize;

/// Participant slot, 0-based. At most [`MAX_PLAYERS`] slots per game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Raw slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Slots `0..player_count`.
    ///
    /// ```
    /// use rust_arcade::core::PlayerId;
    ///
    /// let slots: Vec<_> = PlayerId::all(3).collect();
    /// assert_eq!(slots, vec![PlayerId(0), PlayerId(1), PlayerId(2)]);
    /// ```
    pub fn all(player_count: usize) -> impl Iterator<Item = PlayerId> {
        (0..u8::MAX).take(player_count).map(PlayerId)
    }

    /// Slot at `index`, if a game can have one there.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index).ok().filter(|id| *id < u8::MAX).map(Self)
    }
}

/// Reject a game that declares no slots or more than [`MAX_PLAYERS`].
pub fn check_player_count(player_count: usize) -> Result<()> {
    if (1..=MAX_PLAYERS).contains(&player_count) {
        Ok(())
    } else {
        Err(HarnessError::Config(format!(
            "game declares {player_count} players, expected 1 to {MAX_PLAYERS}"
        )))
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player {}", self.0)
    }
}

/// One value per player slot.
///
/// ```
/// use rust_arcade::core::{PlayerId, PlayerMap};
///
/// let mut scores: PlayerMap<f64> = PlayerMap::with_value(2, 0.0);
/// scores[PlayerId(1)] += 3.0;
/// assert_eq!(scores.values().copied().collect::<Vec<_>>(), vec![0.0, 3.0]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    data: Vec<T>,
}

impl<T> PlayerMap<T> {
    /// Build one entry per slot from `factory`.
    ///
    /// # Panics
    ///
    /// If `player_count` fails [`check_player_count`].
    pub fn new(player_count: usize, factory: impl FnMut(PlayerId) -> T) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 255, "At most 255 players supported");

        Self {
            data: PlayerId::all(player_count).map(factory).collect(),
        }
    }

    pub fn with_value(player_count: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(player_count, |_| value.clone())
    }

    pub fn with_default(player_count: usize) -> Self
    where
        T: Default,
    {
        Self::new(player_count, |_| T::default())
    }

    /// Wrap an existing vector, one entry per slot in slot order.
    pub fn from_vec(data: Vec<T>) -> Self {
        assert!(!data.is_empty(), "Must have at least 1 player");
        assert!(data.len() <= 255, "At most 255 players supported");
        Self { data }
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn get(&self, player: PlayerId) -> &T {
        &self.data[player.index()]
    }

    pub fn get_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.data[player.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PlayerId, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }

    /// Values in slot order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    /// Apply `f` to every entry, keeping slot order.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> PlayerMap<U> {
        PlayerMap {
            data: self.data.iter().map(f).collect(),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &Self::Output {
        self.get(player)
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut Self::Output {
        self.get_mut(player)
    }
}
