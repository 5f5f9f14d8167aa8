//! Gem collection on a small grid, used to exercise the harness end to end.
//!
//! - Each player moves one cell per tick (`ACTION_LEFT`, `ACTION_UP`, ...)
//!   and scores 1 per gem picked up
//! - A hazard wanders the board on its own seeded stream and costs 1 point
//!   to anyone standing on it
//! - The game ends when every gem is taken or the time limit is reached
//!
//! Single player wins by clearing the board; with more players the top
//! positive score wins.

mod game;

pub use game::{GemGame, GemGameBuilder};
