//! Top-level run invocation: compile, load, warm up, play, record, verify.

pub mod machine;

pub use machine::{Arcade, ControllerSpec, GameReport};
