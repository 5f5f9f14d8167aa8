//! Agent sessions.
//!
//! An [`AgentSession`] owns one slot's agent for one game. Script plugins
//! and native agents each run on a private worker thread, so a slow or
//! crashing agent only ever costs its own slot.

pub mod agent_session;
mod worker;

pub use agent_session::{AgentSession, Controller, DisqualifyReason, SessionStatus, TeardownOutcome};
