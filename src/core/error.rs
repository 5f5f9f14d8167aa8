//! Harness error kinds.
//!
//! Budget overruns and agent faults are normally absorbed into a session's
//! status and only surface here when a caller asks for them as errors.
//! Compilation failures abort a run before any agent exists. Replay
//! divergence is always a hard failure.

use thiserror::Error;

use crate::core::PlayerId;
use crate::plugin::Diagnostic;
use crate::timing::BudgetKind;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    /// Source did not compile. `diagnostics` is never empty.
    #[error("plugin `{identifier}` failed to compile: {}", first_message(.diagnostics))]
    CompilationFailure {
        identifier: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// Compiled unit lacks a required entry point.
    #[error("plugin `{identifier}` does not satisfy the agent contract: {reason}")]
    ContractMismatch { identifier: String, reason: String },

    #[error("{player} exceeded its construction budget ({elapsed_ms} ms, limit {budget_ms} ms)")]
    ConstructionTimeout {
        player: PlayerId,
        elapsed_ms: u64,
        budget_ms: u64,
    },

    #[error("{player} exceeded its decision budget at tick {tick} ({elapsed_ms} ms, limit {budget_ms} ms)")]
    DecisionTimeout {
        player: PlayerId,
        tick: u32,
        elapsed_ms: u64,
        budget_ms: u64,
    },

    #[error("{player} exceeded its teardown budget ({elapsed_ms} ms, limit {budget_ms} ms)")]
    TeardownTimeout {
        player: PlayerId,
        elapsed_ms: u64,
        budget_ms: u64,
    },

    /// Agent code raised an error or panicked.
    #[error("{player} faulted during {phase}: {message}")]
    AgentFault {
        player: PlayerId,
        phase: BudgetKind,
        message: String,
    },

    /// Replayed outcome differs from the recorded one.
    #[error("replay diverged on {subject}: recorded {recorded}, replayed {replayed}")]
    ReplayDivergence {
        subject: String,
        recorded: String,
        replayed: String,
    },

    /// Malformed trace. `line` is 1-based.
    #[error("trace line {line}: {message}")]
    TraceFormat { line: usize, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Encoding(#[from] bincode::Error),
}

impl HarnessError {
    pub(crate) fn trace(line: usize, message: impl Into<String>) -> Self {
        HarnessError::TraceFormat {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn divergence(
        subject: impl Into<String>,
        recorded: impl ToString,
        replayed: impl ToString,
    ) -> Self {
        HarnessError::ReplayDivergence {
            subject: subject.into(),
            recorded: recorded.to_string(),
            replayed: replayed.to_string(),
        }
    }

    /// Whether this error only costs one agent its slot.
    #[must_use]
    pub fn is_slot_forfeit(&self) -> bool {
        matches!(
            self,
            HarnessError::ContractMismatch { .. }
                | HarnessError::ConstructionTimeout { .. }
                | HarnessError::DecisionTimeout { .. }
                | HarnessError::AgentFault { .. }
        )
    }
}

fn first_message(diagnostics: &[Diagnostic]) -> String {
    match diagnostics.first() {
        Some(d) if diagnostics.len() > 1 => format!("{d} (+{} more)", diagnostics.len() - 1),
        Some(d) => d.to_string(),
        None => "no diagnostics".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compilation_failure_message() {
        let err = HarnessError::CompilationFailure {
            identifier: "bot".into(),
            diagnostics: vec![
                Diagnostic::new("expected `)`", Some(3), Some(7)),
                Diagnostic::new("unexpected end", Some(9), None),
            ],
        };
        let text = err.to_string();
        assert!(text.starts_with("plugin `bot` failed to compile"));
        assert!(text.contains("line 3"));
        assert!(text.contains("(+1 more)"));
    }

    #[test]
    fn test_slot_forfeit_kinds() {
        let timeout = HarnessError::DecisionTimeout {
            player: PlayerId(0),
            tick: 3,
            elapsed_ms: 50,
            budget_ms: 10,
        };
        assert!(timeout.is_slot_forfeit());
        assert!(!HarnessError::trace(1, "bad").is_slot_forfeit());
        assert!(!HarnessError::divergence("tick count", 5, 3).is_slot_forfeit());
    }

    #[test]
    fn test_divergence_message() {
        let err = HarnessError::divergence("tick count", 5, 3);
        assert_eq!(
            err.to_string(),
            "replay diverged on tick count: recorded 5, replayed 3"
        );
    }
}
