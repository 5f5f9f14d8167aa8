//! Plugin source compilation.
//!
//! Turns Rhai source into a [`CompiledUnit`] entirely in memory. The
//! compiler keeps no per-request state, so one instance can serve any
//! number of threads at once and a failure in one request never shows up
//! in another's diagnostics.

use rhai::{Engine, AST};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::{debug, warn};

use crate::core::{HarnessError, Result};

/// One compiler message, positions 1-based when known.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, line: Option<usize>, column: Option<usize>) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, "line {line}, column {column}: {}", self.message),
            (Some(line), None) => write!(f, "line {line}: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Successfully compiled plugin source, not yet bound to any namespace.
#[derive(Clone, Debug)]
pub struct CompiledUnit {
    identifier: String,
    ast: AST,
    digest: u64,
}

impl CompiledUnit {
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Hash of the source text, for telling units apart in logs.
    #[must_use]
    pub fn digest(&self) -> u64 {
        self.digest
    }

    pub(crate) fn into_parts(self) -> (String, AST, u64) {
        (self.identifier, self.ast, self.digest)
    }
}

/// Compiles plugin source. Cheap to share behind a reference.
pub struct PluginCompiler {
    engine: Engine,
}

impl Default for PluginCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginCompiler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            engine: Engine::new(),
        }
    }

    /// Compile `source` as the plugin named `identifier`.
    ///
    /// On failure the returned list is never empty.
    pub fn compile(
        &self,
        identifier: &str,
        source: &str,
    ) -> std::result::Result<CompiledUnit, Vec<Diagnostic>> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(vec![Diagnostic::new("plugin identifier is empty", None, None)]);
        }
        if source.trim().is_empty() {
            return Err(vec![Diagnostic::new("plugin source is empty", None, None)]);
        }

        match self.engine.compile(source) {
            Ok(ast) => {
                let digest = digest(source);
                debug!(plugin = identifier, digest, "compiled plugin");
                Ok(CompiledUnit {
                    identifier: identifier.to_string(),
                    ast,
                    digest,
                })
            }
            Err(err) => {
                let position = err.position();
                let diagnostic =
                    Diagnostic::new(err.err_type().to_string(), position.line(), position.position());
                warn!(plugin = identifier, %diagnostic, "plugin failed to compile");
                Err(vec![diagnostic])
            }
        }
    }

    /// [`compile`](Self::compile), with failures as `CompilationFailure`.
    pub fn compile_or_error(&self, identifier: &str, source: &str) -> Result<CompiledUnit> {
        self.compile(identifier, source)
            .map_err(|diagnostics| HarnessError::CompilationFailure {
                identifier: identifier.to_string(),
                diagnostics,
            })
    }
}

fn digest(source: &str) -> u64 {
    let mut hasher = FxHasher::default();
    source.hash(&mut hasher);
    hasher.finish()
}
