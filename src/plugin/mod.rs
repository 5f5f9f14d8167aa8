//! Script plugins: compilation, isolated loading and the host API.
//!
//! - `compiler`: Rhai source to [`CompiledUnit`] or diagnostics
//! - `loader`: fresh [`Namespace`] per load, entry-point resolution
//! - `api`: types and functions scripts can use
//!
//! A plugin script defines:
//!
//! ```text
//! fn init(obs, timer) { this.seen = 0; }            // (obs, timer, player) for multi-agent games
//! fn act(obs, timer) { this.seen += 1; "ACTION_LEFT" }
//! fn result(obs, timer) { }                          // optional
//! ```
//!
//! `this` is the instance's private object map.

mod api;
pub mod compiler;
pub mod loader;

pub use compiler::{CompiledUnit, Diagnostic, PluginCompiler};
pub use loader::{Contract, IsolatedLoader, Namespace, PluginFactory, PluginUnit};
