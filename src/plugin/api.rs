//! Host API exposed to plugin scripts.
//!
//! Scripts see two types: `Observation` and `Timer`, both read-only
//! snapshots. `act` answers with an action token (`"ACTION_LEFT"`) or an
//! integer index into `obs.actions`.

use rhai::{Array, Dynamic, Engine, Map, FLOAT, INT};
use tracing::debug;

use crate::core::Action;
use crate::game::Observation;
use crate::timing::Timer;

/// Register the host types and route script output to `tracing`.
pub(crate) fn register_api(engine: &mut Engine) {
    engine
        .register_type_with_name::<Observation>("Observation")
        .register_get("tick", |o: &mut Observation| o.tick as INT)
        .register_get("player", |o: &mut Observation| o.player.index() as INT)
        .register_get("player_count", |o: &mut Observation| o.player_count as INT)
        .register_get("score", |o: &mut Observation| o.score as FLOAT)
        .register_get("game_over", |o: &mut Observation| o.game_over)
        .register_get("actions", |o: &mut Observation| -> Array {
            o.available_actions
                .iter()
                .map(|a| Dynamic::from(a.token().to_string()))
                .collect()
        })
        .register_get("features", |o: &mut Observation| -> Map {
            o.features
                .iter()
                .map(|(name, value)| (name.as_str().into(), Dynamic::from(*value as INT)))
                .collect()
        })
        .register_fn("feature", |o: &mut Observation, name: &str| -> INT {
            o.feature(name).unwrap_or(0) as INT
        });

    engine
        .register_type_with_name::<Timer>("Timer")
        .register_get("remaining_ms", |t: &mut Timer| t.remaining_millis() as INT)
        .register_get("elapsed_ms", |t: &mut Timer| t.elapsed_millis() as INT)
        .register_get("exceeded", |t: &mut Timer| t.exceeded());

    engine.on_print(|text| debug!(target: "rust_arcade::plugin", "{text}"));
    engine.on_debug(|text, _source, pos| {
        debug!(target: "rust_arcade::plugin", line = pos.line(), "{text}");
    });
}

/// Interpret an `act` return value.
pub(crate) fn action_from_dynamic(value: &Dynamic, obs: &Observation) -> Result<Action, String> {
    if value.is_string() {
        let token = value.clone().into_string().map_err(str::to_string)?;
        return token.parse::<Action>().map_err(|e| e.to_string());
    }
    if value.is_int() {
        let index = value.as_int().map_err(str::to_string)?;
        return usize::try_from(index)
            .ok()
            .and_then(|i| obs.action_at(i))
            .ok_or_else(|| {
                format!(
                    "action index {index} out of range ({} available)",
                    obs.available_actions.len()
                )
            });
    }
    if value.is_unit() {
        return Err("act returned no action".to_string());
    }
    Err(format!("act returned a {}, expected a string or integer", value.type_name()))
}
