//! Script plugin tests.
//!
//! These tests drive Rhai plugins through the full pipeline: compile, load
//! into a per-game namespace, construct under budget, decide each tick and
//! tear down.

mod common;

use std::thread;

use common::LineGame;
use rust_arcade::games::gems::GemGameBuilder;
use rust_arcade::{
    Action, Arcade, BudgetConfig, ControllerSpec, DisqualifyReason, DriverConfig, HarnessConfig, HarnessError,
    PlayerId, PluginCompiler, TeardownOutcome, WarmupConfig,
};

const FIRST_ACTION: &str = r#"
    fn init(obs, timer) { }
    fn act(obs, timer) { 0 }
"#;

const COUNTER: &str = r#"
    let calls = 0;

    fn init(obs, timer) { this.moves = 0; }

    fn act(obs, timer) {
        this.moves += 1;
        if this.moves % 2 == 0 { "ACTION_RIGHT" } else { "ACTION_LEFT" }
    }

    fn result(obs, timer) { this.done = true; }
"#;

const SPINNER: &str = r#"
    fn init(obs, timer) { }
    fn act(obs, timer) {
        let n = 0;
        loop { n += 1; }
    }
"#;

fn arcade(max_ticks: u32) -> Arcade {
    let config = HarnessConfig::new()
        .with_warmup(WarmupConfig::disabled())
        .with_driver(
            DriverConfig::default()
                .with_max_ticks(max_ticks)
                .with_stop_when_all_disqualified(false),
        );
    Arcade::new(config).unwrap()
}

// =============================================================================
// Compilation
// =============================================================================

/// Broken source is rejected with diagnostics before anything is built.
#[test]
fn test_invalid_source_reports_diagnostics() {
    let compiler = PluginCompiler::new();
    let diagnostics = compiler.compile("broken", "fn act(obs, timer) { let = ; }").unwrap_err();
    assert!(!diagnostics.is_empty());
    assert!(diagnostics[0].line.is_some());
    assert!(!diagnostics[0].message.is_empty());
}

/// One bad plugin aborts the whole game, even if other slots are fine.
#[test]
fn test_compile_failure_aborts_game() {
    let err = arcade(5)
        .run_game(
            LineGame::new(2, 0),
            0,
            vec![
                ControllerSpec::source("good", FIRST_ACTION),
                ControllerSpec::source("bad", "fn act(obs, timer) {"),
            ],
        )
        .unwrap_err();

    match err {
        HarnessError::CompilationFailure { identifier, diagnostics } => {
            assert_eq!(identifier, "bad");
            assert!(!diagnostics.is_empty());
        }
        other => panic!("expected a compilation failure, got {other}"),
    }
}

#[test]
fn test_batch_continues_past_failed_game() {
    let arcade = arcade(3);
    let games = vec![
        (LineGame::new(1, 1), 1, vec![ControllerSpec::source("bad", "fn act(")]),
        (LineGame::new(1, 2), 2, vec![ControllerSpec::source("good", FIRST_ACTION)]),
    ];
    let reports = arcade.run_batch(games);

    assert_eq!(reports.len(), 2);
    assert!(matches!(reports[0], Err(HarnessError::CompilationFailure { .. })));
    let second = reports[1].as_ref().unwrap();
    assert_eq!(second.outcome.seed, 2);
    assert_eq!(second.outcome.tick_count, 3);
}

// =============================================================================
// Contracts and lifecycle
// =============================================================================

/// A plugin missing `act` forfeits only its own slot.
#[test]
fn test_contract_mismatch_forfeits_slot() {
    let report = arcade(3)
        .run_game(
            LineGame::new(2, 0),
            0,
            vec![
                ControllerSpec::source("lazy", "fn init(obs, timer, player) { }"),
                ControllerSpec::source(
                    "steady",
                    "fn init(obs, timer, player) { } fn act(obs, timer) { \"ACTION_RIGHT\" }",
                ),
            ],
        )
        .unwrap();

    let lazy = report.outcome.player(PlayerId(0));
    assert!(matches!(lazy.disqualified, Some(DisqualifyReason::ContractMismatch(_))));
    assert_eq!(lazy.actions, vec![Action::Nil; 3]);

    let steady = report.outcome.player(PlayerId(1));
    assert!(steady.disqualified.is_none());
    assert_eq!(steady.score, 3.0);
}

/// Single-agent `init` does not satisfy a multi-agent game.
#[test]
fn test_single_agent_plugin_in_multi_agent_game() {
    let report = arcade(2)
        .run_game(LineGame::new(2, 0), 0, vec![ControllerSpec::source("solo", FIRST_ACTION)])
        .unwrap();
    assert!(matches!(
        report.outcome.player(PlayerId(0)).disqualified,
        Some(DisqualifyReason::ContractMismatch(_))
    ));
}

/// Two slots running the same plugin keep separate state.
#[test]
fn test_instances_share_no_state() {
    let shared = r#"
        let seen = 0;
        fn init(obs, timer, player) { this.me = player; this.ticks = 0; }
        fn act(obs, timer) {
            this.ticks += 1;
            if this.me == 0 { "ACTION_RIGHT" }
            else if this.ticks > 2 { "ACTION_LEFT" }
            else { "ACTION_NIL" }
        }
    "#;
    let report = arcade(4)
        .run_game(
            LineGame::new(2, 0),
            0,
            vec![ControllerSpec::source("twin", shared), ControllerSpec::source("twin", shared)],
        )
        .unwrap();

    let outcome = &report.outcome;
    assert_eq!(outcome.player(PlayerId(0)).actions, vec![Action::Right; 4]);
    assert_eq!(
        outcome.player(PlayerId(1)).actions,
        vec![Action::Nil, Action::Nil, Action::Left, Action::Left]
    );
}

/// The same identifier with two different sources is ambiguous.
#[test]
fn test_conflicting_sources_rejected() {
    let err = arcade(2)
        .run_game(
            LineGame::new(2, 0),
            0,
            vec![
                ControllerSpec::source("twin", "fn init(o, t, p) {} fn act(o, t) { 0 }"),
                ControllerSpec::source("twin", "fn init(o, t, p) {} fn act(o, t) { 1 }"),
            ],
        )
        .unwrap_err();
    assert!(matches!(err, HarnessError::Config(_)));
}

/// Script state survives across ticks and `result` runs at the end.
#[test]
fn test_script_state_persists() {
    let report = arcade(4)
        .run_game(LineGame::new(1, 0), 0, vec![ControllerSpec::source("counter", COUNTER)])
        .unwrap();

    let player = report.outcome.player(PlayerId(0));
    assert_eq!(
        player.actions,
        vec![Action::Left, Action::Right, Action::Left, Action::Right]
    );
    assert_eq!(player.score, 3.0);
    assert_eq!(player.teardown, TeardownOutcome::Completed);
}

/// A throwing `act` disqualifies the slot; `result` still runs.
#[test]
fn test_throwing_act_still_gets_result() {
    let source = r#"
        fn init(obs, timer) { }
        fn act(obs, timer) {
            if obs.tick == 1 { throw "lost my marbles"; }
            "ACTION_RIGHT"
        }
        fn result(obs, timer) { }
    "#;
    let report = arcade(3)
        .run_game(LineGame::new(1, 0), 0, vec![ControllerSpec::source("thrower", source)])
        .unwrap();

    let player = report.outcome.player(PlayerId(0));
    match &player.disqualified {
        Some(DisqualifyReason::DecisionFault { tick: 1, message }) => {
            assert!(message.contains("lost my marbles"))
        }
        other => panic!("unexpected disqualification: {other:?}"),
    }
    assert_eq!(player.actions, vec![Action::Right, Action::Nil, Action::Nil]);
    assert_eq!(player.teardown, TeardownOutcome::Completed);
}

#[test]
fn test_unknown_action_token_is_a_fault() {
    let source = r#"
        fn init(obs, timer) { }
        fn act(obs, timer) { "ACTION_JUMP" }
    "#;
    let report = arcade(2)
        .run_game(LineGame::new(1, 0), 0, vec![ControllerSpec::source("jumper", source)])
        .unwrap();
    assert!(matches!(
        report.outcome.player(PlayerId(0)).disqualified,
        Some(DisqualifyReason::DecisionFault { tick: 0, .. })
    ));
}

// =============================================================================
// Budgets
// =============================================================================

/// A script stuck in a loop is cut off at the decision budget.
#[test]
fn test_infinite_loop_is_disqualified() {
    let config = HarnessConfig::new()
        .with_warmup(WarmupConfig::disabled())
        .with_budgets(BudgetConfig::default().with_decision_ms(20))
        .with_driver(DriverConfig::default().with_max_ticks(10));
    let report = Arcade::new(config)
        .unwrap()
        .run_game(LineGame::new(1, 0), 0, vec![ControllerSpec::source("spinner", SPINNER)])
        .unwrap();

    let player = report.outcome.player(PlayerId(0));
    assert!(matches!(
        player.disqualified,
        Some(DisqualifyReason::DecisionTimeout { tick: 0, budget_ms: 20, .. })
    ));
    // a lone disqualified agent ends the run
    assert_eq!(report.outcome.tick_count, 1);
}

/// The timer handed to scripts counts down.
#[test]
fn test_script_sees_timer() {
    let source = r#"
        fn init(obs, timer) { }
        fn act(obs, timer) {
            if timer.remaining_ms > 0 && !timer.exceeded { "ACTION_RIGHT" } else { "ACTION_NIL" }
        }
    "#;
    let report = arcade(2)
        .run_game(LineGame::new(1, 0), 0, vec![ControllerSpec::source("clock", source)])
        .unwrap();
    assert_eq!(report.outcome.player(PlayerId(0)).actions, vec![Action::Right; 2]);
}

// =============================================================================
// Concurrency
// =============================================================================

/// Games on separate threads share only the compiler and stay independent.
#[test]
fn test_concurrent_games() {
    let arcade = Arcade::new(
        HarnessConfig::new()
            .with_warmup(WarmupConfig::default().with_time_ms(20))
            .with_driver(DriverConfig::default().with_max_ticks(200)),
    )
    .unwrap();

    let seeker = r#"
        fn init(obs, timer) { }
        fn act(obs, timer) {
            let dx = obs.feature("gem_dx");
            let dy = obs.feature("gem_dy");
            if dx > 0 { "ACTION_RIGHT" }
            else if dx < 0 { "ACTION_LEFT" }
            else if dy > 0 { "ACTION_DOWN" }
            else if dy < 0 { "ACTION_UP" }
            else { "ACTION_NIL" }
        }
    "#;

    let scores: Vec<Vec<f64>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4u64)
            .map(|seed| {
                let arcade = &arcade;
                scope.spawn(move || {
                    let game = GemGameBuilder::new().hazard(false).build(seed);
                    arcade
                        .run_game(game, seed, vec![ControllerSpec::source("seeker", seeker)])
                        .unwrap()
                        .outcome
                        .scores()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // greedy seeking clears a hazard-free board before the time limit
    for score in scores {
        assert_eq!(score, vec![6.0]);
    }
}
