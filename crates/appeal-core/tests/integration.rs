//! # Appeal Game Integration Tests
//!
//! End-to-end tests across the scenario store, escalation controller and
//! round ledger, on an on-disk database.
//!
//! ## Coverage
//!
//! | Property | Component | Test |
//! |----------|-----------|------|
//! | Duplicate registration leaves record intact | Scenario Store | `test_duplicate_registration_is_idempotent` |
//! | Unknown id evaluation has no effect | Appeal Controller | `test_evaluate_unknown_scenario` |
//! | Overturn iff verdict changed | Appeal Controller | `test_overturn_tracks_preceding_verdict` |
//! | Appeal panel larger than initial | Appeal Controller | `test_appeal_panel_exceeds_initial` |
//! | Reward distribution is pure | Reward Calculator | `test_distribute_rewards_is_pure` |
//! | Score deltas commute | Round Ledger | `test_score_deltas_commute` |
//! | Invalid ruling leaves counter | Round Ledger | `test_invalid_ruling_rejected` |
//! | Full cycle | All | `test_cats_and_dogs_end_to_end` |
//! | Ties | Reward Calculator | `test_reward_ties` |

use std::sync::Arc;

use appeal_core::{
    AppealConfig, AppealError, AppealGame, EvaluationState, Oracle, Scenario, ScriptedOracle,
    StaticOracle, Tier, Verdict,
};
use tempfile::TempDir;

/// Installs a test subscriber once; `RUST_LOG` controls the output.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Creates a test configuration with a temporary database directory.
fn test_config(temp_dir: &TempDir) -> AppealConfig {
    let mut config = AppealConfig::default();
    config.storage.db_path = temp_dir.path().join("appeal_game.db");
    config
}

fn open_game(temp_dir: &TempDir, oracle: Arc<dyn Oracle>) -> AppealGame {
    init_tracing();
    AppealGame::new(test_config(temp_dir), oracle).unwrap()
}

fn cats_and_dogs() -> Scenario {
    Scenario::new("s1", "Which pet is better?", "cats", "dogs", "Pets")
}

// =============================================================================
// SCENARIO STORE
// =============================================================================

#[test]
fn test_duplicate_registration_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let game = open_game(&temp_dir, Arc::new(StaticOracle::new("A")));

    assert!(game.register_scenario(&cats_and_dogs()).unwrap());

    let impostor = Scenario::new("s1", "Which bird is better?", "owls", "hawks", "Birds");
    assert!(!game.register_scenario(&impostor).unwrap());

    let stored = game.get_scenario("s1").unwrap().unwrap();
    assert_eq!(stored, cats_and_dogs());
    assert_eq!(game.list_scenarios().unwrap(), vec!["s1"]);
}

#[test]
fn test_state_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let game = open_game(&temp_dir, Arc::new(StaticOracle::new("A")));
        game.register_scenario(&cats_and_dogs()).unwrap();
        game.create_session("g1", 3).unwrap();
        game.update_score("g1", "p1", 42).unwrap();
        game.flush().unwrap();
    }

    let game = open_game(&temp_dir, Arc::new(StaticOracle::new("A")));
    assert_eq!(game.get_scenario("s1").unwrap(), Some(cats_and_dogs()));
    let state = game.get_session_state("g1").unwrap().unwrap();
    assert_eq!(state.score("p1"), Some(42));
}

// =============================================================================
// ESCALATION
// =============================================================================

#[tokio::test]
async fn test_evaluate_unknown_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let oracle = Arc::new(StaticOracle::new("B"));
    let game = open_game(&temp_dir, oracle.clone());

    for result in [
        game.evaluate_initial("s404").await,
        game.evaluate_appeal("s404").await,
    ] {
        assert!(matches!(result, Err(AppealError::ScenarioNotFound(_))));
    }

    assert_eq!(oracle.calls(), 0);
    assert!(game.get_evaluation("s404").unwrap().is_none());
    assert_eq!(
        game.evaluation_state("s404").unwrap(),
        EvaluationState::Unevaluated
    );
    assert_eq!(game.stats().evaluations, 0);
}

#[tokio::test]
async fn test_overturn_tracks_preceding_verdict() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(&temp_dir);
    config.escalation.panel_mode = appeal_core::PanelMode::Delegated;

    // One call per tier; each entry is (tier, oracle answer).
    let steps = [
        (Tier::Appeal, "B"),
        (Tier::Appeal, "B"),
        (Tier::Initial, "A"),
        (Tier::Appeal, "B"),
        (Tier::Appeal, "a"),
        (Tier::Initial, "garbage"),
        (Tier::Appeal, "```json\n{\"ruling\": \"B\"}\n```"),
    ];
    let oracle = Arc::new(ScriptedOracle::new(steps.iter().map(|(_, r)| *r)));
    let game = AppealGame::new(config, oracle).unwrap();
    game.register_scenario(&cats_and_dogs()).unwrap();

    let mut preceding: Option<Verdict> = None;
    for (tier, _) in steps {
        let outcome = match tier {
            Tier::Initial => game.evaluate_initial("s1").await.unwrap(),
            Tier::Appeal => game.evaluate_appeal("s1").await.unwrap(),
        };
        let record = outcome.record;

        if tier == Tier::Appeal {
            assert_eq!(record.previous_verdict, preceding);
            assert_eq!(
                record.overturned,
                preceding.is_some_and(|p| p != record.verdict)
            );
        } else {
            assert!(!record.overturned);
        }
        preceding = Some(record.verdict);
    }

    // Final appeal: garbage initial defaulted to A, appeal said B.
    let last = game.get_evaluation("s1").unwrap().unwrap();
    assert_eq!(last.previous_verdict, Some(Verdict::A));
    assert_eq!(last.verdict, Verdict::B);
    assert!(last.overturned);
}

#[tokio::test]
async fn test_appeal_panel_exceeds_initial() {
    let temp_dir = TempDir::new().unwrap();
    let oracle = Arc::new(StaticOracle::new("A"));
    let game = open_game(&temp_dir, oracle.clone());
    game.register_scenario(&cats_and_dogs()).unwrap();

    let initial = game.evaluate_initial("s1").await.unwrap();
    let appeal = game.evaluate_appeal("s1").await.unwrap();

    assert!(appeal.record.panel_size > initial.record.panel_size);
    assert_eq!(oracle.calls(), initial.record.panel_size + appeal.record.panel_size);

    let mut config = test_config(&temp_dir);
    config.escalation.initial_panel_size = 50;
    config.escalation.appeal_panel_size = 50;
    assert!(matches!(
        AppealGame::new(config, oracle),
        Err(AppealError::Config(_))
    ));
}

// =============================================================================
// LEDGER AND REWARDS
// =============================================================================

#[test]
fn test_distribute_rewards_is_pure() {
    let temp_dir = TempDir::new().unwrap();
    let game = open_game(&temp_dir, Arc::new(StaticOracle::new("A")));
    game.create_session("g1", 10).unwrap();
    for (player, score) in [("p1", 5), ("p2", 5), ("p3", 9), ("p4", -1)] {
        game.update_score("g1", player, score).unwrap();
    }

    let first = game.distribute_rewards("g1").unwrap();
    let second = game.distribute_rewards("g1").unwrap();
    assert_eq!(first, second);
    assert_eq!(game.standings("g1").unwrap(), game.standings("g1").unwrap());

    let state = game.get_session_state("g1").unwrap().unwrap();
    assert_eq!(state.score("p3"), Some(9));
}

#[test]
fn test_score_deltas_commute() {
    let temp_dir = TempDir::new().unwrap();
    let game = open_game(&temp_dir, Arc::new(StaticOracle::new("A")));

    let orders: [[i64; 3]; 3] = [[10, -3, 5], [-3, 5, 10], [5, 10, -3]];
    for (i, order) in orders.iter().enumerate() {
        let session = format!("g{}", i);
        game.create_session(&session, 1).unwrap();
        for delta in order {
            assert!(game.update_score(&session, "p1", *delta).unwrap());
        }
        let state = game.get_session_state(&session).unwrap().unwrap();
        assert_eq!(state.score("p1"), Some(12));
    }
}

#[test]
fn test_invalid_ruling_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let game = open_game(&temp_dir, Arc::new(StaticOracle::new("A")));
    game.create_session("g1", 4).unwrap();

    for (initial, fin) in [("C", "A"), ("A", "b"), ("", "B"), ("AB", "A")] {
        assert!(!game
            .record_round("g1", "s1", initial, fin, true, 50)
            .unwrap());
    }

    let state = game.get_session_state("g1").unwrap().unwrap();
    assert_eq!(state.current_round, 0);
    assert!(state.rounds.is_empty());
}

#[test]
fn test_round_scenario_not_checked() {
    let temp_dir = TempDir::new().unwrap();
    let game = open_game(&temp_dir, Arc::new(StaticOracle::new("A")));
    game.create_session("g1", 4).unwrap();

    assert!(game
        .record_round("g1", "never-registered", "A", "A", false, 5)
        .unwrap());
}

// =============================================================================
// END-TO-END
// =============================================================================

#[tokio::test]
async fn test_cats_and_dogs_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let mut script = vec!["A"; 5];
    script.extend(vec!["B"; 50]);
    let oracle = Arc::new(ScriptedOracle::new(script));
    let game = open_game(&temp_dir, oracle.clone());

    assert!(game.register_scenario(&cats_and_dogs()).unwrap());

    let initial = game.evaluate_initial("s1").await.unwrap();
    assert_eq!(initial.record.verdict, Verdict::A);
    assert_eq!(initial.record.tier, Tier::Initial);
    assert_eq!(oracle.calls(), 5);

    let appeal = game.evaluate_appeal("s1").await.unwrap();
    assert_eq!(appeal.record.verdict, Verdict::B);
    assert_eq!(appeal.record.tier, Tier::Appeal);
    assert!(appeal.record.overturned);
    assert_eq!(oracle.calls(), 55);
    assert_eq!(appeal.tally.unwrap().b, 50);

    let stored = game.get_evaluation("s1").unwrap().unwrap();
    assert_eq!(stored, appeal.record);

    assert!(game.create_session("g1", 2).unwrap());
    assert!(game.record_round("g1", "s1", "A", "B", true, 50).unwrap());

    let state = game.get_session_state("g1").unwrap().unwrap();
    assert_eq!(state.current_round, 1);
    assert_eq!(state.appeal_count(), 1);
    assert_eq!(state.overturn_count(), 1);
    assert_eq!(state.rounds[0].validator_count, 50);
}

#[test]
fn test_reward_ties() {
    let temp_dir = TempDir::new().unwrap();
    let game = open_game(&temp_dir, Arc::new(StaticOracle::new("A")));
    game.create_session("g1", 3).unwrap();
    game.update_score("g1", "p1", 300).unwrap();
    game.update_score("g1", "p2", 300).unwrap();
    game.update_score("g1", "p3", 100).unwrap();

    let rewards = game.distribute_rewards("g1").unwrap();
    assert_eq!(rewards.len(), 3);
    assert_eq!(rewards["p1"], 1000);
    assert_eq!(rewards["p2"], 750);
    assert_eq!(rewards["p3"], 500);

    let standings = game.standings("g1").unwrap();
    assert_eq!(standings[0].player, "p1");
    assert_eq!(standings[1].player, "p2");
    assert_eq!(standings[2].rank, 3);
}
