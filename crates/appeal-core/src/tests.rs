//! Unit tests for appeal-core.

use std::sync::Arc;

use crate::{AppealConfig, AppealGame, PanelMode, ScriptedOracle, StaticOracle, Tier, Verdict};

#[test]
fn test_crate_structure() {
    let _config = AppealConfig::default();
    let _game = AppealGame::temporary(Arc::new(StaticOracle::new("A"))).unwrap();
    assert_eq!(crate::normalize_ruling("```\nb\n```"), Verdict::B);
}

#[tokio::test]
async fn test_delegated_mode_makes_one_call_per_tier() {
    let oracle = Arc::new(StaticOracle::new(r#"{"ruling": "B"}"#));
    let mut config = AppealConfig::default();
    config.storage.temporary = true;
    config.escalation.panel_mode = PanelMode::Delegated;
    let game = AppealGame::new(config, oracle.clone()).unwrap();

    game.register_scenario(&crate::Scenario::new("s1", "Q", "a", "b", "c"))
        .unwrap();
    let initial = game.evaluate_initial("s1").await.unwrap();
    let appeal = game.evaluate_appeal("s1").await.unwrap();

    assert_eq!(oracle.calls(), 2);
    assert_eq!(initial.record.panel_size, 5);
    assert_eq!(appeal.record.panel_size, 50);
    assert!(appeal.tally.is_none());
    assert!(!appeal.record.overturned);
}

#[tokio::test]
async fn test_guard_from_config() {
    let oracle = Arc::new(ScriptedOracle::new(["A"]));
    let mut config = AppealConfig::default();
    config.storage.temporary = true;
    config.escalation.allow_reevaluation = false;
    let game = AppealGame::new(config, oracle).unwrap();

    game.register_scenario(&crate::Scenario::new("s1", "Q", "a", "b", "c"))
        .unwrap();
    assert!(!game.already_evaluated("s1", Tier::Initial).unwrap());
    game.evaluate_initial("s1").await.unwrap();
    assert!(game.already_evaluated("s1", Tier::Initial).unwrap());
    assert!(game.evaluate_initial("s1").await.is_err());
}
