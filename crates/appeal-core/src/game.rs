//! The unified appeal game facade.
//!
//! [`AppealGame`] wires the scenario store, the escalation controller and
//! the round ledger onto one database and exposes the public operation
//! surface. Expected failures come back as `false`, `None` or an empty map;
//! only evaluation of an unknown scenario is an explicit error.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use appeal_council::{
    AppealController, CouncilError, EscalationPolicy, EvaluationOutcome, Oracle, PanelRunner,
};
use appeal_ledger::{LedgerError, RewardTable, RoundLedger, SessionSnapshot, Standing};
use appeal_registry::storage::Storage;
use appeal_registry::{
    EvaluationRecord, EvaluationState, RegistryError, Scenario, ScenarioRegistry, Tier,
};

use crate::{config::AppealConfig, error::AppealError, Result};

/// Record counts across the stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    /// Registered scenarios.
    pub scenarios: usize,
    /// Scenarios with an evaluation on record.
    pub evaluations: usize,
    /// Game sessions.
    pub sessions: usize,
}

/// The optimistic appeal game.
///
/// # Flow
///
/// 1. Register a scenario
/// 2. `evaluate_initial`: small panel rules
/// 3. On dispute, `evaluate_appeal`: large panel re-rules, overturn flagged
/// 4. `record_round` / `update_score` on a session
/// 5. `distribute_rewards` ranks the players
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use appeal_core::{AppealGame, Scenario, StaticOracle, Verdict};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let game = AppealGame::temporary(Arc::new(StaticOracle::new("B"))).unwrap();
/// assert!(game
///     .register_scenario(&Scenario::new("s1", "Which is better?", "cats", "dogs", "Pets"))
///     .unwrap());
///
/// let outcome = game.evaluate_initial("s1").await.unwrap();
/// assert_eq!(outcome.record.verdict, Verdict::B);
/// # });
/// ```
pub struct AppealGame {
    /// Configuration.
    config: AppealConfig,

    /// Scenario store and evaluation records.
    registry: ScenarioRegistry,

    /// Two-tier escalation over the registry.
    controller: AppealController,

    /// Sessions, rounds and scores.
    ledger: RoundLedger,

    /// Reward schedule.
    rewards: RewardTable,
}

impl AppealGame {
    /// Creates a game with the given configuration and oracle.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration is invalid
    /// - The database cannot be opened
    pub fn new(config: AppealConfig, oracle: Arc<dyn Oracle>) -> Result<Self> {
        config.validate()?;

        let db = if config.storage.temporary {
            sled::Config::new().temporary(true).open()?
        } else {
            sled::open(&config.storage.db_path)?
        };

        let registry = ScenarioRegistry::with_storage(Storage::with_db(db.clone())?);

        let policy = EscalationPolicy::new(
            config.escalation.initial_panel_size,
            config.escalation.appeal_panel_size,
        )?;
        let runner = PanelRunner::new(oracle, config.escalation.panel_mode);
        let mut controller = AppealController::with_components(registry.clone(), runner, policy);
        controller.set_allow_reevaluation(config.escalation.allow_reevaluation);

        let ledger = RoundLedger::with_db(db)?.with_max_capacity(config.ledger.max_capacity);
        let rewards = RewardTable::new(config.rewards.table.clone(), config.rewards.flat_reward);

        info!(
            "Appeal game initialized: panels {}/{} ({:?})",
            policy.initial_panel_size(),
            policy.appeal_panel_size(),
            config.escalation.panel_mode
        );

        Ok(Self {
            config,
            registry,
            controller,
            ledger,
            rewards,
        })
    }

    /// Creates a game on an in-memory database with default settings.
    pub fn temporary(oracle: Arc<dyn Oracle>) -> Result<Self> {
        let mut config = AppealConfig::default();
        config.storage.temporary = true;
        Self::new(config, oracle)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &AppealConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Scenarios
    // ------------------------------------------------------------------

    /// Registers a scenario.
    ///
    /// Returns `false` if the id is taken or a required field is empty; the
    /// stored data is left untouched.
    pub fn register_scenario(&self, scenario: &Scenario) -> Result<bool> {
        match self.registry.register(scenario) {
            Ok(()) => Ok(true),
            Err(RegistryError::AlreadyExists(_) | RegistryError::InvalidScenario(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetches a scenario.
    pub fn get_scenario(&self, id: &str) -> Result<Option<Scenario>> {
        match self.registry.lookup(id) {
            Ok(scenario) => Ok(Some(scenario)),
            Err(RegistryError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Lists scenario ids.
    pub fn list_scenarios(&self) -> Result<Vec<String>> {
        Ok(self.registry.list()?)
    }

    // ------------------------------------------------------------------
    // Escalation
    // ------------------------------------------------------------------

    /// Runs the small optimistic panel on a scenario.
    ///
    /// # Errors
    ///
    /// - `AppealError::ScenarioNotFound` for an unknown id (no state change)
    /// - `AppealError::Council` if re-evaluation is disabled and the tier
    ///   has already ruled
    pub async fn evaluate_initial(&self, scenario_id: &str) -> Result<EvaluationOutcome> {
        self.controller
            .evaluate_initial(scenario_id)
            .await
            .map_err(map_council)
    }

    /// Runs the large appeal panel on a scenario.
    ///
    /// # Errors
    ///
    /// As [`evaluate_initial`](Self::evaluate_initial).
    pub async fn evaluate_appeal(&self, scenario_id: &str) -> Result<EvaluationOutcome> {
        self.controller
            .evaluate_appeal(scenario_id)
            .await
            .map_err(map_council)
    }

    /// Latest evaluation record for a scenario.
    pub fn get_evaluation(&self, scenario_id: &str) -> Result<Option<EvaluationRecord>> {
        Ok(self.registry.evaluation(scenario_id)?)
    }

    /// Escalation state of a scenario.
    pub fn evaluation_state(&self, scenario_id: &str) -> Result<EvaluationState> {
        Ok(self.controller.state(scenario_id)?)
    }

    /// Returns true if `tier` already has a ruling on record.
    pub fn already_evaluated(&self, scenario_id: &str, tier: Tier) -> Result<bool> {
        Ok(self.controller.already_evaluated(scenario_id, tier)?)
    }

    // ------------------------------------------------------------------
    // Ledger
    // ------------------------------------------------------------------

    /// Creates a session. Returns `false` for a taken id or a capacity
    /// outside `[1, max_capacity]`.
    pub fn create_session(&self, id: &str, capacity: u32) -> Result<bool> {
        ledger_outcome(self.ledger.create_session(id, capacity))
    }

    /// Records a round. Returns `false` for an unknown session or a ruling
    /// outside `{"A", "B"}`; the round counter is then unchanged.
    pub fn record_round(
        &self,
        session_id: &str,
        scenario_id: &str,
        initial_ruling: &str,
        final_ruling: &str,
        appeal_triggered: bool,
        validator_count: u32,
    ) -> Result<bool> {
        ledger_outcome(self.ledger.record_round(
            session_id,
            scenario_id,
            initial_ruling,
            final_ruling,
            appeal_triggered,
            validator_count,
        ))
    }

    /// Adds `delta` to a player's score. Returns `false` for an unknown
    /// session or an empty player id.
    pub fn update_score(&self, session_id: &str, player: &str, delta: i64) -> Result<bool> {
        ledger_outcome(self.ledger.update_score(session_id, player, delta))
    }

    /// Snapshot of a session.
    pub fn get_session_state(&self, session_id: &str) -> Result<Option<SessionSnapshot>> {
        Ok(self.ledger.get_state(session_id)?)
    }

    /// Lists session ids.
    pub fn list_sessions(&self) -> Result<Vec<String>> {
        Ok(self.ledger.list_sessions()?)
    }

    // ------------------------------------------------------------------
    // Rewards
    // ------------------------------------------------------------------

    /// Reward per player for the session's current scores.
    ///
    /// Empty for an unknown session. Calling twice without a score change
    /// gives the same mapping.
    pub fn distribute_rewards(&self, session_id: &str) -> Result<BTreeMap<String, u64>> {
        Ok(self
            .ledger
            .get_state(session_id)?
            .map(|session| self.rewards.distribute(&session))
            .unwrap_or_default())
    }

    /// Ranked players with their rewards. Empty for an unknown session.
    pub fn standings(&self, session_id: &str) -> Result<Vec<Standing>> {
        Ok(self
            .ledger
            .get_state(session_id)?
            .map(|session| self.rewards.standings(&session))
            .unwrap_or_default())
    }

    // ------------------------------------------------------------------
    // Housekeeping
    // ------------------------------------------------------------------

    /// Record counts.
    pub fn stats(&self) -> GameStats {
        GameStats {
            scenarios: self.registry.len(),
            evaluations: self.registry.evaluation_count(),
            sessions: self.ledger.session_count(),
        }
    }

    /// Flushes pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.registry.flush()?;
        self.ledger.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for AppealGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppealGame")
            .field("controller", &self.controller)
            .field("ledger", &self.ledger)
            .finish()
    }
}

fn map_council(err: CouncilError) -> AppealError {
    match err {
        CouncilError::ScenarioNotFound(id) => AppealError::ScenarioNotFound(id),
        other => other.into(),
    }
}

/// Folds expected ledger rejections into `Ok(false)`.
fn ledger_outcome<T>(result: appeal_ledger::Result<T>) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(LedgerError::Database(e)) => Err(LedgerError::Database(e).into()),
        Err(LedgerError::Serialization(e)) => Err(LedgerError::Serialization(e).into()),
        Err(rejected) => {
            debug!("Ledger rejected request: {}", rejected);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appeal_council::StaticOracle;
    use appeal_registry::Verdict;

    fn game(response: &str) -> AppealGame {
        AppealGame::temporary(Arc::new(StaticOracle::new(response))).unwrap()
    }

    fn cats_and_dogs() -> Scenario {
        Scenario::new("s1", "Which is better?", "cats", "dogs", "Pets")
    }

    #[test]
    fn test_register_and_get() {
        let game = game("A");
        assert!(game.register_scenario(&cats_and_dogs()).unwrap());
        assert!(!game.register_scenario(&cats_and_dogs()).unwrap());
        assert!(!game
            .register_scenario(&Scenario::new("s2", "", "a", "b", "c"))
            .unwrap());

        assert_eq!(game.get_scenario("s1").unwrap(), Some(cats_and_dogs()));
        assert_eq!(game.get_scenario("s2").unwrap(), None);
        assert_eq!(game.list_scenarios().unwrap(), vec!["s1"]);
    }

    #[tokio::test]
    async fn test_unknown_scenario_is_explicit_error() {
        let game = game("A");
        let err = game.evaluate_initial("ghost").await.unwrap_err();
        assert!(matches!(err, AppealError::ScenarioNotFound(ref id) if id == "ghost"));
        assert!(game.get_evaluation("ghost").unwrap().is_none());
        assert_eq!(game.stats().evaluations, 0);
    }

    #[test]
    fn test_ledger_rejections_are_false() {
        let game = game("A");
        assert!(game.create_session("g1", 3).unwrap());
        assert!(!game.create_session("g1", 3).unwrap());
        assert!(!game.create_session("g2", 0).unwrap());
        assert!(!game.create_session("g3", 201).unwrap());
        assert!(!game.create_session("", 3).unwrap());
        assert!(game.get_session_state("").unwrap().is_none());

        assert!(!game.record_round("g1", "s1", "X", "A", false, 5).unwrap());
        assert!(!game.record_round("nope", "s1", "A", "A", false, 5).unwrap());
        assert!(game.record_round("g1", "s1", "A", "A", false, 5).unwrap());

        assert!(!game.update_score("g1", "", 5).unwrap());
        assert!(!game.update_score("nope", "p1", 5).unwrap());
        assert!(game.update_score("g1", "p1", 5).unwrap());

        assert!(game.get_session_state("nope").unwrap().is_none());
        assert!(game.distribute_rewards("nope").unwrap().is_empty());
        assert!(game.standings("nope").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AppealConfig::default();
        config.storage.temporary = true;
        config.escalation.appeal_panel_size = 3;
        let result = AppealGame::new(config, Arc::new(StaticOracle::new("A")));
        assert!(matches!(result, Err(AppealError::Config(_))));
    }

    #[tokio::test]
    async fn test_stats() {
        let game = game("B");
        game.register_scenario(&cats_and_dogs()).unwrap();
        game.register_scenario(&Scenario::new("s2", "Q", "x", "y", "Misc"))
            .unwrap();
        game.evaluate_initial("s1").await.unwrap();
        game.create_session("g1", 2).unwrap();

        assert_eq!(
            game.stats(),
            GameStats {
                scenarios: 2,
                evaluations: 1,
                sessions: 1,
            }
        );
        assert_eq!(
            game.get_evaluation("s1").unwrap().unwrap().verdict,
            Verdict::B
        );
    }
}
