//! Appeal escalation controller.
//!
//! Drives the two-tier evaluation cycle for each scenario:
//!
//! ```text
//!   Unevaluated ──evaluate_initial──▶ InitiallyRuled ──evaluate_appeal──▶ AppealRuled
//!        │                                                                  │
//!        └────────────────────────evaluate_appeal───────────────────────────┘
//!                          (previous verdict absent, never overturned)
//! ```
//!
//! The initial tier convenes a small panel; the appeal tier convenes a panel
//! at least one evaluator larger, shows it the ruling under appeal, and
//! flags the outcome as overturned when the two verdicts differ.
//!
//! Each cycle holds a per-scenario lock from the moment the previous verdict
//! is read until the new record is written. Different scenarios proceed
//! concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use appeal_registry::{
    EvaluationRecord, EvaluationState, RegistryError, Scenario, ScenarioRegistry, Tier,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use crate::error::CouncilError;
use crate::oracle::Oracle;
use crate::panel::{PanelMode, PanelRunner, PanelTally};
use crate::prompt::{render_appeal, render_initial};
use crate::Result;

/// Default size of the optimistic first-pass panel.
pub const DEFAULT_INITIAL_PANEL_SIZE: usize = 5;

/// Default size of the appeal panel.
pub const DEFAULT_APPEAL_PANEL_SIZE: usize = 50;

/// Largest panel either tier may convene. Each evaluator is one task.
pub const MAX_PANEL_SIZE: usize = 1000;

/// Panel sizes for the two tiers.
///
/// Invariant: `0 < initial_panel_size < appeal_panel_size <= MAX_PANEL_SIZE`.
/// Deserialization goes through [`EscalationPolicy::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PolicySizes")]
pub struct EscalationPolicy {
    initial_panel_size: usize,
    appeal_panel_size: usize,
}

#[derive(Deserialize)]
struct PolicySizes {
    initial_panel_size: usize,
    appeal_panel_size: usize,
}

impl TryFrom<PolicySizes> for EscalationPolicy {
    type Error = CouncilError;

    fn try_from(sizes: PolicySizes) -> Result<Self> {
        Self::new(sizes.initial_panel_size, sizes.appeal_panel_size)
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            initial_panel_size: DEFAULT_INITIAL_PANEL_SIZE,
            appeal_panel_size: DEFAULT_APPEAL_PANEL_SIZE,
        }
    }
}

impl EscalationPolicy {
    /// Creates a policy, checking the size invariant.
    ///
    /// # Errors
    ///
    /// Returns `CouncilError::InvalidPolicy` if the initial panel is empty,
    /// the appeal panel is not strictly larger, or the appeal panel exceeds
    /// [`MAX_PANEL_SIZE`].
    pub fn new(initial_panel_size: usize, appeal_panel_size: usize) -> Result<Self> {
        if initial_panel_size == 0 {
            return Err(CouncilError::InvalidPolicy(
                "initial panel must have at least one evaluator".to_string(),
            ));
        }
        if appeal_panel_size <= initial_panel_size {
            return Err(CouncilError::InvalidPolicy(format!(
                "appeal panel ({}) must be larger than initial panel ({})",
                appeal_panel_size, initial_panel_size
            )));
        }
        if appeal_panel_size > MAX_PANEL_SIZE {
            return Err(CouncilError::InvalidPolicy(format!(
                "appeal panel ({}) exceeds the limit of {}",
                appeal_panel_size, MAX_PANEL_SIZE
            )));
        }
        Ok(Self {
            initial_panel_size,
            appeal_panel_size,
        })
    }

    /// Evaluators convened for the initial tier.
    pub fn initial_panel_size(&self) -> usize {
        self.initial_panel_size
    }

    /// Evaluators convened for the appeal tier.
    pub fn appeal_panel_size(&self) -> usize {
        self.appeal_panel_size
    }

    fn panel_size(&self, tier: Tier) -> usize {
        match tier {
            Tier::Initial => self.initial_panel_size,
            Tier::Appeal => self.appeal_panel_size,
        }
    }
}

/// What one tier produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    /// The record now stored for the scenario.
    pub record: EvaluationRecord,
    /// Vote counts, when the panel ran in independent mode.
    pub tally: Option<PanelTally>,
}

/// Orchestrates initial and appeal panels over registered scenarios.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use appeal_council::{AppealController, StaticOracle};
/// use appeal_registry::{Scenario, ScenarioRegistry, Verdict};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let registry = ScenarioRegistry::temporary().unwrap();
/// registry
///     .register(&Scenario::new("s1", "Which is better?", "cats", "dogs", "Pets"))
///     .unwrap();
///
/// let controller = AppealController::new(registry, Arc::new(StaticOracle::new("A")));
/// let outcome = controller.evaluate_initial("s1").await.unwrap();
/// assert_eq!(outcome.record.verdict, Verdict::A);
/// assert_eq!(outcome.record.panel_size, 5);
/// # });
/// ```
pub struct AppealController {
    registry: ScenarioRegistry,
    runner: PanelRunner,
    policy: EscalationPolicy,
    allow_reevaluation: bool,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl AppealController {
    /// Creates a controller with the default policy and independent panels.
    pub fn new(registry: ScenarioRegistry, oracle: Arc<dyn Oracle>) -> Self {
        Self::with_components(
            registry,
            PanelRunner::new(oracle, PanelMode::default()),
            EscalationPolicy::default(),
        )
    }

    /// Creates a controller with custom components.
    pub fn with_components(
        registry: ScenarioRegistry,
        runner: PanelRunner,
        policy: EscalationPolicy,
    ) -> Self {
        Self {
            registry,
            runner,
            policy,
            allow_reevaluation: true,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Enables or disables re-evaluation of already-ruled tiers.
    pub fn set_allow_reevaluation(&mut self, allow: bool) {
        self.allow_reevaluation = allow;
    }

    /// Returns whether re-evaluation is permitted.
    pub fn allow_reevaluation(&self) -> bool {
        self.allow_reevaluation
    }

    /// Returns the escalation policy.
    pub fn policy(&self) -> EscalationPolicy {
        self.policy
    }

    /// Returns the scenario registry.
    pub fn registry(&self) -> &ScenarioRegistry {
        &self.registry
    }

    /// Runs the small optimistic panel.
    ///
    /// # Errors
    ///
    /// - `CouncilError::ScenarioNotFound` for an unknown id (nothing is
    ///   called or written)
    /// - `CouncilError::AlreadyEvaluated` if re-evaluation is disabled and a
    ///   record exists
    /// - `CouncilError::Registry` on storage faults
    pub async fn evaluate_initial(&self, scenario_id: &str) -> Result<EvaluationOutcome> {
        self.evaluate(scenario_id, Tier::Initial).await
    }

    /// Runs the large appeal panel against the current ruling.
    ///
    /// Works without a prior initial ruling; the outcome is then never
    /// marked overturned.
    ///
    /// # Errors
    ///
    /// As [`evaluate_initial`](Self::evaluate_initial); the re-evaluation
    /// guard trips only when an appeal ruling is already on record.
    pub async fn evaluate_appeal(&self, scenario_id: &str) -> Result<EvaluationOutcome> {
        self.evaluate(scenario_id, Tier::Appeal).await
    }

    /// Current escalation state of a scenario.
    pub fn state(&self, scenario_id: &str) -> Result<EvaluationState> {
        Ok(self.registry.evaluation_state(scenario_id)?)
    }

    /// Returns true if a ruling for `tier` is already on record.
    pub fn already_evaluated(&self, scenario_id: &str, tier: Tier) -> Result<bool> {
        Ok(self.registry.already_evaluated(scenario_id, tier)?)
    }

    async fn evaluate(&self, scenario_id: &str, tier: Tier) -> Result<EvaluationOutcome> {
        let scenario = self.resolve(scenario_id)?;

        let lock = self.scenario_lock(scenario_id);
        let _guard = lock.lock().await;

        if !self.allow_reevaluation && self.registry.already_evaluated(scenario_id, tier)? {
            debug!("Refusing {} re-evaluation of '{}'", tier, scenario_id);
            return Err(CouncilError::AlreadyEvaluated {
                scenario_id: scenario_id.to_string(),
                tier,
            });
        }

        let panel_size = self.policy.panel_size(tier);
        let (record, tally) = match tier {
            Tier::Initial => {
                let outcome = self.runner.run(&render_initial(&scenario), panel_size).await;
                let record = EvaluationRecord::initial(scenario_id, outcome.verdict, panel_size);
                (record, outcome.tally)
            }
            Tier::Appeal => {
                let previous = self.registry.evaluation(scenario_id)?.map(|r| r.verdict);
                let prompt = render_appeal(&scenario, previous);
                let outcome = self.runner.run(&prompt, panel_size).await;
                let record =
                    EvaluationRecord::appeal(scenario_id, outcome.verdict, panel_size, previous);
                (record, outcome.tally)
            }
        };

        self.registry.record_evaluation(&record)?;
        info!(
            "Scenario '{}' {} ruling: {} (panel {}, overturned: {})",
            scenario_id,
            tier.method(),
            record.verdict,
            panel_size,
            record.overturned
        );

        Ok(EvaluationOutcome { record, tally })
    }

    fn resolve(&self, scenario_id: &str) -> Result<Scenario> {
        match self.registry.lookup(scenario_id) {
            Ok(scenario) => Ok(scenario),
            Err(RegistryError::NotFound(_)) => {
                debug!("Evaluation requested for unknown scenario '{}'", scenario_id);
                Err(CouncilError::ScenarioNotFound(scenario_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn scenario_lock(&self, scenario_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Drop entries nobody is holding or waiting on.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(scenario_id.to_string()).or_default())
    }
}

impl std::fmt::Debug for AppealController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppealController")
            .field("runner", &self.runner)
            .field("policy", &self.policy)
            .field("allow_reevaluation", &self.allow_reevaluation)
            .finish()
    }
}
