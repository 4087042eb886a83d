//! # Scenario Registry - Main Facade
//!
//! Coordinates validation, fingerprinting and storage into the Scenario
//! Store contract: write-once registration, verified lookup, listing, plus
//! the per-scenario evaluation slot used by the escalation controller.
//!
//! ## Architecture
//!
//! ```text
//!                ┌────────────────────┐
//!                │  ScenarioRegistry  │
//!                │      (Facade)      │
//!                └─────────┬──────────┘
//!                          │
//!          ┌───────────────┼───────────────┐
//!          ▼               ▼               ▼
//!    ┌──────────┐   ┌─────────────┐  ┌──────────┐
//!    │ Validate │   │ Fingerprint │  │ Storage  │
//!    │          │   │  (SHA-256)  │  │  (Sled)  │
//!    └──────────┘   └─────────────┘  └──────────┘
//! ```

use crate::fingerprint::fingerprint_scenario;
use crate::models::{EvaluationRecord, EvaluationState, RegistryError, Result, Scenario, Tier};
use crate::storage::Storage;
use std::path::Path;
use tracing::{debug, info, warn};

/// The Scenario Store.
///
/// Cheap to clone: clones share the same underlying database, which makes
/// it safe to hand one copy to the escalation controller and keep another
/// for read-only queries.
///
/// # Example
///
/// ```rust
/// use appeal_registry::{ScenarioRegistry, Scenario, RegistryError};
///
/// let registry = ScenarioRegistry::temporary().unwrap();
/// let scenario = Scenario::new("s1", "Which is better?", "cats", "dogs", "Pets");
///
/// registry.register(&scenario).unwrap();
/// assert!(matches!(
///     registry.register(&scenario),
///     Err(RegistryError::AlreadyExists(_))
/// ));
///
/// let loaded = registry.lookup("s1").unwrap();
/// assert_eq!(loaded.option_b, "dogs");
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRegistry {
    storage: Storage,
}

impl ScenarioRegistry {
    /// Opens a registry backed by a database directory.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            storage: Storage::open(path)?,
        })
    }

    /// Creates an in-memory registry.
    pub fn temporary() -> Result<Self> {
        Ok(Self {
            storage: Storage::temporary()?,
        })
    }

    /// Wraps existing storage.
    pub fn with_storage(storage: Storage) -> Self {
        Self { storage }
    }

    /// Registers a scenario.
    ///
    /// # Errors
    ///
    /// - `RegistryError::InvalidScenario` if the id, question or either
    ///   option is empty
    /// - `RegistryError::AlreadyExists` if the id is taken; the stored
    ///   scenario is not modified
    pub fn register(&self, scenario: &Scenario) -> Result<()> {
        scenario.validate()?;

        let fingerprint = fingerprint_scenario(scenario);
        if !self.storage.insert_scenario(scenario, fingerprint)? {
            debug!("Rejected duplicate scenario: {}", scenario.id);
            return Err(RegistryError::AlreadyExists(scenario.id.clone()));
        }

        info!(
            "Registered scenario '{}' in category '{}'",
            scenario.id, scenario.category
        );
        Ok(())
    }

    /// Fetches a scenario, verifying its fingerprint.
    ///
    /// # Errors
    ///
    /// - `RegistryError::NotFound` if the id is unknown
    /// - `RegistryError::IntegrityViolation` if the stored record no longer
    ///   matches the fingerprint taken at registration
    pub fn lookup(&self, id: &str) -> Result<Scenario> {
        let (scenario, expected) = self
            .storage
            .load_scenario(id)?
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        if fingerprint_scenario(&scenario) != expected || scenario.id != id {
            warn!("Fingerprint mismatch for scenario '{}'", id);
            return Err(RegistryError::IntegrityViolation(id.to_string()));
        }

        Ok(scenario)
    }

    /// Lists registered scenario ids (lexicographic order).
    pub fn list(&self) -> Result<Vec<String>> {
        self.storage.list_scenarios()
    }

    /// Returns true if the id is registered.
    pub fn contains(&self, id: &str) -> Result<bool> {
        self.storage.contains_scenario(id)
    }

    /// Number of registered scenarios.
    pub fn len(&self) -> usize {
        self.storage.scenario_count()
    }

    /// Returns true if no scenarios are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persists an evaluation record, superseding the previous one.
    pub fn record_evaluation(&self, record: &EvaluationRecord) -> Result<()> {
        self.storage.store_evaluation(record)?;
        debug!(
            "Stored {} evaluation for '{}': {}",
            record.tier, record.scenario_id, record.verdict
        );
        Ok(())
    }

    /// Latest evaluation record for a scenario, if any.
    pub fn evaluation(&self, scenario_id: &str) -> Result<Option<EvaluationRecord>> {
        self.storage.load_evaluation(scenario_id)
    }

    /// Where the scenario sits in the escalation state machine.
    pub fn evaluation_state(&self, scenario_id: &str) -> Result<EvaluationState> {
        let record = self.evaluation(scenario_id)?;
        Ok(EvaluationState::from(record.as_ref()))
    }

    /// Returns true if a ruling for the given tier (or a later one) is on
    /// record.
    ///
    /// An appeal ruling counts as evaluated for both tiers; an initial ruling
    /// only for [`Tier::Initial`].
    pub fn already_evaluated(&self, scenario_id: &str, tier: Tier) -> Result<bool> {
        let state = self.evaluation_state(scenario_id)?;
        Ok(match tier {
            Tier::Initial => state != EvaluationState::Unevaluated,
            Tier::Appeal => state == EvaluationState::AppealRuled,
        })
    }

    /// Number of scenarios with an evaluation on record.
    pub fn evaluation_count(&self) -> usize {
        self.storage.evaluation_count()
    }

    /// Flushes pending writes to disk.
    pub fn flush(&self) -> Result<usize> {
        self.storage.flush()
    }

    #[cfg(test)]
    pub(crate) fn storage(&self) -> &Storage {
        &self.storage
    }
}
