//! # Persistent Storage Layer
//!
//! This module provides the persistence boundary using Sled, an embedded
//! ordered key-value database. It stores scenarios with their fingerprints
//! and the latest evaluation record for each scenario.
//!
//! ## Storage Structure
//!
//! | Tree | Key | Value | Purpose |
//! |------|-----|-------|---------|
//! | `scenarios` | scenario id | JSON `{scenario, fingerprint}` | Write-once metadata |
//! | `evaluations` | scenario id | JSON `EvaluationRecord` | Latest ruling per scenario |
//!
//! Records are structured JSON rather than delimiter-joined strings, so
//! field text may contain any character.
//!
//! ## Atomicity
//!
//! Scenario insertion is a compare-and-swap against an absent key: two
//! concurrent registrations of the same id cannot both succeed. Evaluation
//! records are plain overwrites; serializing them per scenario is the
//! escalation controller's job.
//!
//! ## References
//!
//! - Sled documentation: <https://sled.rs/>

use crate::models::{EvaluationRecord, Fingerprint, Result, Scenario};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tree name for scenario metadata.
const SCENARIO_TREE: &str = "scenarios";

/// Tree name for evaluation records.
const EVALUATION_TREE: &str = "evaluations";

#[derive(Serialize, Deserialize)]
struct StoredScenario {
    scenario: Scenario,
    fingerprint: Fingerprint,
}

/// Wrapper around a Sled database for scenario and evaluation storage.
///
/// # Thread Safety
///
/// The underlying Sled database is thread-safe and `Storage` is cheap to
/// clone; clones share the same trees.
///
/// # Example
///
/// ```rust
/// use appeal_registry::storage::Storage;
/// use appeal_registry::fingerprint::fingerprint_scenario;
/// use appeal_registry::Scenario;
///
/// let storage = Storage::temporary().unwrap();
/// let scenario = Scenario::new("s1", "Which is better?", "cats", "dogs", "Pets");
///
/// assert!(storage.insert_scenario(&scenario, fingerprint_scenario(&scenario)).unwrap());
/// assert!(!storage.insert_scenario(&scenario, fingerprint_scenario(&scenario)).unwrap());
/// ```
#[derive(Clone)]
pub struct Storage {
    /// The underlying Sled database.
    db: sled::Db,

    /// Tree for scenario metadata.
    scenarios: sled::Tree,

    /// Tree for evaluation records.
    evaluations: sled::Tree,
}

impl Storage {
    /// Opens or creates a storage database at the given path.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Database` if the path is unusable or the
    /// database is locked by another process.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_db(sled::open(path)?)
    }

    /// Creates a temporary in-memory storage for testing.
    ///
    /// The database is discarded when the last clone is dropped.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::with_db(db)
    }

    /// Builds storage on an already-open database.
    ///
    /// Lets several components share one database file, each in its own
    /// trees.
    pub fn with_db(db: sled::Db) -> Result<Self> {
        let scenarios = db.open_tree(SCENARIO_TREE)?;
        let evaluations = db.open_tree(EVALUATION_TREE)?;

        Ok(Storage {
            db,
            scenarios,
            evaluations,
        })
    }

    /// Stores a scenario if its id is not already taken.
    ///
    /// # Returns
    ///
    /// `true` if the scenario was written, `false` if the id was already
    /// present (the existing record is left untouched).
    pub fn insert_scenario(&self, scenario: &Scenario, fingerprint: Fingerprint) -> Result<bool> {
        let value = serde_json::to_vec(&StoredScenario {
            scenario: scenario.clone(),
            fingerprint,
        })?;

        let swapped = self.scenarios.compare_and_swap(
            scenario.id.as_bytes(),
            None as Option<&[u8]>,
            Some(value),
        )?;

        Ok(swapped.is_ok())
    }

    /// Loads a scenario and the fingerprint recorded at registration.
    pub fn load_scenario(&self, id: &str) -> Result<Option<(Scenario, Fingerprint)>> {
        match self.scenarios.get(id.as_bytes())? {
            Some(bytes) => {
                let stored: StoredScenario = serde_json::from_slice(&bytes)?;
                Ok(Some((stored.scenario, stored.fingerprint)))
            }
            None => Ok(None),
        }
    }

    /// Lists registered scenario ids in lexicographic byte order.
    pub fn list_scenarios(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();

        for key in self.scenarios.iter().keys() {
            let key = key?;
            ids.push(String::from_utf8_lossy(&key).into_owned());
        }

        Ok(ids)
    }

    /// Checks whether a scenario id is registered.
    pub fn contains_scenario(&self, id: &str) -> Result<bool> {
        Ok(self.scenarios.contains_key(id.as_bytes())?)
    }

    /// Returns the number of registered scenarios.
    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Stores an evaluation record, replacing any previous record for the
    /// same scenario.
    pub fn store_evaluation(&self, record: &EvaluationRecord) -> Result<()> {
        let value = serde_json::to_vec(record)?;
        self.evaluations
            .insert(record.scenario_id.as_bytes(), value)?;
        Ok(())
    }

    /// Loads the latest evaluation record for a scenario.
    pub fn load_evaluation(&self, scenario_id: &str) -> Result<Option<EvaluationRecord>> {
        match self.evaluations.get(scenario_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Returns the number of scenarios with an evaluation on record.
    pub fn evaluation_count(&self) -> usize {
        self.evaluations.len()
    }

    /// Flushes all pending writes to disk.
    ///
    /// # Returns
    ///
    /// The number of bytes flushed.
    pub fn flush(&self) -> Result<usize> {
        Ok(self.db.flush()?)
    }

    #[cfg(test)]
    pub(crate) fn put_raw_scenario(&self, id: &str, scenario: &Scenario, fingerprint: Fingerprint) {
        let value = serde_json::to_vec(&StoredScenario {
            scenario: scenario.clone(),
            fingerprint,
        })
        .unwrap();
        self.scenarios.insert(id.as_bytes(), value).unwrap();
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("scenarios", &self.scenario_count())
            .field("evaluations", &self.evaluation_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint_scenario;
    use crate::models::Verdict;

    fn make_scenario(id: &str) -> Scenario {
        Scenario::new(id, format!("Question {}", id), "yes", "no", "test")
    }

    #[test]
    fn test_temporary_storage() {
        let storage = Storage::temporary().unwrap();
        assert_eq!(storage.scenario_count(), 0);
        assert_eq!(storage.evaluation_count(), 0);
    }

    #[test]
    fn test_insert_and_load() {
        let storage = Storage::temporary().unwrap();
        let scenario = make_scenario("s1").with_context("some context");
        let fp = fingerprint_scenario(&scenario);

        assert!(storage.insert_scenario(&scenario, fp).unwrap());

        let (loaded, loaded_fp) = storage.load_scenario("s1").unwrap().unwrap();
        assert_eq!(loaded, scenario);
        assert_eq!(loaded_fp, fp);
    }

    #[test]
    fn test_insert_is_write_once() {
        let storage = Storage::temporary().unwrap();
        let first = make_scenario("s1");
        let mut second = make_scenario("s1");
        second.question = "Replacement".to_string();

        assert!(storage
            .insert_scenario(&first, fingerprint_scenario(&first))
            .unwrap());
        assert!(!storage
            .insert_scenario(&second, fingerprint_scenario(&second))
            .unwrap());

        let (loaded, _) = storage.load_scenario("s1").unwrap().unwrap();
        assert_eq!(loaded.question, "Question s1");
    }

    #[test]
    fn test_load_nonexistent() {
        let storage = Storage::temporary().unwrap();
        assert!(storage.load_scenario("missing").unwrap().is_none());
        assert!(storage.load_evaluation("missing").unwrap().is_none());
    }

    #[test]
    fn test_list_scenarios() {
        let storage = Storage::temporary().unwrap();
        for id in ["gamma", "alpha", "beta"] {
            let s = make_scenario(id);
            storage.insert_scenario(&s, fingerprint_scenario(&s)).unwrap();
        }

        let ids = storage.list_scenarios().unwrap();
        assert_eq!(ids, vec!["alpha", "beta", "gamma"]);
        assert!(storage.contains_scenario("beta").unwrap());
        assert!(!storage.contains_scenario("delta").unwrap());
    }

    #[test]
    fn test_evaluation_overwrite() {
        let storage = Storage::temporary().unwrap();

        storage
            .store_evaluation(&EvaluationRecord::initial("s1", Verdict::A, 5))
            .unwrap();
        storage
            .store_evaluation(&EvaluationRecord::appeal("s1", Verdict::B, 50, Some(Verdict::A)))
            .unwrap();

        let record = storage.load_evaluation("s1").unwrap().unwrap();
        assert_eq!(record.verdict, Verdict::B);
        assert_eq!(record.panel_size, 50);
        assert!(record.overturned);
        assert_eq!(storage.evaluation_count(), 1);
    }

    #[test]
    fn test_shared_db() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let a = Storage::with_db(db.clone()).unwrap();
        let b = Storage::with_db(db).unwrap();

        let s = make_scenario("shared");
        a.insert_scenario(&s, fingerprint_scenario(&s)).unwrap();
        assert!(b.contains_scenario("shared").unwrap());
    }
}
