//! # Appeal Registry - Scenario Store
//!
//! Write-once storage for the binary questions put to evaluator panels, and
//! the per-scenario slot holding the latest panel ruling.
//!
//! ## Purpose
//!
//! 1. **Scenario Store** - `register` / `lookup` / `list` over immutable
//!    scenarios. Duplicate or incomplete registrations are rejected without
//!    touching stored data.
//!
//! 2. **Evaluation Records** - the latest [`EvaluationRecord`] per scenario,
//!    overwritten by each escalation tier.
//!
//! 3. **Shared Vocabulary** - [`Verdict`], [`Tier`] and [`EvaluationState`]
//!    used by the council and ledger crates.
//!
//! ## Data Flow
//!
//! ```text
//!   register(scenario) ──▶ validate ──▶ fingerprint ──▶ CAS insert (sled)
//!   lookup(id)         ──▶ load ──▶ re-fingerprint ──▶ Scenario | error
//!   record_evaluation  ──▶ overwrite evaluations[scenario_id]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use appeal_registry::{EvaluationRecord, Scenario, ScenarioRegistry, Verdict};
//!
//! let registry = ScenarioRegistry::temporary().unwrap();
//! registry
//!     .register(&Scenario::new("s1", "Which is better?", "cats", "dogs", "Pets"))
//!     .unwrap();
//!
//! registry
//!     .record_evaluation(&EvaluationRecord::initial("s1", Verdict::A, 5))
//!     .unwrap();
//!
//! assert_eq!(registry.evaluation("s1").unwrap().unwrap().verdict, Verdict::A);
//! ```
//!
//! ## Notes
//!
//! - Scenarios have no update or delete operation.
//! - No referential integrity is enforced between evaluation records or
//!   ledger rounds and this store beyond the scenario id key.

pub mod fingerprint;
pub mod models;
pub mod registry;
pub mod storage;

pub use models::{
    EvaluationRecord, EvaluationState, Fingerprint, RegistryError, Result, Scenario, Tier,
    Verdict, DEFAULT_VERDICT,
};
pub use registry::ScenarioRegistry;
