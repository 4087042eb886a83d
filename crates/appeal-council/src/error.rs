//! Error types for the appeal council.
//!
//! Malformed oracle output is deliberately absent: it is recovered by the
//! ruling normalization rule and never reaches a caller as an error.

use appeal_registry::{RegistryError, Tier};
use thiserror::Error;

/// Errors that can occur during panel evaluation and escalation.
#[derive(Debug, Error)]
pub enum CouncilError {
    /// The scenario id is not registered.
    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    /// Re-evaluation is disabled and a ruling for this tier is on record.
    #[error("Scenario '{scenario_id}' already has a {tier} ruling")]
    AlreadyEvaluated {
        /// Scenario that was already judged.
        scenario_id: String,
        /// Tier that was requested.
        tier: Tier,
    },

    /// Panel sizes violate the escalation policy.
    #[error("Invalid escalation policy: {0}")]
    InvalidPolicy(String),

    /// Scenario store failure passthrough.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Failure reported by an oracle for a single invocation.
#[derive(Debug, Clone, Error)]
#[error("Oracle call failed: {0}")]
pub struct OracleError(pub String);
