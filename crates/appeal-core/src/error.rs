//! Error types for the appeal game facade.

use thiserror::Error;

/// Core error type for appeal game operations.
///
/// Expected failures (unknown ids, invalid input) are reported through
/// `Ok(false)` / `Ok(None)` by most facade operations. An `Err` from those
/// operations means storage or configuration trouble.
#[derive(Debug, Error)]
pub enum AppealError {
    /// Evaluation requested for an unregistered scenario.
    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to open the shared database.
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// Registry error passthrough.
    #[error("Registry error: {0}")]
    Registry(#[from] appeal_registry::RegistryError),

    /// Council error passthrough.
    #[error("Council error: {0}")]
    Council(#[from] appeal_council::CouncilError),

    /// Ledger error passthrough.
    #[error("Ledger error: {0}")]
    Ledger(#[from] appeal_ledger::LedgerError),
}
