//! Configuration types for the appeal game.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use appeal_council::{PanelMode, MAX_PANEL_SIZE};
use appeal_ledger::{DEFAULT_FLAT_REWARD, DEFAULT_MAX_CAPACITY, DEFAULT_REWARD_TABLE};

use crate::error::AppealError;
use crate::Result;

/// Configuration for the appeal game facade.
///
/// Every section has defaults, so a partial JSON document is enough:
///
/// ```rust
/// use appeal_core::AppealConfig;
///
/// let config = AppealConfig::from_json_str(r#"{"escalation": {"appeal_panel_size": 25}}"#)?;
/// assert_eq!(config.escalation.initial_panel_size, 5);
/// assert_eq!(config.escalation.appeal_panel_size, 25);
/// # Ok::<(), appeal_core::AppealError>(())
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppealConfig {
    /// Persistence settings.
    pub storage: StorageConfig,

    /// Panel sizes and escalation behaviour.
    pub escalation: EscalationConfig,

    /// Round ledger settings.
    pub ledger: LedgerConfig,

    /// Reward schedule.
    pub rewards: RewardConfig,
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database directory.
    pub db_path: PathBuf,

    /// Use an in-memory database discarded on drop.
    pub temporary: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./appeal_game.db"),
            temporary: false,
        }
    }
}

/// Panel sizes and escalation behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Evaluators in the optimistic first panel.
    pub initial_panel_size: usize,

    /// Evaluators in the appeal panel. Must exceed `initial_panel_size`.
    pub appeal_panel_size: usize,

    /// Whether panels vote locally or defer to the oracle's own agreement.
    pub panel_mode: PanelMode,

    /// Permit re-running a tier that already has a ruling on record.
    pub allow_reevaluation: bool,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            initial_panel_size: 5,
            appeal_panel_size: 50,
            panel_mode: PanelMode::Independent,
            allow_reevaluation: true,
        }
    }
}

/// Round ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Largest accepted player capacity (the smallest is always 1).
    pub max_capacity: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_MAX_CAPACITY,
        }
    }
}

/// Reward schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Reward for ranks 1..=table.len().
    pub table: Vec<u64>,

    /// Reward for every rank past the table.
    pub flat_reward: u64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_REWARD_TABLE.to_vec(),
            flat_reward: DEFAULT_FLAT_REWARD,
        }
    }
}

impl AppealConfig {
    /// Parses a JSON configuration document and validates it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| AppealError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| AppealError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// `AppealError::Config` if the initial panel is empty, the appeal
    /// panel does not exceed it, or the ledger accepts no capacity at all.
    pub fn validate(&self) -> Result<()> {
        let escalation = &self.escalation;
        if escalation.initial_panel_size == 0 {
            return Err(AppealError::Config(
                "escalation.initial_panel_size must be at least 1".to_string(),
            ));
        }
        if escalation.appeal_panel_size <= escalation.initial_panel_size {
            return Err(AppealError::Config(format!(
                "escalation.appeal_panel_size ({}) must exceed initial_panel_size ({})",
                escalation.appeal_panel_size, escalation.initial_panel_size
            )));
        }
        if escalation.appeal_panel_size > MAX_PANEL_SIZE {
            return Err(AppealError::Config(format!(
                "escalation.appeal_panel_size ({}) exceeds {}",
                escalation.appeal_panel_size, MAX_PANEL_SIZE
            )));
        }
        if self.ledger.max_capacity == 0 {
            return Err(AppealError::Config(
                "ledger.max_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
