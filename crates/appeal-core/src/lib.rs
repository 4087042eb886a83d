//! # Appeal Core
//!
//! Optimistic appeal consensus as a game: a cheap panel rules first, a
//! large panel re-rules on dispute, and the ledger keeps score.
//!
//! ## Components
//!
//! | Layer | Component | Responsibility |
//! |-------|-----------|----------------|
//! | Scenarios | Scenario Store | Write-once binary questions, latest ruling per scenario |
//! | Judgment | Panel Runner | N evaluators reduced to one verdict |
//! | Escalation | Appeal Controller | Initial → appeal, overturn detection |
//! | Accounting | Round Ledger | Sessions, rounds, scores |
//! | Accounting | Reward Calculator | Tie-stable ranking, rank-indexed rewards |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        APPEAL CORE                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                    ┌─────────────────┐                          │
//! │                    │   AppealGame    │  ← Unified Facade        │
//! │                    └────────┬────────┘                          │
//! │         ┌───────────────────┼───────────────────┐               │
//! │         ▼                   ▼                   ▼               │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐          │
//! │  │  Scenario   │◀───│   Appeal    │    │   Round     │          │
//! │  │   Store     │    │ Controller  │    │   Ledger    │          │
//! │  └──────┬──────┘    └──────┬──────┘    └──────┬──────┘          │
//! │         │                  ▼                  │                 │
//! │         │           ┌─────────────┐           │                 │
//! │         │           │   Oracle    │           │                 │
//! │         │           └─────────────┘           │                 │
//! │         └──────────────▶ sled ◀───────────────┘                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use appeal_core::{AppealGame, Scenario, ScriptedOracle};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut script = vec!["A"; 5];
//! script.extend(vec!["B"; 50]);
//! let game = AppealGame::temporary(Arc::new(ScriptedOracle::new(script)))?;
//!
//! game.register_scenario(&Scenario::new("s1", "Which is better?", "cats", "dogs", "Pets"))?;
//! game.evaluate_initial("s1").await?;
//! let appeal = game.evaluate_appeal("s1").await?;
//! assert!(appeal.record.overturned);
//!
//! game.create_session("g1", 2)?;
//! game.record_round("g1", "s1", "A", "B", true, 50)?;
//! assert_eq!(game.get_session_state("g1")?.unwrap().current_round, 1);
//! # Ok::<(), appeal_core::AppealError>(())
//! # }).unwrap();
//! ```
//!
//! ## Notes
//!
//! - Evaluating an unknown scenario is an error; every other expected
//!   failure is reported as `false`, `None` or an empty map
//! - Malformed oracle output is never an error: it counts as a vote for `A`
//! - Rounds are not checked against the scenario store
//!
//! ## References
//!
//! - Optimistic rollups and dispute games: <https://ethereum.org/en/developers/docs/scaling/optimistic-rollups/>
//! - Sled embedded database: <https://sled.rs/>

mod config;
mod error;
mod game;

pub use config::{AppealConfig, EscalationConfig, LedgerConfig, RewardConfig, StorageConfig};
pub use error::AppealError;
pub use game::{AppealGame, GameStats};

// Re-export component types for convenience
pub use appeal_council::{
    normalize_ruling, parse_ruling, EvaluationOutcome, Oracle, OracleError, PanelMode,
    PanelTally, ScriptedOracle, StaticOracle,
};
pub use appeal_ledger::{RoundResult, SessionSnapshot, Standing};
pub use appeal_registry::{EvaluationRecord, EvaluationState, Scenario, Tier, Verdict};

/// Core result type for appeal game operations.
pub type Result<T> = std::result::Result<T, AppealError>;

#[cfg(test)]
mod tests;
