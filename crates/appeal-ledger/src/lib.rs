//! # Round Ledger
//!
//! Game sessions, round history, player scores and reward ranking.
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`RoundLedger`] | Persistent sessions: create, append rounds, update scores |
//! | [`SessionSnapshot`] | Read-only view of one session |
//! | [`RewardTable`] | Rank-indexed reward schedule and tie-stable ranking |
//!
//! ## Quick Start
//!
//! ```rust
//! use appeal_ledger::{RewardTable, RoundLedger};
//!
//! let ledger = RoundLedger::temporary()?;
//! ledger.create_session("g1", 3)?;
//! ledger.update_score("g1", "p1", 300)?;
//! ledger.update_score("g1", "p2", 300)?;
//! ledger.update_score("g1", "p3", 100)?;
//!
//! let state = ledger.get_state("g1")?.unwrap();
//! let rewards = RewardTable::default().distribute(&state);
//! assert_eq!(rewards["p1"], 1000);
//! assert_eq!(rewards["p2"], 750);
//! assert_eq!(rewards["p3"], 500);
//! # Ok::<(), appeal_ledger::LedgerError>(())
//! ```
//!
//! ## Notes
//!
//! - Recording a round does not run any panel; callers pass the outcome in.
//! - A round's scenario id is not checked against the scenario store.
//! - Player capacity is recorded with the session but not enforced against
//!   the number of scored players.

mod error;
mod ledger;
mod rewards;
mod session;

pub use error::{LedgerError, Result};
pub use ledger::{RoundLedger, DEFAULT_MAX_CAPACITY};
pub use rewards::{RewardTable, Standing, DEFAULT_FLAT_REWARD, DEFAULT_REWARD_TABLE};
pub use session::{RoundResult, SessionSnapshot};
