//! # Appeal Council
//!
//! Evaluator panels and two-tier optimistic escalation.
//!
//! ## Overview
//!
//! A binary question is first settled cheaply by a small panel of
//! nondeterministic evaluators. If the ruling is disputed, a panel an order
//! of magnitude larger re-rules it with the earlier verdict in view, and the
//! outcome is flagged as overturned when the two disagree.
//!
//! ## Failure Model
//!
//! ### Malformed Judgments
//! Evaluators are external text generators. Their answers may be wrapped in
//! code fences, written in lowercase, embedded in loose JSON, or missing
//! entirely. Every response goes through one normalization rule
//! ([`ruling::parse_ruling`]) that either extracts `A` / `B` or falls back to
//! `A`. Nothing in this crate surfaces a malformed response as an error.
//!
//! ### Disagreeing Evaluators
//! In independent mode each evaluator is called separately and the panel
//! verdict needs a strict majority. A split panel resolves to `A`, the same
//! default as a malformed answer.
//!
//! ### External Agreement
//! When the oracle already runs its own agreement protocol across several
//! validators, delegated mode makes one call and trusts that protocol's
//! answer.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────────┐
//!                 │   AppealController   │
//!                 │ (per-scenario locks) │
//!                 └──────────┬───────────┘
//!            initial (5)     │      appeal (50)
//!        ┌───────────────────┼───────────────────┐
//!        ▼                   ▼                   ▼
//!  ┌───────────┐      ┌─────────────┐     ┌────────────┐
//!  │  prompt   │─────▶│ PanelRunner │────▶│  registry  │
//!  │ rendering │      │  (JoinSet)  │     │  (records) │
//!  └───────────┘      └──────┬──────┘     └────────────┘
//!                            ▼
//!                   ┌─────────────────┐
//!                   │  Oracle × N     │
//!                   │ → parse_ruling  │
//!                   │ → majority vote │
//!                   └─────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use appeal_council::{AppealController, ScriptedOracle};
//! use appeal_registry::{Scenario, ScenarioRegistry, Verdict};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = ScenarioRegistry::temporary().unwrap();
//! registry
//!     .register(&Scenario::new("s1", "Which is better?", "cats", "dogs", "Pets"))
//!     .unwrap();
//!
//! // Five "A" answers for the initial panel, then "B" for the appeal.
//! let mut script = vec!["A"; 5];
//! script.extend(vec!["B"; 50]);
//! let controller = AppealController::new(registry, Arc::new(ScriptedOracle::new(script)));
//!
//! let initial = controller.evaluate_initial("s1").await.unwrap();
//! assert_eq!(initial.record.verdict, Verdict::A);
//!
//! let appeal = controller.evaluate_appeal("s1").await.unwrap();
//! assert_eq!(appeal.record.verdict, Verdict::B);
//! assert!(appeal.record.overturned);
//! # });
//! ```
//!
//! ## References
//!
//! - [Optimistic Rollups](https://ethereum.org/en/developers/docs/scaling/optimistic-rollups/) - Challenge-period escalation
//! - [Majority Function](https://en.wikipedia.org/wiki/Majority_function) - Strict-majority voting

pub mod error;
pub mod escalation;
pub mod oracle;
pub mod panel;
pub mod prompt;
pub mod ruling;

pub use error::{CouncilError, OracleError};
pub use escalation::{AppealController, EscalationPolicy, EvaluationOutcome, MAX_PANEL_SIZE};
pub use oracle::{Oracle, ScriptedOracle, StaticOracle};
pub use panel::{PanelMode, PanelOutcome, PanelRunner, PanelTally};
pub use ruling::{normalize_ruling, parse_ruling, ParsedRuling};

/// Result type for council operations.
pub type Result<T> = std::result::Result<T, CouncilError>;
