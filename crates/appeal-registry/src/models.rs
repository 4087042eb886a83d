//! # Core Data Models for the Scenario Store
//!
//! This module defines the types shared by every appeal component: the
//! write-once [`Scenario`], the two-valued [`Verdict`], and the
//! [`EvaluationRecord`] persisted after each escalation tier.
//!
//! ## Invariants
//!
//! - **Two verdicts only**: `Verdict` has exactly two constructors. Lenient
//!   parsing collapses anything else onto [`DEFAULT_VERDICT`]; strict parsing
//!   (`FromStr`) rejects it.
//! - **Overturn is derived**: `EvaluationRecord::appeal` computes `overturned`
//!   from the previous verdict, so a record can never claim an overturn
//!   without a prior ruling.
//! - **Write-once scenarios**: there is no mutating API on `Scenario` once it
//!   is stored; see [`crate::fingerprint`] for the integrity check.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// SHA-256 output size in bytes.
pub const FINGERPRINT_SIZE: usize = 32;

/// SHA-256 fingerprint of a stored scenario.
pub type Fingerprint = [u8; FINGERPRINT_SIZE];

/// Verdict applied when an evaluator response is ambiguous or malformed.
pub const DEFAULT_VERDICT: Verdict = Verdict::A;

/// One of the two options a panel can rule for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Verdict {
    /// Option A.
    A,
    /// Option B.
    B,
}

impl Verdict {
    /// Returns the single-letter symbol.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Verdict::A => "A",
            Verdict::B => "B",
        }
    }

    /// Case-insensitive match of a bare candidate token.
    ///
    /// Surrounding whitespace is ignored. Returns `None` for anything that is
    /// not exactly one of the two symbols, leaving the fallback decision to
    /// the caller.
    ///
    /// ```rust
    /// use appeal_registry::Verdict;
    ///
    /// assert_eq!(Verdict::from_candidate(" b "), Some(Verdict::B));
    /// assert_eq!(Verdict::from_candidate("AB"), None);
    /// ```
    pub fn from_candidate(candidate: &str) -> Option<Self> {
        match candidate.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Verdict::A),
            "B" => Some(Verdict::B),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = RegistryError;

    /// Strict parse: exactly `"A"` or `"B"`.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "A" => Ok(Verdict::A),
            "B" => Ok(Verdict::B),
            other => Err(RegistryError::InvalidVerdict(other.to_string())),
        }
    }
}

/// Escalation tier that produced an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Small, cheap, optimistic panel.
    Initial,
    /// Large panel convened on dispute.
    Appeal,
}

impl Tier {
    /// Method label reported alongside a ruling.
    pub const fn method(&self) -> &'static str {
        match self {
            Tier::Initial => "initial_optimistic",
            Tier::Appeal => "appeal_escalated",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Initial => write!(f, "initial"),
            Tier::Appeal => write!(f, "appeal"),
        }
    }
}

/// A binary question put to evaluator panels.
///
/// Scenarios are registered once and never mutated or deleted.
///
/// # Example
///
/// ```rust
/// use appeal_registry::Scenario;
///
/// let scenario = Scenario::new("s1", "Which pet is better?", "cats", "dogs", "Culture")
///     .with_context("Asked at a shelter fundraiser");
///
/// assert!(scenario.validate().is_ok());
/// assert_eq!(scenario.context.as_deref(), Some("Asked at a shelter fundraiser"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique identifier.
    pub id: String,

    /// The question or claim under evaluation.
    pub question: String,

    /// Text of option A.
    pub option_a: String,

    /// Text of option B.
    pub option_b: String,

    /// Free-form category tag.
    pub category: String,

    /// Optional background shown to evaluators.
    pub context: Option<String>,
}

impl Scenario {
    /// Creates a scenario without context.
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        option_a: impl Into<String>,
        option_b: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            option_a: option_a.into(),
            option_b: option_b.into(),
            category: category.into(),
            context: None,
        }
    }

    /// Attaches context. Blank context is treated as absent.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.context = if context.trim().is_empty() {
            None
        } else {
            Some(context)
        };
        self
    }

    /// Checks the registration preconditions.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidScenario` naming the first empty
    /// required field (id, question, option A, option B).
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("id", &self.id),
            ("question", &self.question),
            ("option_a", &self.option_a),
            ("option_b", &self.option_b),
        ];

        for (field, value) in required {
            if value.is_empty() {
                return Err(RegistryError::InvalidScenario(format!("{} is empty", field)));
            }
        }
        Ok(())
    }
}

/// Outcome of one escalation tier for one scenario.
///
/// Stored keyed by scenario id; each new evaluation supersedes the previous
/// record, which survives only as `previous_verdict` on an appeal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Scenario this ruling belongs to.
    pub scenario_id: String,

    /// The panel's verdict.
    pub verdict: Verdict,

    /// Number of evaluators convened.
    pub panel_size: usize,

    /// Tier that produced the verdict.
    pub tier: Tier,

    /// Verdict on record before this appeal, if any. Always `None` for
    /// the initial tier.
    pub previous_verdict: Option<Verdict>,

    /// True iff this is an appeal, a previous verdict existed, and the
    /// two differ.
    pub overturned: bool,
}

impl EvaluationRecord {
    /// Record for an initial-tier ruling.
    pub fn initial(scenario_id: impl Into<String>, verdict: Verdict, panel_size: usize) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            verdict,
            panel_size,
            tier: Tier::Initial,
            previous_verdict: None,
            overturned: false,
        }
    }

    /// Record for an appeal-tier ruling.
    ///
    /// ```rust
    /// use appeal_registry::{EvaluationRecord, Verdict};
    ///
    /// let flipped = EvaluationRecord::appeal("s1", Verdict::B, 50, Some(Verdict::A));
    /// assert!(flipped.overturned);
    ///
    /// let fresh = EvaluationRecord::appeal("s1", Verdict::B, 50, None);
    /// assert!(!fresh.overturned);
    /// ```
    pub fn appeal(
        scenario_id: impl Into<String>,
        verdict: Verdict,
        panel_size: usize,
        previous_verdict: Option<Verdict>,
    ) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            verdict,
            panel_size,
            tier: Tier::Appeal,
            previous_verdict,
            overturned: previous_verdict.is_some_and(|prev| prev != verdict),
        }
    }
}

/// Position of a scenario in the escalation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvaluationState {
    /// No evaluation on record.
    Unevaluated,
    /// The small panel has ruled.
    InitiallyRuled,
    /// The large panel has ruled. Terminal for the cycle.
    AppealRuled,
}

impl From<Option<&EvaluationRecord>> for EvaluationState {
    fn from(record: Option<&EvaluationRecord>) -> Self {
        match record.map(|r| r.tier) {
            None => EvaluationState::Unevaluated,
            Some(Tier::Initial) => EvaluationState::InitiallyRuled,
            Some(Tier::Appeal) => EvaluationState::AppealRuled,
        }
    }
}

/// Errors raised by the Scenario Store.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Failed to open, read, or write the database.
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// Failed to serialize or deserialize a stored record.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The requested scenario is not registered.
    #[error("Scenario not found: {0}")]
    NotFound(String),

    /// A scenario with this id is already registered.
    #[error("Scenario already registered: {0}")]
    AlreadyExists(String),

    /// A required scenario field is missing.
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    /// Text that is not exactly `A` or `B` where a strict verdict is required.
    #[error("Invalid verdict: {0:?}")]
    InvalidVerdict(String),

    /// A stored scenario no longer matches the fingerprint taken at registration.
    #[error("Integrity violation for scenario: {0}")]
    IntegrityViolation(String),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
