//! Evaluator panel runner.
//!
//! Convenes a panel of `N` evaluators on one prompt and reduces their
//! judgments to a single [`Verdict`].
//!
//! # Agreement Rule
//!
//! In [`PanelMode::Independent`] the runner issues `N` concurrent oracle
//! calls and applies a strict-majority vote:
//!
//! - `A` wins if more than half of the panel ruled `A`
//! - `B` wins if more than half of the panel ruled `B`
//! - otherwise (a tie, only possible for even `N`) the panel has no
//!   majority and resolves to [`DEFAULT_VERDICT`]
//!
//! Responses that fail to parse, and calls that fail outright, count as
//! [`DEFAULT_VERDICT`] votes; the tally reports how many there were.
//!
//! In [`PanelMode::Delegated`] the oracle is an external agreement protocol
//! that has already reconciled its validators. The runner makes one call
//! and normalizes the single answer.

use std::sync::Arc;

use appeal_registry::{Verdict, DEFAULT_VERDICT};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::oracle::Oracle;
use crate::ruling::{parse_ruling, ParsedRuling};

/// How a panel obtains its judgments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelMode {
    /// One oracle call per evaluator, majority computed locally.
    #[default]
    Independent,
    /// One oracle call; agreement is the external protocol's job.
    Delegated,
}

/// Per-verdict vote counts from an independent panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PanelTally {
    /// Votes for option A, including defaulted ones.
    pub a: usize,
    /// Votes for option B.
    pub b: usize,
    /// Votes that were defaulted because the response was unusable.
    pub malformed: usize,
    /// Total votes cast.
    pub total: usize,
}

impl PanelTally {
    /// Counts a set of parsed rulings.
    pub fn from_rulings(rulings: &[ParsedRuling]) -> Self {
        let mut tally = Self::default();
        for ruling in rulings {
            match ruling.verdict {
                Verdict::A => tally.a += 1,
                Verdict::B => tally.b += 1,
            }
            if ruling.malformed {
                tally.malformed += 1;
            }
        }
        tally.total = rulings.len();
        tally
    }

    /// The verdict held by a strict majority, if any.
    pub fn majority(&self) -> Option<Verdict> {
        if self.a * 2 > self.total {
            Some(Verdict::A)
        } else if self.b * 2 > self.total {
            Some(Verdict::B)
        } else {
            None
        }
    }

    /// The panel's verdict: the strict majority, or the default on a tie.
    pub fn verdict(&self) -> Verdict {
        self.majority().unwrap_or(DEFAULT_VERDICT)
    }
}

/// Result of convening one panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelOutcome {
    /// The panel's verdict.
    pub verdict: Verdict,
    /// Number of evaluators the panel was convened with.
    pub panel_size: usize,
    /// Mode used.
    pub mode: PanelMode,
    /// Vote counts; `None` for delegated panels, whose individual votes are
    /// not observable.
    pub tally: Option<PanelTally>,
}

/// Runs evaluator panels against an oracle.
#[derive(Clone)]
pub struct PanelRunner {
    oracle: Arc<dyn Oracle>,
    mode: PanelMode,
}

impl PanelRunner {
    /// Creates a runner in the given mode.
    pub fn new(oracle: Arc<dyn Oracle>, mode: PanelMode) -> Self {
        Self { oracle, mode }
    }

    /// Returns the configured mode.
    pub fn mode(&self) -> PanelMode {
        self.mode
    }

    /// Convenes a panel of `panel_size` evaluators on `prompt`.
    ///
    /// Total: every failure mode of the oracle collapses to the default
    /// verdict. A `panel_size` of zero is raised to one.
    pub async fn run(&self, prompt: &str, panel_size: usize) -> PanelOutcome {
        let panel_size = panel_size.max(1);

        match self.mode {
            PanelMode::Independent => {
                let rulings = self.collect_independent(prompt, panel_size).await;
                let tally = PanelTally::from_rulings(&rulings);
                debug!(
                    "Panel of {} via '{}': A={} B={} malformed={}",
                    panel_size,
                    self.oracle.name(),
                    tally.a,
                    tally.b,
                    tally.malformed
                );
                if tally.majority().is_none() {
                    warn!(
                        "Panel of {} split {}-{}, falling back to {}",
                        panel_size, tally.a, tally.b, DEFAULT_VERDICT
                    );
                }
                PanelOutcome {
                    verdict: tally.verdict(),
                    panel_size,
                    mode: self.mode,
                    tally: Some(tally),
                }
            }
            PanelMode::Delegated => {
                let ruling = match self.oracle.invoke(prompt).await {
                    Ok(response) => parse_ruling(&response),
                    Err(e) => {
                        warn!("Delegated panel call failed: {}", e);
                        ParsedRuling::fallback()
                    }
                };
                if ruling.malformed {
                    warn!("Delegated panel returned no usable ruling, using {}", ruling.verdict);
                }
                PanelOutcome {
                    verdict: ruling.verdict,
                    panel_size,
                    mode: self.mode,
                    tally: None,
                }
            }
        }
    }

    async fn collect_independent(&self, prompt: &str, panel_size: usize) -> Vec<ParsedRuling> {
        let prompt: Arc<str> = Arc::from(prompt);
        let mut calls = JoinSet::new();

        for _ in 0..panel_size {
            let oracle = Arc::clone(&self.oracle);
            let prompt = Arc::clone(&prompt);
            calls.spawn(async move { oracle.invoke(&prompt).await });
        }

        let mut rulings = Vec::with_capacity(panel_size);
        while let Some(joined) = calls.join_next().await {
            let ruling = match joined {
                Ok(Ok(response)) => parse_ruling(&response),
                Ok(Err(e)) => {
                    warn!("Evaluator call failed: {}", e);
                    ParsedRuling::fallback()
                }
                Err(e) => {
                    warn!("Evaluator task aborted: {}", e);
                    ParsedRuling::fallback()
                }
            };
            rulings.push(ruling);
        }
        rulings
    }
}

impl std::fmt::Debug for PanelRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelRunner")
            .field("oracle", &self.oracle.name())
            .field("mode", &self.mode)
            .finish()
    }
}
