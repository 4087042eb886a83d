//! Session and round records.

use std::collections::BTreeMap;

use appeal_registry::Verdict;
use serde::{Deserialize, Serialize};

/// One completed round as reported by the caller.
///
/// The ledger does not run panels itself; callers evaluate first and pass
/// the outcome in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    /// Scenario the round was played on. Not checked against the registry.
    pub scenario_id: String,
    /// Ruling of the initial panel.
    pub initial_ruling: Verdict,
    /// Ruling that stood at the end of the round.
    pub final_ruling: Verdict,
    /// Whether the round went to appeal.
    pub appeal_triggered: bool,
    /// Evaluators behind the final ruling.
    pub validator_count: u32,
}

impl RoundResult {
    /// Creates a round result.
    pub fn new(
        scenario_id: impl Into<String>,
        initial_ruling: Verdict,
        final_ruling: Verdict,
        appeal_triggered: bool,
        validator_count: u32,
    ) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            initial_ruling,
            final_ruling,
            appeal_triggered,
            validator_count,
        }
    }

    /// Returns true if the final ruling differs from the initial one.
    pub fn overturned(&self) -> bool {
        self.initial_ruling != self.final_ruling
    }
}

/// Persisted state of one game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct GameSession {
    pub(crate) id: String,
    pub(crate) capacity: u32,
    pub(crate) current_round: u64,
    pub(crate) scores: BTreeMap<String, i64>,
    pub(crate) rounds: Vec<RoundResult>,
}

impl GameSession {
    pub(crate) fn new(id: &str, capacity: u32) -> Self {
        Self {
            id: id.to_string(),
            capacity,
            current_round: 0,
            scores: BTreeMap::new(),
            rounds: Vec::new(),
        }
    }

    pub(crate) fn push_round(&mut self, round: RoundResult) -> u64 {
        self.rounds.push(round);
        self.current_round += 1;
        self.current_round
    }

    /// Adds `delta` to a player's score, saturating at the `i64` bounds.
    pub(crate) fn add_score(&mut self, player: &str, delta: i64) -> i64 {
        let score = self.scores.entry(player.to_string()).or_insert(0);
        *score = score.saturating_add(delta);
        *score
    }
}

/// Read-only view of a session.
///
/// Scores are keyed by player id in ascending byte order; rounds are in the
/// order they were recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session id.
    pub id: String,
    /// Declared player capacity.
    pub capacity: u32,
    /// Number of rounds recorded.
    pub current_round: u64,
    /// Accumulated score per player.
    pub scores: BTreeMap<String, i64>,
    /// Round history.
    pub rounds: Vec<RoundResult>,
}

impl SessionSnapshot {
    /// Number of rounds that went to appeal.
    pub fn appeal_count(&self) -> usize {
        self.rounds.iter().filter(|r| r.appeal_triggered).count()
    }

    /// Number of rounds whose final ruling differs from the initial one.
    pub fn overturn_count(&self) -> usize {
        self.rounds.iter().filter(|r| r.overturned()).count()
    }

    /// Score of one player, if they have one.
    pub fn score(&self, player: &str) -> Option<i64> {
        self.scores.get(player).copied()
    }
}

impl From<GameSession> for SessionSnapshot {
    fn from(session: GameSession) -> Self {
        Self {
            id: session.id,
            capacity: session.capacity,
            current_round: session.current_round,
            scores: session.scores,
            rounds: session.rounds,
        }
    }
}
