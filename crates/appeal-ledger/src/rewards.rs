//! Ranking and reward distribution.
//!
//! Players are ranked by score, highest first. Equal scores are ordered by
//! player id in ascending byte order, so the ranking is the same on every
//! call for the same scores. Rank `r` (1-based) earns `table[r - 1]`; ranks
//! past the end of the table earn the flat reward.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::session::SessionSnapshot;

/// Rewards for ranks 1 through 10.
pub const DEFAULT_REWARD_TABLE: [u64; 10] = [1000, 750, 500, 400, 300, 250, 200, 150, 100, 50];

/// Reward for every rank past the table.
pub const DEFAULT_FLAT_REWARD: u64 = 25;

/// One row of a ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based rank.
    pub rank: usize,
    /// Player id.
    pub player: String,
    /// Accumulated score.
    pub score: i64,
    /// Reward for this rank.
    pub reward: u64,
}

/// Rank-indexed reward schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTable {
    table: Vec<u64>,
    flat_reward: u64,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self::new(DEFAULT_REWARD_TABLE.to_vec(), DEFAULT_FLAT_REWARD)
    }
}

impl RewardTable {
    /// Creates a schedule paying `table[i]` to rank `i + 1` and
    /// `flat_reward` beyond.
    pub fn new(table: Vec<u64>, flat_reward: u64) -> Self {
        Self { table, flat_reward }
    }

    /// Reward for a 1-based rank.
    pub fn reward_for_rank(&self, rank: usize) -> u64 {
        rank.checked_sub(1)
            .and_then(|i| self.table.get(i))
            .copied()
            .unwrap_or(self.flat_reward)
    }

    /// Ranks the players of a session.
    pub fn standings(&self, session: &SessionSnapshot) -> Vec<Standing> {
        // BTreeMap iterates by id; the stable sort keeps that order on ties.
        let mut ranked: Vec<(&String, i64)> =
            session.scores.iter().map(|(p, s)| (p, *s)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        ranked
            .into_iter()
            .enumerate()
            .map(|(i, (player, score))| Standing {
                rank: i + 1,
                player: player.clone(),
                score,
                reward: self.reward_for_rank(i + 1),
            })
            .collect()
    }

    /// Reward per player. Pure: reads the snapshot only.
    pub fn distribute(&self, session: &SessionSnapshot) -> BTreeMap<String, u64> {
        self.standings(session)
            .into_iter()
            .map(|s| (s.player, s.reward))
            .collect()
    }
}
