//! Persistent round ledger.
//!
//! Sessions live in a single sled tree keyed by session id, each value the
//! JSON-encoded session. Creation is a compare-and-swap against an absent
//! key; every mutation is a read-modify-write inside a sled transaction, so
//! concurrent callers touching the same session never lose an update.

use std::path::Path;
use std::str::FromStr;

use appeal_registry::Verdict;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use tracing::{debug, info};

use crate::error::{LedgerError, Result};
use crate::session::{GameSession, RoundResult, SessionSnapshot};

/// Tree name for sessions.
const SESSION_TREE: &str = "sessions";

/// Largest player capacity accepted by default.
pub const DEFAULT_MAX_CAPACITY: u32 = 200;

/// Records sessions, rounds and scores.
///
/// # Example
///
/// ```rust
/// use appeal_ledger::RoundLedger;
///
/// let ledger = RoundLedger::temporary()?;
/// ledger.create_session("g1", 4)?;
/// ledger.record_round("g1", "s1", "A", "B", true, 50)?;
/// ledger.update_score("g1", "p1", 10)?;
///
/// let state = ledger.get_state("g1")?.unwrap();
/// assert_eq!(state.current_round, 1);
/// assert_eq!(state.score("p1"), Some(10));
/// # Ok::<(), appeal_ledger::LedgerError>(())
/// ```
#[derive(Clone)]
pub struct RoundLedger {
    db: sled::Db,
    sessions: sled::Tree,
    max_capacity: u32,
}

impl RoundLedger {
    /// Opens or creates a ledger database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_db(sled::open(path)?)
    }

    /// Creates a temporary in-memory ledger.
    pub fn temporary() -> Result<Self> {
        Self::with_db(sled::Config::new().temporary(true).open()?)
    }

    /// Builds the ledger on an already-open database.
    pub fn with_db(db: sled::Db) -> Result<Self> {
        let sessions = db.open_tree(SESSION_TREE)?;
        Ok(Self {
            db,
            sessions,
            max_capacity: DEFAULT_MAX_CAPACITY,
        })
    }

    /// Sets the largest accepted player capacity.
    #[must_use]
    pub fn with_max_capacity(mut self, max_capacity: u32) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Returns the largest accepted player capacity.
    pub fn max_capacity(&self) -> u32 {
        self.max_capacity
    }

    /// Creates an empty session.
    ///
    /// # Errors
    ///
    /// - `LedgerError::EmptySessionId` if `id` is empty
    /// - `LedgerError::InvalidCapacity` if `capacity` is outside
    ///   `[1, max_capacity]`
    /// - `LedgerError::SessionExists` if the id is taken
    pub fn create_session(&self, id: &str, capacity: u32) -> Result<()> {
        if id.is_empty() {
            return Err(LedgerError::EmptySessionId);
        }
        if capacity == 0 || capacity > self.max_capacity {
            debug!("Rejected session '{}' with capacity {}", id, capacity);
            return Err(LedgerError::InvalidCapacity {
                capacity,
                max: self.max_capacity,
            });
        }

        let value = serde_json::to_vec(&GameSession::new(id, capacity))?;
        let swapped = self
            .sessions
            .compare_and_swap(id.as_bytes(), None as Option<&[u8]>, Some(value))?;

        if swapped.is_err() {
            debug!("Rejected duplicate session '{}'", id);
            return Err(LedgerError::SessionExists(id.to_string()));
        }

        info!("Created session '{}' (capacity {})", id, capacity);
        Ok(())
    }

    /// Appends a round and advances the round counter.
    ///
    /// Rulings must be exactly `"A"` or `"B"`. The scenario id is recorded
    /// as given.
    ///
    /// # Returns
    ///
    /// The new round counter.
    ///
    /// # Errors
    ///
    /// - `LedgerError::InvalidRuling` for a ruling outside `{A, B}`
    /// - `LedgerError::SessionNotFound` for an unknown session
    pub fn record_round(
        &self,
        session_id: &str,
        scenario_id: &str,
        initial_ruling: &str,
        final_ruling: &str,
        appeal_triggered: bool,
        validator_count: u32,
    ) -> Result<u64> {
        let round = RoundResult::new(
            scenario_id,
            parse_ruling(initial_ruling)?,
            parse_ruling(final_ruling)?,
            appeal_triggered,
            validator_count,
        );
        self.append_round(session_id, round)
    }

    /// Appends an already-typed round and advances the round counter.
    pub fn append_round(&self, session_id: &str, round: RoundResult) -> Result<u64> {
        let session = self.modify(session_id, |session| {
            session.push_round(round.clone());
        })?;

        debug!(
            "Session '{}' round {}: {} -> {} (appeal: {})",
            session_id, session.current_round, round.initial_ruling, round.final_ruling,
            round.appeal_triggered
        );
        Ok(session.current_round)
    }

    /// Adds `delta` to a player's score, creating the player at zero first.
    ///
    /// # Returns
    ///
    /// The player's new score.
    ///
    /// # Errors
    ///
    /// - `LedgerError::EmptyPlayerId` if `player` is empty
    /// - `LedgerError::SessionNotFound` for an unknown session
    pub fn update_score(&self, session_id: &str, player: &str, delta: i64) -> Result<i64> {
        if player.is_empty() {
            return Err(LedgerError::EmptyPlayerId);
        }

        let session = self.modify(session_id, |session| {
            session.add_score(player, delta);
        })?;
        let score = session.scores.get(player).copied().unwrap_or_default();

        debug!(
            "Session '{}' player '{}' {:+} -> {}",
            session_id, player, delta, score
        );
        Ok(score)
    }

    /// Returns a snapshot of the session, or `None` if it does not exist.
    pub fn get_state(&self, session_id: &str) -> Result<Option<SessionSnapshot>> {
        match self.sessions.get(session_id.as_bytes())? {
            Some(bytes) => {
                let session: GameSession = serde_json::from_slice(&bytes)?;
                Ok(Some(session.into()))
            }
            None => Ok(None),
        }
    }

    /// Returns true if the session exists.
    pub fn contains(&self, session_id: &str) -> Result<bool> {
        Ok(self.sessions.contains_key(session_id.as_bytes())?)
    }

    /// Lists session ids in lexicographic byte order.
    pub fn list_sessions(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for key in self.sessions.iter().keys() {
            let key = key?;
            ids.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(ids)
    }

    /// Number of sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Flushes pending writes to disk.
    pub fn flush(&self) -> Result<usize> {
        Ok(self.db.flush()?)
    }

    fn modify<F>(&self, session_id: &str, apply: F) -> Result<GameSession>
    where
        F: Fn(&mut GameSession),
    {
        self.sessions
            .transaction(|tx| -> ConflictableTransactionResult<GameSession, LedgerError> {
                let bytes = tx.get(session_id.as_bytes())?.ok_or_else(|| {
                    ConflictableTransactionError::Abort(LedgerError::SessionNotFound(
                        session_id.to_string(),
                    ))
                })?;
                let mut session: GameSession = serde_json::from_slice(&bytes)
                    .map_err(|e| ConflictableTransactionError::Abort(LedgerError::from(e)))?;

                apply(&mut session);

                let value = serde_json::to_vec(&session)
                    .map_err(|e| ConflictableTransactionError::Abort(LedgerError::from(e)))?;
                tx.insert(session_id.as_bytes(), value)?;
                Ok(session)
            })
            .map_err(|e| match e {
                TransactionError::Abort(e) => e,
                TransactionError::Storage(e) => LedgerError::Database(e),
            })
    }
}

fn parse_ruling(raw: &str) -> Result<Verdict> {
    Verdict::from_str(raw).map_err(|_| LedgerError::InvalidRuling(raw.to_string()))
}

impl std::fmt::Debug for RoundLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundLedger")
            .field("sessions", &self.sessions.len())
            .field("max_capacity", &self.max_capacity)
            .finish()
    }
}
