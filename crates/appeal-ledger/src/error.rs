//! Error types for the round ledger.

use thiserror::Error;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while recording sessions, rounds and scores.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No session with this id exists.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// A session with this id already exists.
    #[error("session already exists: {0}")]
    SessionExists(String),

    /// Player capacity outside the accepted range.
    #[error("player capacity {capacity} outside [1, {max}]")]
    InvalidCapacity {
        /// Requested capacity
        capacity: u32,
        /// Largest accepted capacity
        max: u32,
    },

    /// A round ruling that is not exactly `A` or `B`.
    #[error("invalid ruling: {0:?}")]
    InvalidRuling(String),

    /// Session creation without a session id.
    #[error("session id must not be empty")]
    EmptySessionId,

    /// Score update without a player id.
    #[error("player id must not be empty")]
    EmptyPlayerId,

    /// Failed to open, read, or write the database.
    #[error("database error: {0}")]
    Database(#[from] sled::Error),

    /// Failed to serialize or deserialize a session.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_display() {
        let err = LedgerError::InvalidCapacity {
            capacity: 201,
            max: 200,
        };
        assert_eq!(err.to_string(), "player capacity 201 outside [1, 200]");
    }

    #[test]
    fn test_empty_session_id_display() {
        assert_eq!(
            LedgerError::EmptySessionId.to_string(),
            "session id must not be empty"
        );
    }

    #[test]
    fn test_invalid_ruling_display_quotes_input() {
        let err = LedgerError::InvalidRuling("C".to_string());
        assert_eq!(err.to_string(), "invalid ruling: \"C\"");
    }
}
