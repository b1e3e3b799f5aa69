//! Error types for session lifecycle and history persistence.

use crate::session::{Operation, SessionState};

/// Lifecycle errors raised by the session manager
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    /// The operation is not allowed in the current state. The UI only offers
    /// valid controls, so this points at a caller bug.
    #[error("cannot {operation} while {state}")]
    InvalidTransition {
        operation: Operation,
        state: SessionState,
    },
}

/// Failures reading or writing the persisted history
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode history: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// All errors surfaced by worktally operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Error::Session(SessionError::InvalidTransition { .. }))
    }
}
