//! Match error taxonomy

use serde::{Deserialize, Serialize};

use super::r#match::{MatchId, MatchPhase};

/// Every failure a match operation can report. Each variant maps to exactly one
/// [`ErrorKind`] so callers can branch without parsing messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("match {0} not found")]
    NotFound(MatchId),

    #[error("not allowed: {0}")]
    Unauthorized(String),

    #[error("cannot {operation} while the match is {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: MatchPhase,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl MatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchError::NotFound(_) => ErrorKind::NotFound,
            MatchError::Unauthorized(_) => ErrorKind::Unauthorized,
            MatchError::InvalidPhase { .. } => ErrorKind::InvalidPhase,
            MatchError::InvalidInput(_) => ErrorKind::InvalidInput,
            MatchError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn unauthorized(msg: impl Into<String>) -> Self {
        MatchError::Unauthorized(msg.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        MatchError::InvalidInput(msg.into())
    }
}

/// Wire-level error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    InvalidPhase,
    InvalidInput,
    RateLimited,
    Internal,
}
