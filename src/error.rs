//! Error types.
//!
//! Each layer has its own enum so callers can decide locally what is
//! recoverable: catalog failures turn into a fresh question, store failures
//! into a logged warning, session failures into an ignored key press.

use thiserror::Error;

use crate::catalog::QuestionSetId;
use crate::session::Phase;

/// Errors produced when turning stored question text back into a question.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The text is not in any format a generator produces.
    #[error("cannot parse question {0:?}")]
    Parse(String),

    /// The text parsed as a division by zero, which no generator produces.
    #[error("question {0:?} divides by zero")]
    ZeroDivisor(String),

    /// The text parsed, but belongs to a different question set.
    #[error("question {question:?} does not belong to the {set} set")]
    WrongSet { question: String, set: QuestionSetId },
}

/// Errors from the durable key-value port.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors from driving the session state machine out of order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The action is not valid in the current phase; nothing was changed.
    #[error("cannot {action} while {phase:?}")]
    InvalidTransition { action: &'static str, phase: Phase },
}
