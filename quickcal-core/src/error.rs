//! Error types for quickcal.

use thiserror::Error;

/// Errors that can occur while decoding, projecting or configuring calendars.
#[derive(Error, Debug)]
pub enum QuickCalError {
    #[error("Malformed calendar object: {0}")]
    MalformedInput(String),

    #[error("Unparseable timestamp {value:?}: {reason}")]
    UnparseableTimestamp { value: String, reason: String },

    #[error("Unrecognized timestamp representation for {property} ({value:?})")]
    UnrecognizedTimestamp { property: String, value: String },

    #[error("Recurrence rule error for event '{uid}': {reason}")]
    RecurrenceRule { uid: String, reason: String },

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for quickcal operations.
pub type QuickCalResult<T> = Result<T, QuickCalError>;
