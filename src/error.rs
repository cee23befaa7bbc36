//! Error types for configuration, records and input commands.
//!
//! Gameplay outcomes (a wrong answer, a lost stage, a spawn at cap) are state
//! transitions, not errors.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Recoverable engine errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Stage configuration or settings failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON parsing or encoding failed.
    #[error("Failed to parse {what}: {source}")]
    Parse {
        /// What was being parsed.
        what: &'static str,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// Candidate index outside the meteor's candidate slots.
    #[error("Candidate index {index} out of range (meteor has {count} candidates)")]
    CandidateOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of candidates.
        count: usize,
    },

    /// Puzzle piece id not present in the active puzzle.
    #[error("Unknown puzzle piece: {0}")]
    UnknownPiece(u32),
}
