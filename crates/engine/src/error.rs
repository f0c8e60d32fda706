//! Error types for the identify engine.

use idassert_core::CoreError;
use thiserror::Error;

use crate::state::IdentifyPhase;

/// Engine error type.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Tracking statement JSON could not be decoded.
    #[error("Malformed tracking statement: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid core value inside engine input.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An identify step was called before its prerequisites, or twice.
    #[error("{step} called out of order (identify state is {phase})")]
    OutOfOrder {
        /// Step that was attempted.
        step: &'static str,
        /// Phase the run was in.
        phase: IdentifyPhase,
    },

    /// No proof check has the given display position.
    #[error("No proof check at position {0}")]
    UnknownPosition(usize),
}

/// Result type alias for EngineError.
pub type Result<T> = std::result::Result<T, EngineError>;

/// The combined error produced from an identify outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifyError {
    /// The identify run itself failed upstream.
    #[error("{0}")]
    Upstream(String),

    /// One or more problems, in the order they were found.
    #[error("{}", .problems.join("; "))]
    Failed {
        /// Individual problem descriptions.
        problems: Vec<String>,
    },
}
