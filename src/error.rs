//! Error types for the simulator, the shot search and settings loading

use thiserror::Error;

/// Failures raised by [`State`](crate::sim::State) accessors and the simulator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("puck index {index} out of range (state holds {len} pucks)")]
    OutOfRange { index: usize, len: usize },

    #[error("malformed state: {positions} positions vs {velocities} velocities")]
    MalformedState { positions: usize, velocities: usize },

    #[error("non-finite value at step {step}")]
    NumericalDivergence { step: usize },

    #[error("no rest state after {steps} steps")]
    DidNotConverge { steps: usize },
}

impl SimError {
    /// True for failures that only exclude a single candidate from a search
    pub fn is_candidate_local(&self) -> bool {
        matches!(
            self,
            SimError::NumericalDivergence { .. } | SimError::DidNotConverge { .. }
        )
    }
}

/// Failures raised while choosing a move
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("candidate grid is empty")]
    EmptySearchSpace,

    #[error("candidate grid holds {candidates} cells, limit is {limit}")]
    SearchSpaceTooLarge { candidates: usize, limit: usize },

    #[error("no viable move: all {failed} candidates failed to simulate")]
    NoViableMove { failed: usize },

    #[error("player must be 0 or 1, got {0}")]
    InvalidPlayer(u8),

    #[error("search cancelled")]
    Cancelled,

    #[error(transparent)]
    Sim(#[from] SimError),
}

/// Failures raised while loading or validating [`Settings`](crate::Settings)
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type SimResult<T> = Result<T, SimError>;
pub type SearchResult<T> = Result<T, SearchError>;
