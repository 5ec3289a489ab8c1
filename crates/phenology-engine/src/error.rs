//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and replicate execution.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or phase-chain building failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: phenology_core::ConfigError,
    },

    /// A season run failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: phenology_core::RunnerError,
    },

    /// A replicate worker panicked or was cancelled.
    #[error("replicate worker failed: {message}")]
    Join {
        /// Description of the worker failure.
        message: String,
    },

    /// The results could not be written.
    #[error("output error: {message}")]
    Output {
        /// Description of the output failure.
        message: String,
    },
}
