//! Error types for the potentials core
//!
//! The normalizer itself is total and never fails. Errors come from the
//! layers around it: input caps, matrix construction, profile loading,
//! plan parsing and configuration.

use thiserror::Error;

/// Core error types
#[derive(Debug, Error)]
pub enum Error {
    /// Raw input exceeds the caller-configured cap
    #[error("Input too long: {len} characters (limit {max})")]
    InputTooLong { len: usize, max: usize },

    /// A matrix was built from a token list that is not exactly nine long
    #[error("Matrix needs exactly 9 potentials, found {found}")]
    MatrixLength { found: usize },

    /// A required profile field is empty
    #[error("Missing input: {0}")]
    MissingInput(&'static str),

    /// Text-generation output did not contain a usable plan
    #[error("Plan parse error: {0}")]
    PlanParse(String),

    /// Profile JSON could not be read into the current schema
    #[error("Schema error: {0}")]
    Schema(String),

    /// Canon JSON could not be loaded
    #[error("Canon error: {0}")]
    Canon(String),

    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
