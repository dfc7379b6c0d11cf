//! Typed failures of the story pipeline.
//!
//! Most functions return `anyhow::Result`; these variants travel inside it so
//! callers can tell a configuration mistake from an exhausted retry budget.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoryError {
    /// The generator kept returning text that could not be parsed into the
    /// structure the stage needs.
    #[error("Unparseable generation in stage '{stage}' after {attempts} attempts")]
    Unparseable { stage: String, attempts: usize },

    #[error("Unknown LLM provider: {0}")]
    UnknownBackend(String),

    #[error("{0} config missing")]
    MissingBackendConfig(String),

    #[error("Invalid backend URL '{url}': {reason}")]
    InvalidBackendUrl { url: String, reason: String },
}

impl StoryError {
    pub fn unparseable(stage: impl Into<String>, attempts: usize) -> Self {
        StoryError::Unparseable {
            stage: stage.into(),
            attempts,
        }
    }
}
