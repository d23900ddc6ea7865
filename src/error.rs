//! Error types surfaced by the formatting pipeline.
//!
//! Only [`FormatError`] ever reaches the caller of
//! [`Formatter::format_post`](crate::Formatter::format_post). Typesetting
//! failures are contained per math block and turned into visible fallback
//! text.

use std::time::Duration;

use thiserror::Error;

/// Fatal, per-document error: the record cannot be formatted at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// A required identity field (`id`, `type` or `slug`) is absent or empty.
    #[error("post record is missing required field `{0}`")]
    MissingField(&'static str),
}

/// Failure of a single typesetting call.
#[derive(Debug, Error)]
pub enum TypesetError {
    /// The engine process could not be started.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine rejected the input.
    #[error("{0}")]
    Engine(String),

    /// The engine did not answer within the configured limit.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}
