//! Error taxonomy of the entity-annotation pipeline.
//!
//! `SpanError` is recovered locally inside the BIO encoder (a bad annotation
//! is skipped, never the whole sentence). Everything in `ExtractError`
//! propagates to the caller as a structured failure.

use std::path::PathBuf;

use thiserror::Error;

/// An annotation whose character offsets cannot be resolved onto token
/// boundaries. Absorbed by the BIO encoder; never escapes it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpanError {
    /// `begin` is 0 or past `end`; the prefix back-off has nothing to slice.
    #[error("invalid offsets begin={begin} end={end}")]
    InvalidOffsets { begin: usize, end: usize },
    /// `end` points past the end of the sentence text.
    #[error("end offset {end} past text length {len}")]
    OutOfText { end: usize, len: usize },
    /// The resolved token range falls outside the tokenized sentence.
    #[error("token range {first}..={last} past token count {token_count}")]
    OutOfTokens {
        first: usize,
        last: usize,
        token_count: usize,
    },
}

/// Fatal pipeline errors, surfaced to the orchestrator's caller untouched.
/// No automatic retries exist in this crate; retry policy belongs to the
/// API layer.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A malformed training example or a feature/label length mismatch.
    /// Aborts the whole training batch; sentences are never silently dropped.
    #[error("invalid training data: {0}")]
    TrainingData(String),

    /// The model produced a label sequence whose length differs from the
    /// token sequence. Not recoverable for this prediction.
    #[error("predicted {actual} labels for {expected} tokens")]
    LabelAlignment { expected: usize, actual: usize },

    /// No persisted artifact exists for the requested model id.
    #[error("model {0:?} not found")]
    ModelNotFound(String),

    /// A model id that would resolve outside the storage root.
    #[error("invalid model id {0:?}")]
    InvalidModelId(String),

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted model artifact could not be encoded or decoded.
    #[error("model persistence error: {0}")]
    Persistence(#[from] serde_json::Error),
}

impl ExtractError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExtractError::Io {
            path: path.into(),
            source,
        }
    }
}
