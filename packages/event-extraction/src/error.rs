//! Typed errors for the event extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use std::path::PathBuf;

use thiserror::Error;

use crate::traits::oracle::Operation;

/// Errors that abort an extraction run.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// An oracle call failed and the failure policy did not absorb it
    #[error("{operation} failed: {source}")]
    Oracle {
        operation: Operation,
        #[source]
        source: OracleError,
    },

    /// The source document could not be turned into text
    #[error("document error: {0}")]
    Document(#[from] DocumentReadError),

    /// Invalid pipeline configuration
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl ExtractionError {
    pub(crate) fn oracle(operation: Operation, source: OracleError) -> Self {
        Self::Oracle { operation, source }
    }
}

/// Failures of a single structured-output call.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Connection-level failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Request exceeded the client's timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Non-success response from the backend
    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The model declined to answer
    #[error("model refused: {0}")]
    Refused(String),

    /// The response did not match the declared schema
    #[error("response does not match {schema}: {reason}")]
    Parse { schema: String, reason: String },

    /// The oracle is misconfigured
    #[error("oracle config error: {0}")]
    Config(String),
}

impl From<openai_client::OpenAIError> for OracleError {
    fn from(err: openai_client::OpenAIError) -> Self {
        use openai_client::OpenAIError;

        match err {
            OpenAIError::Config(msg) => Self::Config(msg),
            OpenAIError::Network(msg) => Self::Transport(msg),
            OpenAIError::Timeout(msg) => Self::Timeout(msg),
            OpenAIError::Api { status, message } => Self::Api { status, message },
            OpenAIError::Refusal(msg) => Self::Refused(msg),
            OpenAIError::Parse(reason) => Self::Parse {
                schema: "response".to_string(),
                reason,
            },
        }
    }
}

/// Errors turning a document into text.
#[derive(Debug, Error)]
pub enum DocumentReadError {
    /// The document file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not a readable document
    #[error("failed to parse document: {0}")]
    Parse(String),

    /// The document has no pages
    #[error("document has no pages")]
    Empty,
}

/// A timestamp pair the pipeline refuses to return as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `start` or `end` is empty
    #[error("missing {field} timestamp")]
    MissingTimestamp { field: &'static str },

    /// `start` or `end` is not an ISO-8601 timestamp
    #[error("invalid {field} timestamp: {value:?}")]
    InvalidTimestamp { field: &'static str, value: String },

    /// `start` is not strictly before `end`
    #[error("start {start} is not before end {end}")]
    NotChronological { start: String, end: String },

    /// Repairing the range would leave the representable calendar
    #[error("timestamp {value:?} cannot be repaired")]
    OutOfRange { value: String },
}

/// Invalid `ExtractionConfig` values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("chunk_length must be greater than zero")]
    ZeroChunkLength,

    #[error("concurrency must be greater than zero")]
    ZeroConcurrency,

    #[error("max_events_per_call must be greater than zero")]
    ZeroBatchSize,

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for single oracle calls.
pub type OracleResult<T> = std::result::Result<T, OracleError>;
