//! Calendar Event Extraction Library
//!
//! Turns free-form text (or the text of a PDF) into calendar events by
//! driving a structured-output LLM through a fixed sequence of passes.
//!
//! # Design Philosophy
//!
//! **One small question per call**
//!
//! - Times first, then location, description and title, one field per call
//! - Every answer is validated against a JSON schema generated from Rust types
//! - The LLM sits behind the [`Oracle`] trait and is injected by the caller
//! - The library never reads the environment; configuration is explicit
//!
//! # Usage
//!
//! ```rust,ignore
//! use event_extraction::{EventExtractor, ExtractionConfig, OpenAIOracle, OracleCredentials};
//!
//! let oracle = OpenAIOracle::new(OracleCredentials::new(api_key))?;
//! let extractor = EventExtractor::with_config(
//!     oracle,
//!     ExtractionConfig::new().with_timezone_name("Europe/Paris")?,
//! )?;
//!
//! // Everything in the text
//! let events = extractor.extract(None, &text).await?;
//!
//! // Only what matches an instruction
//! let lectures = extractor
//!     .extract_from_pdf(Some("Get me events on dynamic programming"), "syllabus.pdf")
//!     .await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (Oracle, DocumentReader)
//! - [`types`] - Events, chunks and configuration
//! - [`pipeline`] - Chunker, operations, orchestrator and validation
//! - [`ai`] - OpenAI oracle
//! - [`documents`] - PDF reader
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod documents;
pub mod error;
pub mod pipeline;
pub mod security;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use ai::OpenAIOracle;
pub use documents::PdfDocumentReader;
pub use error::{
    ConfigError, DocumentReadError, ExtractionError, OracleError, OracleResult, Result,
    ValidationError,
};
pub use pipeline::{split_text, EventExtractor, ExtractionReport, PipelineStats};
pub use security::{OracleCredentials, SecretString, DEFAULT_LARGE_MODEL, DEFAULT_SMALL_MODEL};
pub use traits::{
    document::{join_pages, DocumentReader},
    oracle::{ask, ModelTier, Operation, Oracle, OracleRequest, ResponseSchema},
};
pub use types::{
    chunk::Chunk,
    config::{ExtractionConfig, FailurePolicy, TimeRangePolicy},
    event::{
        Event, EventList, EventTime, EventTimeList, EventTimeLocation,
        EventTimeLocationDescription, TimeRange,
    },
};
