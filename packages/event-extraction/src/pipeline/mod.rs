//! Extraction pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Chunking the source text into overlapping windows
//! - Time extraction per window
//! - Location, description and title enrichment per event
//! - Filtering by the caller's instruction
//! - Deduplication and time-range validation

pub mod chunk;
pub mod extractor;
pub mod operations;
pub mod prompts;
pub mod validate;

pub use chunk::split_text;
pub use extractor::{EventExtractor, ExtractionReport, PipelineStats};
pub use operations::{
    add_description, add_location, add_title, deduplicate, extract_time, filter_by_instruction,
    remove_exact_duplicates,
};
pub use prompts::PromptContext;
pub use validate::{apply_time_policy, validate_range, PolicyOutcome};
