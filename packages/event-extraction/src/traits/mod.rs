//! Core trait abstractions for the extraction library.
//!
//! These traits define the interfaces that applications implement
//! to provide LLM and document-reading capabilities.

pub mod document;
pub mod oracle;
