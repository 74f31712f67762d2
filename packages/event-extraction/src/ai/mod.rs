//! Oracle implementations for the extraction library.
//!
//! This module provides the reference implementation of the `Oracle` trait.
//! Users can use it directly or implement their own.

mod openai;

pub use openai::OpenAIOracle;
