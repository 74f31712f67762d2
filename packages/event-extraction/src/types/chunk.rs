//! A window of source text submitted to the oracle in one call.

use serde::{Deserialize, Serialize};

/// A substring of the source text.
///
/// `start` and lengths are counted in characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Character offset of the first character in the source text
    pub start: usize,

    /// The chunk's text
    pub text: String,
}

impl Chunk {
    pub fn new(start: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            text: text.into(),
        }
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Character offset one past the last character.
    pub fn end(&self) -> usize {
        self.start + self.char_len()
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
