//! Document reader trait.
//!
//! Turning a document into text is delegated to a library; the pipeline only
//! needs the text of each page, in order.

use crate::error::DocumentReadError;

/// Extracts plain text from a document, one string per page.
pub trait DocumentReader: Send + Sync {
    fn read_pages(&self, document: &[u8]) -> Result<Vec<String>, DocumentReadError>;
}

/// Concatenate page texts, each followed by a single space.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let capacity = pages.iter().map(|p| p.as_ref().len() + 1).sum();

    pages
        .iter()
        .fold(String::with_capacity(capacity), |mut text, page| {
            text.push_str(page.as_ref());
            text.push(' ');
            text
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_pages_separates_with_space() {
        assert_eq!(join_pages(&["page one", "page two"]), "page one page two ");
    }

    #[test]
    fn test_join_no_pages() {
        let pages: [&str; 0] = [];
        assert_eq!(join_pages(&pages), "");
    }
}
