//! PDF text extraction using the pdf-extract crate.
//!
//! Handles PDFs with an embedded text layer; scanned pages come back as
//! empty strings.

use tracing::debug;

use crate::error::DocumentReadError;
use crate::traits::document::DocumentReader;

/// Reads per-page text from PDF bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfDocumentReader;

impl DocumentReader for PdfDocumentReader {
    fn read_pages(&self, document: &[u8]) -> Result<Vec<String>, DocumentReadError> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(document)
            .map_err(|e| DocumentReadError::Parse(e.to_string()))?;

        if pages.is_empty() {
            return Err(DocumentReadError::Empty);
        }

        debug!(
            pages = pages.len(),
            chars = pages.iter().map(|p| p.len()).sum::<usize>(),
            "Extracted PDF text"
        );

        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a one-page PDF with a Helvetica text line.
    fn make_test_pdf(text: &str) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let content = format!("BT /F1 12 Tf 100 700 Td ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });

        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
            page.set("Parent", pages_id);
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_reads_text_layer() {
        let pdf = make_test_pdf("Meeting on 2025-04-20 at Starbucks");
        let pages = PdfDocumentReader.read_pages(&pdf).unwrap();

        assert_eq!(pages.len(), 1);
        assert!(
            pages[0].contains("Meeting") || pages[0].contains("Starbucks"),
            "unexpected text: {:?}",
            pages[0]
        );
    }

    #[test]
    fn test_invalid_bytes_are_a_parse_error() {
        let err = PdfDocumentReader.read_pages(b"not a pdf").unwrap_err();
        assert!(matches!(err, DocumentReadError::Parse(_)));
    }
}
