//! Document reader implementations.

mod pdf;

pub use pdf::PdfDocumentReader;
