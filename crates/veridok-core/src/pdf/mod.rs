//! PDF handling: native text layers with an OCR fallback feed.
//!
//! A text-based PDF short-circuits straight to field extraction. A
//! scanned PDF yields its embedded page images so the OCR grid can
//! take over.

mod extractor;

pub use extractor::{NativeText, PdfDocument};

use crate::error::PdfError;

/// Extraction route tags reported in the final result.
pub const METHOD_PDF_EXTRACT: &str = "native_pdf_extract";
pub const METHOD_LOPDF: &str = "native_lopdf";
pub const METHOD_OCR: &str = "ocr";

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;
