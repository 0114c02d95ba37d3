//! Error types for the veridok-core library.

use thiserror::Error;

/// Main error type for the veridok library.
#[derive(Error, Debug)]
pub enum VeridokError {
    /// The input was rejected before the pipeline started.
    #[error("unsupported input type: {0}")]
    UnsupportedInput(String),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Image decoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The per-document deadline was exceeded.
    #[error("document processing exceeded {0} ms")]
    DeadlineExceeded(u64),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract page images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
///
/// An `Engine` error is recoverable at the (variant, engine) pair
/// granularity: the executor converts it into a zero-confidence empty
/// candidate instead of letting it cross the component boundary.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load or start an OCR engine.
    #[error("failed to initialize engine {engine}: {reason}")]
    EngineInit { engine: String, reason: String },

    /// One engine invocation failed.
    #[error("engine {engine} failed: {reason}")]
    Engine { engine: String, reason: String },

    /// One engine invocation exceeded its timeout.
    #[error("engine {engine} timed out after {timeout_ms} ms")]
    Timeout { engine: String, timeout_ms: u64 },

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors related to structured field extraction and selection.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Every (variant, engine) pair failed or produced empty text.
    #[error("no usable extraction candidates were produced")]
    NoCandidates,

    /// PDF OCR fallback produced too little text to trust.
    #[error("extraction via {method} produced {chars} chars, below the {min} minimum")]
    BelowThreshold {
        method: String,
        chars: usize,
        min: usize,
    },

    /// The extractor was handed malformed input.
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

/// Result type for the veridok library.
pub type Result<T> = std::result::Result<T, VeridokError>;
