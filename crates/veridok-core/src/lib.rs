//! Core library for Indonesian document verification.
//!
//! This crate provides:
//! - Image preprocessing (a bank of OCR-oriented filter variants)
//! - A multi-engine OCR grid with quality-based candidate selection
//! - PDF processing (native text layers with an OCR fallback)
//! - Field extraction for KTP, corporate deeds, and related documents
//! - Anomaly detection and confidence-fused verification verdicts

pub mod anomaly;
pub mod error;
pub mod external;
pub mod fields;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod preprocess;
pub mod select;
pub mod verify;

pub use error::{ExtractionError, OcrError, PdfError, Result, VeridokError};
pub use fields::{FieldSet, FieldValue, extract_fields, spec_for};
pub use models::{
    Authenticity, DocumentKind, DocumentType, RawDocument, VeridokConfig, VerificationReport,
    VerificationStatus,
};
pub use ocr::{EngineRegistry, OcrEngine, TesseractEngine};
#[cfg(feature = "native")]
pub use ocr::NeuralEngine;
pub use pipeline::DocumentPipeline;
pub use select::{ExtractionCandidate, ExtractionResult, select_best};
