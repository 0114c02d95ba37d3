//! Data models for documents, reports, and configuration.

pub mod config;
pub mod document;

pub use config::{AnomalyConfig, ModelConfig, OcrConfig, PdfConfig, VeridokConfig};
pub use document::{
    Authenticity, DocumentKind, DocumentType, RawDocument, VerificationReport,
    VerificationStatus,
};
