//! Document inputs and the terminal verification report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::FieldSet;

/// The declared shape of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// A raster photograph or scan (jpg/png/bmp/tiff).
    Image,
    /// A PDF, either text-based or scanned.
    Pdf,
}

/// Indonesian document types supported by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// KTP - national identity card.
    IdentityCard,
    /// Akta perusahaan - notarial corporate deed.
    CorporateDeed,
    /// SIM - driver license.
    DriverLicense,
    /// Paspor.
    Passport,
    /// NPWP - tax identification card.
    TaxId,
    /// Kartu keluarga - family card.
    FamilyCard,
    /// Anything else.
    Other,
}

impl DocumentType {
    /// Stable tag used in reports and extraction-table lookup.
    pub fn tag(&self) -> &'static str {
        match self {
            DocumentType::IdentityCard => "identity_card",
            DocumentType::CorporateDeed => "corporate_deed",
            DocumentType::DriverLicense => "driver_license",
            DocumentType::Passport => "passport",
            DocumentType::TaxId => "tax_id",
            DocumentType::FamilyCard => "family_card",
            DocumentType::Other => "other",
        }
    }
}

/// An uploaded document: raw bytes plus declared kind and type.
///
/// Immutable once constructed; the pipeline only ever reads it.
#[derive(Debug, Clone)]
pub struct RawDocument {
    bytes: Vec<u8>,
    kind: DocumentKind,
    doc_type: DocumentType,
    file_name: String,
}

impl RawDocument {
    pub fn new(
        bytes: Vec<u8>,
        kind: DocumentKind,
        doc_type: DocumentType,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            kind,
            doc_type,
            file_name: file_name.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn doc_type(&self) -> DocumentType {
        self.doc_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Final verification decision for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// Combined confidence at or above 0.8.
    Verified,
    /// Combined confidence in [0.6, 0.8), or anomaly override.
    PendingReview,
    /// Combined confidence below 0.6.
    Rejected,
}

/// Heuristic authenticity classification, blending the fused
/// confidence with the anomaly count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Authenticity {
    Authentic,
    NeedsVerification,
    Questionable,
    /// More than 3 anomalies, regardless of confidence.
    Suspicious,
}

/// Terminal, serializable result returned to the caller.
///
/// Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Document type the pipeline ran with.
    pub document_type: DocumentType,

    /// Final decision.
    pub verification_status: VerificationStatus,

    /// Fused OCR + field-completeness confidence (0.0 - 1.0).
    pub confidence_score: f64,

    /// Average OCR confidence of the winning candidate.
    pub ocr_confidence: f64,

    /// File/OCR quality heuristic (0.0 - 1.0).
    pub quality_score: f64,

    /// Text of the winning extraction candidate.
    pub extracted_text: String,

    /// Structured fields pulled from the extracted text.
    pub detected_fields: FieldSet,

    /// Red flags raised by the anomaly detector.
    pub anomalies: Vec<String>,

    /// Heuristic authenticity classification.
    pub authenticity: Authenticity,

    /// Which extraction route produced the text
    /// (e.g. "clahe+tesseract", "native_pdf_extract", "ocr").
    pub extraction_method: String,

    /// Characters recovered per PDF page, in page order. Empty for
    /// single-image inputs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub page_chars: Vec<usize>,

    /// Wall-clock processing time.
    pub processing_time_ms: u64,

    /// When the verification finished.
    pub verified_at: DateTime<Utc>,
}
