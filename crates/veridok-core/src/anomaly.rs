//! Red-flag heuristics over the raw file and extracted text.
//!
//! Each detector appends a human-readable message; the count feeds
//! both the authenticity classification and the verification verdict.

use tracing::debug;

use crate::fields::FieldSet;
use crate::models::{AnomalyConfig, Authenticity, DocumentType, RawDocument};

/// Filename fragments typical of re-scanned or temporary copies.
const SUSPICIOUS_NAME_FRAGMENTS: &[&str] = &["copy", "salinan", "scan", "temp", "tmp"];

/// Section headers a genuine notarial deed is expected to contain.
/// Any alternative within a group satisfies that group.
const DEED_SECTIONS: &[&[&str]] = &[
    &["AKTA PENDIRIAN", "AKTA PERUBAHAN"],
    &["NOTARIS"],
    &["PERSEROAN TERBATAS"],
    &["MODAL DASAR"],
    &["ANGGARAN DASAR"],
];

/// Run every detector over the document, its extracted text, and the
/// fields pulled out of that text.
pub fn detect_anomalies(
    doc: &RawDocument,
    text: &str,
    fields: &FieldSet,
    config: &AnomalyConfig,
) -> Vec<String> {
    let mut anomalies = Vec::new();

    if doc.len() < config.min_file_size {
        anomalies.push(format!(
            "file size {} bytes below the {} byte minimum for a scanned document",
            doc.len(),
            config.min_file_size
        ));
    }
    if doc.len() > config.max_file_size {
        anomalies.push(format!(
            "file size {} bytes exceeds the {} byte maximum",
            doc.len(),
            config.max_file_size
        ));
    }

    if fields.is_empty() {
        anomalies.push("no fields extracted".to_string());
    }

    let text_chars = text.trim().chars().count();
    if text_chars < config.min_text_chars {
        anomalies.push(format!(
            "only {} readable characters extracted (minimum {})",
            text_chars, config.min_text_chars
        ));
    }

    let name = doc.file_name().to_lowercase();
    for fragment in SUSPICIOUS_NAME_FRAGMENTS {
        if name.contains(fragment) {
            anomalies.push(format!("file name contains suspicious fragment '{fragment}'"));
            break;
        }
    }

    if doc.doc_type() == DocumentType::CorporateDeed && text_chars >= config.min_text_chars {
        let upper = text.to_uppercase();
        for group in DEED_SECTIONS {
            if !group.iter().any(|section| upper.contains(section)) {
                anomalies.push(format!(
                    "deed is missing the expected '{}' section",
                    group[0]
                ));
            }
        }
    }

    debug!(count = anomalies.len(), "anomaly detection complete");
    anomalies
}

/// Classify authenticity from the fused confidence and the anomaly
/// count.
///
/// More than 3 anomalies is suspicious no matter how confident the
/// OCR and field extraction were. Below that, confidence decides:
/// under 0.4 is questionable, above 0.8 with at most one anomaly is
/// authentic, everything else needs a human look.
pub fn assess_authenticity(confidence: f64, anomalies: &[String]) -> Authenticity {
    if anomalies.len() > 3 {
        Authenticity::Suspicious
    } else if confidence < 0.4 {
        Authenticity::Questionable
    } else if confidence > 0.8 && anomalies.len() <= 1 {
        Authenticity::Authentic
    } else {
        Authenticity::NeedsVerification
    }
}
