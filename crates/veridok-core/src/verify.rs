//! Confidence fusion and verdict thresholds.
//!
//! The final confidence blends OCR quality with field completeness at
//! a fixed 0.7 / 0.3 split, then maps to a verdict: >= 0.8 verified,
//! >= 0.6 pending review, below that rejected. Too many anomalies
//! demote a verified result to pending review.

use tracing::debug;

use crate::fields::doctype::DocumentTypeSpec;
use crate::fields::FieldSet;
use crate::models::VerificationStatus;

const OCR_WEIGHT: f64 = 0.7;
const FIELD_WEIGHT: f64 = 0.3;

const VERIFIED_THRESHOLD: f64 = 0.8;
const REVIEW_THRESHOLD: f64 = 0.6;

/// Anomaly count above which a document cannot be verified outright.
const ANOMALY_TOLERANCE: usize = 3;

/// File size range of a well-scanned single document (100 KB - 2 MB).
const WELL_SIZED_MIN: usize = 100_000;
const WELL_SIZED_MAX: usize = 2_000_000;

/// Overall document quality heuristic in [0.0, 1.0].
///
/// Base 0.5, plus a bonus for a plausible scan size (oversized files
/// earn less), plus a format bonus for common photo formats over PDF,
/// plus 0.2 scaled by OCR confidence.
pub fn quality_heuristic(file_size: usize, file_name: &str, ocr_confidence: f64) -> f64 {
    let mut score = 0.5;

    if file_size > WELL_SIZED_MIN && file_size < WELL_SIZED_MAX {
        score += 0.3;
    } else if file_size >= WELL_SIZED_MAX {
        score += 0.1;
    }

    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase());
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") | Some("png") => score += 0.2,
        Some("pdf") => score += 0.1,
        _ => {}
    }

    score += ocr_confidence * 0.2;
    score.min(1.0)
}

/// Score how completely the required fields were extracted.
///
/// Per required field: 0.9 when present and validated, 0.3 when
/// present but failing validation, 0.8 when present with no validator,
/// 0.0 when absent. The mean over the required set is returned; a
/// document type with no required fields scores a neutral 0.5.
pub fn completeness_score(table: &DocumentTypeSpec, fields: &FieldSet) -> f64 {
    if table.required.is_empty() {
        return 0.5;
    }
    let total: f64 = table
        .required
        .iter()
        .map(|name| match fields.get(*name) {
            Some(value) => match value.is_valid {
                Some(true) => 0.9,
                Some(false) => 0.3,
                None => 0.8,
            },
            None => 0.0,
        })
        .sum();
    total / table.required.len() as f64
}

/// Blend OCR confidence with field completeness.
pub fn fuse_confidence(ocr_confidence: f64, field_score: f64) -> f64 {
    ocr_confidence * OCR_WEIGHT + field_score * FIELD_WEIGHT
}

/// Map a fused confidence and anomaly count to a verdict.
pub fn decide_status(confidence: f64, anomaly_count: usize) -> VerificationStatus {
    let status = if confidence >= VERIFIED_THRESHOLD {
        VerificationStatus::Verified
    } else if confidence >= REVIEW_THRESHOLD {
        VerificationStatus::PendingReview
    } else {
        VerificationStatus::Rejected
    };
    if status == VerificationStatus::Verified && anomaly_count > ANOMALY_TOLERANCE {
        debug!(anomaly_count, "anomaly count demotes verified result");
        return VerificationStatus::PendingReview;
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::doctype::spec_for;
    use crate::fields::{extract_fields, FieldSet, FieldValue};
    use crate::models::DocumentType;
    use pretty_assertions::assert_eq;

    fn field(is_valid: Option<bool>) -> FieldValue {
        FieldValue {
            raw: "X Y".to_string(),
            normalized: "X Y".to_string(),
            is_valid,
            sub_parts: None,
            items: None,
        }
    }

    #[test]
    fn test_quality_heuristic_components() {
        // Well-sized jpg with strong OCR: 0.5 + 0.3 + 0.2 + 0.19, capped.
        assert_eq!(quality_heuristic(200_000, "ktp.jpg", 0.95), 1.0);
        // Oversized pdf: 0.5 + 0.1 + 0.1 + 0.1.
        let pdf = quality_heuristic(3_000_000, "akta.pdf", 0.5);
        assert!((pdf - 0.8).abs() < 1e-9);
        // Tiny file with an unknown extension earns only the base and
        // the OCR factor: 0.5 + 0.02.
        let low = quality_heuristic(2_000, "scan.bin", 0.1);
        assert!((low - 0.52).abs() < 1e-9);
    }

    #[test]
    fn test_quality_heuristic_size_window_is_exclusive() {
        let at_min = quality_heuristic(100_000, "a.bin", 0.0);
        let above_min = quality_heuristic(100_001, "a.bin", 0.0);
        assert!((at_min - 0.5).abs() < 1e-9);
        assert!((above_min - 0.8).abs() < 1e-9);
        let at_max = quality_heuristic(2_000_000, "a.bin", 0.0);
        assert!((at_max - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_completeness_all_valid() {
        let table = spec_for(DocumentType::IdentityCard);
        let mut fields = FieldSet::new();
        fields.insert("nik".to_string(), field(Some(true)));
        fields.insert("nama".to_string(), field(None));
        fields.insert("tempat_lahir".to_string(), field(None));
        fields.insert("tanggal_lahir".to_string(), field(None));
        // (0.9 + 0.8 + 0.8 + 0.8) / 4
        let score = completeness_score(table, &fields);
        assert!((score - 0.825).abs() < 1e-9);
    }

    #[test]
    fn test_completeness_invalid_field_scores_low() {
        let table = spec_for(DocumentType::IdentityCard);
        let mut fields = FieldSet::new();
        fields.insert("nik".to_string(), field(Some(false)));
        // (0.3 + 0 + 0 + 0) / 4
        let score = completeness_score(table, &fields);
        assert!((score - 0.075).abs() < 1e-9);
    }

    #[test]
    fn test_completeness_empty_requirements_is_neutral() {
        let table = spec_for(DocumentType::Other);
        assert_eq!(completeness_score(table, &FieldSet::new()), 0.5);
    }

    #[test]
    fn test_fusion_weights() {
        assert!((fuse_confidence(1.0, 0.0) - 0.7).abs() < 1e-9);
        assert!((fuse_confidence(0.0, 1.0) - 0.3).abs() < 1e-9);
        assert!((fuse_confidence(0.9, 0.825) - 0.8775).abs() < 1e-9);
    }

    #[test]
    fn test_status_thresholds_are_inclusive() {
        assert_eq!(decide_status(0.8, 0), VerificationStatus::Verified);
        assert_eq!(decide_status(0.79999, 0), VerificationStatus::PendingReview);
        assert_eq!(decide_status(0.6, 0), VerificationStatus::PendingReview);
        assert_eq!(decide_status(0.59999, 0), VerificationStatus::Rejected);
        assert_eq!(decide_status(0.0, 0), VerificationStatus::Rejected);
    }

    #[test]
    fn test_anomalies_demote_verified_only() {
        assert_eq!(decide_status(0.95, 4), VerificationStatus::PendingReview);
        assert_eq!(decide_status(0.95, 3), VerificationStatus::Verified);
        // Already below verified: anomalies change nothing.
        assert_eq!(decide_status(0.7, 10), VerificationStatus::PendingReview);
        assert_eq!(decide_status(0.2, 10), VerificationStatus::Rejected);
    }

    #[test]
    fn test_extracted_ktp_scores_verified() {
        let table = spec_for(DocumentType::IdentityCard);
        let text = "NIK: 3171234567890123\n\
            Nama: BUDI SANTOSO\n\
            Tempat/Tgl Lahir: JAKARTA, 17-08-1990\n\
            Tanggal Lahir: 17-08-1990";
        let fields = extract_fields(table, text);
        let completeness = completeness_score(table, &fields);
        let confidence = fuse_confidence(0.92, completeness);
        assert_eq!(decide_status(confidence, 0), VerificationStatus::Verified);
    }
}
