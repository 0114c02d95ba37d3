//! End-to-end document verification pipeline.
//!
//! Orchestrates the full chain: input gate, preprocessing, the OCR
//! grid (or the PDF native-text shortcut), candidate selection, field
//! extraction, anomaly detection, and confidence fusion into a
//! [`VerificationReport`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::DynamicImage;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::anomaly::{assess_authenticity, detect_anomalies};
use crate::error::{ExtractionError, PdfError, Result, VeridokError};
use crate::fields::{extract_fields, spec_for};
use crate::models::{DocumentKind, RawDocument, VeridokConfig, VerificationReport};
use crate::ocr::{Deadline, EngineRegistry, OcrExecutor};
use crate::pdf::{METHOD_OCR, PdfDocument};
use crate::preprocess::generate_variants;
use crate::select::select_best;
use crate::verify::{completeness_score, decide_status, fuse_confidence, quality_heuristic};

/// Confidence assigned to a native PDF text layer, which carries no
/// per-token OCR confidences.
const NATIVE_TEXT_CONFIDENCE: f64 = 0.95;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

/// Winning text plus how it was obtained.
struct ExtractedText {
    text: String,
    method: String,
    ocr_confidence: f64,
    /// Characters per PDF page; empty for single-image inputs.
    page_chars: Vec<usize>,
}

/// The verification pipeline. Engines are injected through the
/// registry; two pipelines with different registries are fully
/// independent.
pub struct DocumentPipeline {
    config: VeridokConfig,
    executor: OcrExecutor,
}

impl DocumentPipeline {
    pub fn new(registry: EngineRegistry, config: VeridokConfig) -> Result<Self> {
        if registry.is_empty() {
            return Err(VeridokError::Config(
                "at least one OCR engine must be registered".to_string(),
            ));
        }
        let executor = OcrExecutor::new(Arc::new(registry), &config.ocr)?;
        Ok(Self { config, executor })
    }

    pub fn config(&self) -> &VeridokConfig {
        &self.config
    }

    /// Verify a single document end to end.
    pub fn verify(&self, doc: &RawDocument) -> Result<VerificationReport> {
        let started = Instant::now();
        self.check_input(doc)?;

        let deadline = Deadline::new(Duration::from_millis(self.config.ocr.document_timeout_ms));
        let table = spec_for(doc.doc_type());

        let extracted = match doc.kind() {
            DocumentKind::Image => self.process_image(doc, table.keywords, deadline)?,
            DocumentKind::Pdf => self.process_pdf(doc, table.keywords, deadline)?,
        };

        let fields = extract_fields(table, &extracted.text);
        let field_score = completeness_score(table, &fields);
        let confidence = fuse_confidence(extracted.ocr_confidence, field_score);

        let anomalies = detect_anomalies(doc, &extracted.text, &fields, &self.config.anomaly);
        let status = decide_status(confidence, anomalies.len());
        let authenticity = assess_authenticity(confidence, &anomalies);
        let quality = quality_heuristic(doc.len(), doc.file_name(), extracted.ocr_confidence);

        let report = VerificationReport {
            document_type: doc.doc_type(),
            verification_status: status,
            confidence_score: confidence,
            ocr_confidence: extracted.ocr_confidence,
            quality_score: quality,
            extracted_text: extracted.text,
            detected_fields: fields,
            anomalies,
            authenticity,
            extraction_method: extracted.method,
            page_chars: extracted.page_chars,
            processing_time_ms: started.elapsed().as_millis() as u64,
            verified_at: chrono::Utc::now(),
        };
        info!(
            file = doc.file_name(),
            status = ?report.verification_status,
            confidence = report.confidence_score,
            method = %report.extraction_method,
            "document verified"
        );
        Ok(report)
    }

    /// Verify many documents in parallel, preserving input order.
    ///
    /// One document failing never affects its neighbors.
    pub fn verify_batch(&self, docs: &[RawDocument]) -> Vec<Result<VerificationReport>> {
        docs.par_iter().map(|doc| self.verify(doc)).collect()
    }

    /// Reject inputs before any expensive work starts.
    fn check_input(&self, doc: &RawDocument) -> Result<()> {
        if doc.is_empty() {
            return Err(ExtractionError::MalformedInput("empty document".to_string()).into());
        }
        let extension = doc
            .file_name()
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase());
        if let Some(ext) = extension {
            let matches_kind = match doc.kind() {
                DocumentKind::Image => IMAGE_EXTENSIONS.contains(&ext.as_str()),
                DocumentKind::Pdf => ext == "pdf",
            };
            if !matches_kind {
                return Err(VeridokError::UnsupportedInput(format!(
                    "extension .{} does not match declared kind {:?}",
                    ext,
                    doc.kind()
                )));
            }
        }
        Ok(())
    }

    fn process_image(
        &self,
        doc: &RawDocument,
        vocabulary: &[&str],
        deadline: Deadline,
    ) -> Result<ExtractedText> {
        let image = image::load_from_memory(doc.bytes())?;
        self.ocr_image(&image, vocabulary, deadline)
    }

    fn ocr_image(
        &self,
        image: &DynamicImage,
        vocabulary: &[&str],
        deadline: Deadline,
    ) -> Result<ExtractedText> {
        let variants = generate_variants(image);
        let candidates = self.executor.run_grid(&variants, vocabulary, deadline);
        if deadline.expired() {
            return Err(VeridokError::DeadlineExceeded(
                self.config.ocr.document_timeout_ms,
            ));
        }
        let result = select_best(candidates)?;
        debug!(
            winner = %result.best.label(),
            quality = result.best.quality_score,
            candidates = result.ranked.len(),
            "selected extraction candidate"
        );
        Ok(ExtractedText {
            method: result.best.label(),
            ocr_confidence: result.best.avg_confidence,
            text: result.best.text,
            page_chars: Vec::new(),
        })
    }

    /// PDF route: native text layers win outright; scanned PDFs fall
    /// back to OCR over their embedded page images.
    fn process_pdf(
        &self,
        doc: &RawDocument,
        vocabulary: &[&str],
        deadline: Deadline,
    ) -> Result<ExtractedText> {
        let pdf = PdfDocument::load(doc.bytes())?;

        if let Some(native) = pdf.native_text(self.config.pdf.min_text_length) {
            debug!(method = native.method, chars = native.text.len(), "native PDF text layer");
            return Ok(ExtractedText {
                text: native.text,
                method: native.method.to_string(),
                ocr_confidence: NATIVE_TEXT_CONFIDENCE,
                page_chars: native.page_chars,
            });
        }

        let pages = pdf.page_images(self.config.pdf.max_ocr_pages);
        if pages.is_empty() {
            return Err(PdfError::ImageExtraction(
                "no text layer and no decodable page images".to_string(),
            )
            .into());
        }

        let mut combined = String::new();
        let mut weighted_confidence = 0.0;
        let mut total_chars = 0usize;
        let mut page_chars = Vec::new();
        for (number, image) in pages {
            if deadline.expired() {
                return Err(VeridokError::DeadlineExceeded(
                    self.config.ocr.document_timeout_ms,
                ));
            }
            match self.ocr_image(&image, vocabulary, deadline) {
                Ok(page) => {
                    let chars = page.text.chars().count();
                    weighted_confidence += page.ocr_confidence * chars as f64;
                    total_chars += chars;
                    page_chars.push(chars);
                    if !combined.is_empty() {
                        combined.push_str("\n\n");
                    }
                    combined.push_str(&page.text);
                }
                Err(VeridokError::Extraction(ExtractionError::NoCandidates)) => {
                    warn!(page = number, "no usable OCR output for PDF page");
                    page_chars.push(0);
                }
                Err(e) => return Err(e),
            }
        }

        if total_chars < self.config.pdf.min_ocr_chars {
            return Err(ExtractionError::BelowThreshold {
                method: METHOD_OCR.to_string(),
                chars: total_chars,
                min: self.config.pdf.min_ocr_chars,
            }
            .into());
        }

        Ok(ExtractedText {
            text: combined,
            method: METHOD_OCR.to_string(),
            ocr_confidence: weighted_confidence / total_chars as f64,
            page_chars,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentType, VerificationStatus};
    use crate::ocr::testing::FixedEngine;
    use crate::pdf::testing::{image_pdf, text_pdf};
    use image::{GrayImage, Luma};
    use std::io::Cursor;
    use std::sync::Arc;

    const KTP_TOKENS: &[(&str, f32)] = &[
        ("NIK:", 0.95),
        ("3171234567890123", 0.95),
        ("NAMA:", 0.95),
        ("BUDI", 0.95),
        ("SANTOSO", 0.95),
        ("TEMPAT", 0.95),
        ("LAHIR:", 0.95),
        ("JAKARTA", 0.95),
        ("17-08-1990", 0.95),
    ];

    fn png_bytes() -> Vec<u8> {
        let image = GrayImage::from_pixel(64, 64, Luma([128u8]));
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(image)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn pipeline_with_tokens(tokens: &[(&'static str, f32)]) -> DocumentPipeline {
        let mut registry = EngineRegistry::new();
        registry.register(Arc::new(FixedEngine {
            label: "fixed".to_string(),
            tokens: tokens.to_vec(),
        }));
        DocumentPipeline::new(registry, VeridokConfig::default()).unwrap()
    }

    #[test]
    fn test_empty_registry_is_rejected() {
        let result = DocumentPipeline::new(EngineRegistry::new(), VeridokConfig::default());
        assert!(matches!(result, Err(VeridokError::Config(_))));
    }

    #[test]
    fn test_empty_document_is_rejected() {
        let pipeline = pipeline_with_tokens(KTP_TOKENS);
        let doc = RawDocument::new(
            Vec::new(),
            DocumentKind::Image,
            DocumentType::IdentityCard,
            "ktp.png",
        );
        assert!(matches!(
            pipeline.verify(&doc),
            Err(VeridokError::Extraction(ExtractionError::MalformedInput(_)))
        ));
    }

    #[test]
    fn test_extension_kind_mismatch_is_rejected() {
        let pipeline = pipeline_with_tokens(KTP_TOKENS);
        let doc = RawDocument::new(
            png_bytes(),
            DocumentKind::Pdf,
            DocumentType::IdentityCard,
            "ktp.png",
        );
        assert!(matches!(
            pipeline.verify(&doc),
            Err(VeridokError::UnsupportedInput(_))
        ));
    }

    #[test]
    fn test_ktp_image_end_to_end() {
        let pipeline = pipeline_with_tokens(KTP_TOKENS);
        let doc = RawDocument::new(
            png_bytes(),
            DocumentKind::Image,
            DocumentType::IdentityCard,
            "ktp.png",
        );
        let report = pipeline.verify(&doc).unwrap();

        assert_eq!(report.document_type, DocumentType::IdentityCard);
        assert_eq!(report.detected_fields["nik"].raw, "3171234567890123");
        assert_eq!(report.detected_fields["nik"].is_valid, Some(true));
        assert!(report.detected_fields.contains_key("nama"));
        // 0.95 * 0.7 + 0.825 * 0.3
        assert_eq!(report.verification_status, VerificationStatus::Verified);
        assert!(report.extraction_method.ends_with("+fixed"));
        assert!((report.ocr_confidence - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_garbage_image_tokens_are_rejected() {
        let pipeline = pipeline_with_tokens(&[("xq", 0.1), ("zz", 0.05)]);
        let doc = RawDocument::new(
            png_bytes(),
            DocumentKind::Image,
            DocumentType::IdentityCard,
            "ktp.png",
        );
        // All tokens fall below the noise floor, so every candidate is
        // empty and selection fails.
        assert!(matches!(
            pipeline.verify(&doc),
            Err(VeridokError::Extraction(ExtractionError::NoCandidates))
        ));
    }

    #[test]
    fn test_native_pdf_route_reports_method() {
        let pipeline = pipeline_with_tokens(KTP_TOKENS);
        let doc = RawDocument::new(
            text_pdf("NIK: 3171234567890123 NAMA: BUDI SANTOSO"),
            DocumentKind::Pdf,
            DocumentType::IdentityCard,
            "ktp.pdf",
        );
        let report = pipeline.verify(&doc).unwrap();
        assert!(
            report.extraction_method.starts_with("native_"),
            "{}",
            report.extraction_method
        );
        assert!(!report.page_chars.is_empty());
        assert_eq!(report.detected_fields["nik"].is_valid, Some(true));
    }

    #[test]
    fn test_scanned_pdf_falls_back_to_ocr() {
        let pipeline = pipeline_with_tokens(KTP_TOKENS);
        let doc = RawDocument::new(
            image_pdf(64, 64),
            DocumentKind::Pdf,
            DocumentType::IdentityCard,
            "ktp_scan.pdf",
        );
        let report = pipeline.verify(&doc).unwrap();
        assert_eq!(report.extraction_method, "ocr");
        assert!(report.extracted_text.contains("3171234567890123"));
        assert_eq!(report.page_chars.len(), 1);
        assert_eq!(report.page_chars[0], report.extracted_text.chars().count());
    }

    #[test]
    fn test_scanned_pdf_with_sparse_ocr_is_below_threshold() {
        // A single short token is far under the 50-char floor for the
        // OCR fallback to count as a successful extraction.
        let pipeline = pipeline_with_tokens(&[("NIK", 0.9)]);
        let doc = RawDocument::new(
            image_pdf(64, 64),
            DocumentKind::Pdf,
            DocumentType::IdentityCard,
            "ktp_scan.pdf",
        );
        assert!(matches!(
            pipeline.verify(&doc),
            Err(VeridokError::Extraction(ExtractionError::BelowThreshold {
                min: 50,
                ..
            }))
        ));
    }

    #[test]
    fn test_suspicious_despite_high_confidence() {
        let pipeline = pipeline_with_tokens(KTP_TOKENS);
        // Tiny file, a copy-suffixed name, no deed fields in the
        // recognized text, and every structural section absent.
        let doc = RawDocument::new(
            png_bytes(),
            DocumentKind::Image,
            DocumentType::CorporateDeed,
            "akta_copy.png",
        );
        let report = pipeline.verify(&doc).unwrap();
        assert!(report.anomalies.len() > 3, "{:?}", report.anomalies);
        assert_eq!(report.authenticity, crate::models::Authenticity::Suspicious);
        assert_ne!(report.verification_status, VerificationStatus::Verified);
    }

    #[test]
    fn test_batch_preserves_order_and_isolates_failures() {
        let pipeline = pipeline_with_tokens(KTP_TOKENS);
        let good = RawDocument::new(
            png_bytes(),
            DocumentKind::Image,
            DocumentType::IdentityCard,
            "a.png",
        );
        let bad = RawDocument::new(
            Vec::new(),
            DocumentKind::Image,
            DocumentType::IdentityCard,
            "b.png",
        );
        let results = pipeline.verify_batch(&[good, bad]);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_processing_time_is_recorded() {
        let pipeline = pipeline_with_tokens(KTP_TOKENS);
        let doc = RawDocument::new(
            png_bytes(),
            DocumentKind::Image,
            DocumentType::IdentityCard,
            "ktp.png",
        );
        let report = pipeline.verify(&doc).unwrap();
        assert!(report.processing_time_ms < 120_000);
    }
}
