//! Classical OCR engine backed by the `tesseract` binary.
//!
//! The image is written to a temporary PNG and tesseract is invoked
//! with TSV output, which carries per-word confidences. A missing or
//! failing binary surfaces as an engine error, which the executor
//! degrades to an empty candidate.

use std::process::Command;

use image::GrayImage;
use tracing::{debug, trace};

use super::{EngineOutput, OcrEngine, TokenSpan};
use crate::error::OcrError;

/// Tesseract CLI wrapper configured for Indonesian documents.
pub struct TesseractEngine {
    languages: String,
    psm: u32,
    oem: u32,
}

impl TesseractEngine {
    /// Create an engine with Indonesian + English traineddata.
    pub fn new() -> Self {
        Self {
            languages: "ind+eng".to_string(),
            psm: 6,
            oem: 3,
        }
    }

    /// Override the language pack list (e.g. "eng").
    pub fn with_languages(mut self, languages: impl Into<String>) -> Self {
        self.languages = languages.into();
        self
    }

    /// Check whether the tesseract binary can be invoked at all.
    pub fn is_available() -> bool {
        Command::new("tesseract")
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    fn run_tsv(&self, image: &GrayImage) -> Result<String, OcrError> {
        let file = tempfile::Builder::new()
            .prefix("veridok-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Engine {
                engine: "tesseract".to_string(),
                reason: format!("temp file: {}", e),
            })?;

        image.save(file.path()).map_err(|e| OcrError::Engine {
            engine: "tesseract".to_string(),
            reason: format!("failed to write image: {}", e),
        })?;

        let output = Command::new("tesseract")
            .arg(file.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .arg("--oem")
            .arg(self.oem.to_string())
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("tsv")
            .output()
            .map_err(|e| OcrError::Engine {
                engine: "tesseract".to_string(),
                reason: format!("failed to run binary: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine {
                engine: "tesseract".to_string(),
                reason: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &GrayImage) -> Result<EngineOutput, OcrError> {
        let tsv = self.run_tsv(image)?;
        let tokens = parse_tsv(&tsv);
        debug!("tesseract recognized {} tokens", tokens.len());
        Ok(EngineOutput { tokens })
    }
}

/// Parse tesseract TSV output into token spans.
///
/// Columns: level page block par line word left top width height conf
/// text. Non-word rows carry conf = -1 and are dropped.
fn parse_tsv(tsv: &str) -> Vec<TokenSpan> {
    let mut tokens = Vec::new();
    for line in tsv.lines().skip(1) {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 12 {
            continue;
        }
        let conf: f32 = match columns[10].parse() {
            Ok(c) => c,
            Err(_) => continue,
        };
        if conf < 0.0 {
            continue;
        }
        let text = columns[11].trim();
        if text.is_empty() {
            continue;
        }
        trace!("tesseract token {:?} conf {}", text, conf);
        tokens.push(TokenSpan {
            text: text.to_string(),
            confidence: conf / 100.0,
        });
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn test_parse_tsv_words() {
        let tsv = format!(
            "{HEADER}\n\
             1\t1\t0\t0\t0\t0\t0\t0\t100\t50\t-1\t\n\
             5\t1\t1\t1\t1\t1\t5\t5\t40\t12\t96\tNIK\n\
             5\t1\t1\t1\t1\t2\t50\t5\t90\t12\t88\t3171234567890123\n"
        );
        let tokens = parse_tsv(&tsv);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "NIK");
        assert!((tokens[0].confidence - 0.96).abs() < 1e-6);
        assert_eq!(tokens[1].text, "3171234567890123");
    }

    #[test]
    fn test_parse_tsv_skips_blank_and_negative() {
        let tsv = format!(
            "{HEADER}\n\
             5\t1\t1\t1\t1\t1\t5\t5\t40\t12\t-1\tignored\n\
             5\t1\t1\t1\t1\t2\t5\t5\t40\t12\t80\t \n\
             garbage line\n"
        );
        assert!(parse_tsv(&tsv).is_empty());
    }
}
