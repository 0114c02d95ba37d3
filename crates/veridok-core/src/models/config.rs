//! Configuration structures for the verification pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the veridok pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VeridokConfig {
    /// OCR execution configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Anomaly detection thresholds.
    pub anomaly: AnomalyConfig,

    /// Neural engine model file locations.
    pub models: ModelConfig,
}

/// OCR execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tokens below this confidence are discarded before text assembly.
    pub noise_floor: f32,

    /// Budget for a single engine invocation. An invocation that
    /// overruns it has its output dropped and the pair degrades to an
    /// empty candidate.
    pub engine_timeout_ms: u64,

    /// Overall per-document budget; exceeding it is a terminal error.
    pub document_timeout_ms: u64,

    /// Worker threads for the (variant x engine) grid. 0 = one per core.
    pub worker_threads: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            noise_floor: 0.3,
            engine_timeout_ms: 30_000,
            document_timeout_ms: 300_000,
            worker_threads: 0,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages routed through the OCR fallback.
    pub max_ocr_pages: u32,

    /// Minimum total characters for the OCR fallback to count as success.
    pub min_ocr_chars: usize,

    /// Minimum characters for a native text layer to be considered usable.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_ocr_pages: 5,
            min_ocr_chars: 50,
            min_text_length: 1,
        }
    }
}

/// Anomaly detection thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Files below this many bytes are flagged.
    pub min_file_size: usize,

    /// Files above this many bytes are flagged.
    pub max_file_size: usize,

    /// Extracted text shorter than this (trimmed) is flagged.
    pub min_text_chars: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            min_file_size: 10_000,
            max_file_size: 10_000_000,
            min_text_chars: 10,
        }
    }
}

/// Model file locations for the neural OCR engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
        }
    }
}

impl VeridokConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
