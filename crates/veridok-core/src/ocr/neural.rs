//! Neural OCR engine backed by `pure-onnx-ocr`.

use std::path::Path;
use std::sync::Mutex;

use image::{DynamicImage, GrayImage};
use tracing::{debug, info};

use super::{EngineOutput, OcrEngine, TokenSpan};
use crate::error::OcrError;
use crate::models::config::ModelConfig;

/// Detection + recognition engine running PaddleOCR-style ONNX models
/// without an external runtime.
pub struct NeuralEngine {
    // The inner engine holds `RefCell` state and is not `Sync`; the
    // mutex makes the wrapper shareable as the `OcrEngine` trait requires.
    engine: Mutex<pure_onnx_ocr::engine::OcrEngine>,
}

// SAFETY: the inner engine is `!Send + !Sync` only because its inference
// sessions cache plans in `Arc<RefCell<...>>`. Those `Arc` clones are
// created in the engine's constructor and never handed out by its API, so
// the engine and every clone of its session `Arc`s move between threads as
// one unit, and the `Mutex` guarantees at most one thread touches the
// `RefCell`s at a time.
unsafe impl Send for NeuralEngine {}
unsafe impl Sync for NeuralEngine {}

impl NeuralEngine {
    /// Load models from the directory named in the configuration.
    pub fn from_config(config: &ModelConfig) -> Result<Self, OcrError> {
        Self::from_dir(
            &config.model_dir,
            &config.detection_model,
            &config.recognition_model,
            &config.dictionary,
        )
    }

    /// Load models from explicit file names under `model_dir`.
    pub fn from_dir(
        model_dir: &Path,
        det: &str,
        rec: &str,
        dict: &str,
    ) -> Result<Self, OcrError> {
        let det_path = model_dir.join(det);
        let rec_path = model_dir.join(rec);
        let dict_path = model_dir.join(dict);

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::EngineInit {
                engine: "pure-onnx".to_string(),
                reason: e.to_string(),
            })?;

        info!("loaded pure-onnx-ocr engine from {}", model_dir.display());
        Ok(Self {
            engine: Mutex::new(engine),
        })
    }
}

impl OcrEngine for NeuralEngine {
    fn name(&self) -> &str {
        "pure-onnx"
    }

    fn recognize(&self, image: &GrayImage) -> Result<EngineOutput, OcrError> {
        let dynamic = DynamicImage::ImageLuma8(image.clone());
        let regions = self
            .engine
            .lock()
            .expect("neural engine mutex poisoned")
            .run_from_image(&dynamic)
            .map_err(|e| OcrError::Engine {
                engine: "pure-onnx".to_string(),
                reason: e.to_string(),
            })?;

        debug!("pure-onnx returned {} text regions", regions.len());

        // Each detected region becomes one token span; the model's
        // region confidence stands in for a word confidence.
        let tokens = regions
            .iter()
            .map(|r| TokenSpan {
                text: r.text.replace("[UNK]", " ").trim().to_string(),
                confidence: r.confidence,
            })
            .filter(|t| !t.text.is_empty())
            .collect();

        Ok(EngineOutput { tokens })
    }
}
