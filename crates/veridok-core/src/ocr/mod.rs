//! OCR engines and the multi-engine executor.
//!
//! Engines are heavyweight to construct, so they are built once per
//! process, collected into an [`EngineRegistry`], and injected into
//! the pipeline. Registration order doubles as the deterministic
//! priority order used to break candidate-selection ties.

mod executor;
#[cfg(feature = "native")]
mod neural;
mod tesseract;

pub use executor::{Deadline, OcrExecutor};
#[cfg(feature = "native")]
pub use neural::NeuralEngine;
pub use tesseract::TesseractEngine;

use std::sync::Arc;

use image::GrayImage;

use crate::error::OcrError;

/// One recognized token with its engine-reported confidence.
#[derive(Debug, Clone)]
pub struct TokenSpan {
    /// Token text.
    pub text: String,
    /// Engine confidence (0.0 - 1.0).
    pub confidence: f32,
}

/// Raw output of one engine invocation, before noise filtering.
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    /// Tokens in reading order.
    pub tokens: Vec<TokenSpan>,
}

/// A text recognition engine.
///
/// Implementations must be cheap to call repeatedly and safe to share
/// across worker threads; all per-call state stays on the stack.
pub trait OcrEngine: Send + Sync {
    /// Short stable name, used in candidate method labels and logs.
    fn name(&self) -> &str;

    /// Recognize text in a preprocessed grayscale image.
    fn recognize(&self, image: &GrayImage) -> Result<EngineOutput, OcrError>;
}

/// Process-wide set of OCR engines.
///
/// Built once at startup and shared via `Arc`; the pipeline never
/// constructs engines on its own.
#[derive(Default)]
pub struct EngineRegistry {
    engines: Vec<Arc<dyn OcrEngine>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an engine. Earlier registrations win selection ties.
    pub fn register(&mut self, engine: Arc<dyn OcrEngine>) -> &mut Self {
        self.engines.push(engine);
        self
    }

    pub fn engines(&self) -> &[Arc<dyn OcrEngine>] {
        &self.engines
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}
