//! Extraction candidates and quality-based selection.
//!
//! Every (preprocessing variant x OCR engine) pair produces one
//! candidate; so does every PDF page routed through the OCR fallback.
//! Selection is a pure argmax over `quality_score` with deterministic
//! tie-breaking, and the full ranked list is kept for audit.

use serde::Serialize;
use tracing::debug;

use crate::error::ExtractionError;
use crate::ocr::EngineOutput;

/// One extraction attempt, immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionCandidate {
    /// Preprocessing variant (or PDF page label) that produced this.
    pub method: String,

    /// Engine that recognized the text.
    pub engine: String,

    /// Registry position of the engine; lower wins ties.
    #[serde(skip)]
    pub engine_priority: usize,

    /// Concatenated text of tokens that survived the noise floor.
    pub text: String,

    /// Confidences of the kept tokens.
    pub token_confidences: Vec<f32>,

    /// Mean confidence over kept tokens; 0.0 if none survived.
    pub avg_confidence: f64,

    /// Character count of the trimmed text.
    pub text_len: usize,

    /// `text_len x avg_confidence x keyword_bonus`.
    pub quality_score: f64,
}

impl ExtractionCandidate {
    /// Build a candidate from raw engine output.
    ///
    /// Tokens below `noise_floor` are discarded before concatenation;
    /// the keyword bonus comes from the document type's vocabulary.
    pub fn from_output(
        method: impl Into<String>,
        engine: impl Into<String>,
        engine_priority: usize,
        output: EngineOutput,
        noise_floor: f32,
        vocabulary: &[&str],
    ) -> Self {
        let kept: Vec<_> = output
            .tokens
            .into_iter()
            .filter(|t| t.confidence >= noise_floor && !t.text.trim().is_empty())
            .collect();

        let text = kept
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string();

        let token_confidences: Vec<f32> = kept.iter().map(|t| t.confidence).collect();
        let avg_confidence = if token_confidences.is_empty() {
            0.0
        } else {
            token_confidences.iter().map(|&c| c as f64).sum::<f64>()
                / token_confidences.len() as f64
        };

        let text_len = text.chars().count();
        let quality_score = quality_score(text_len, avg_confidence, &text, vocabulary);

        Self {
            method: method.into(),
            engine: engine.into(),
            engine_priority,
            text,
            token_confidences,
            avg_confidence,
            text_len,
            quality_score,
        }
    }

    /// Zero-confidence empty candidate standing in for a failed pair.
    pub fn failed(
        method: impl Into<String>,
        engine: impl Into<String>,
        engine_priority: usize,
    ) -> Self {
        Self {
            method: method.into(),
            engine: engine.into(),
            engine_priority,
            text: String::new(),
            token_confidences: Vec::new(),
            avg_confidence: 0.0,
            text_len: 0,
            quality_score: 0.0,
        }
    }

    /// Combined label used in reports, e.g. "clahe+tesseract".
    pub fn label(&self) -> String {
        format!("{}+{}", self.method, self.engine)
    }
}

/// The winner plus the full ranked candidate list.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Index of the winner within `ranked` (always 0 after ranking).
    pub best: ExtractionCandidate,
    /// All candidates, best first.
    pub ranked: Vec<ExtractionCandidate>,
}

/// Bonus in [1.0, 3.0], linear in the fraction of vocabulary terms
/// found as case-insensitive substrings.
pub fn keyword_bonus(text: &str, vocabulary: &[&str]) -> f64 {
    if vocabulary.is_empty() {
        return 1.0;
    }
    let haystack = text.to_uppercase();
    let found = vocabulary
        .iter()
        .filter(|term| haystack.contains(&term.to_uppercase()))
        .count();
    let bonus = 1.0 + (found as f64 / vocabulary.len() as f64) * 2.0;
    bonus.min(3.0)
}

/// Heuristic ranking metric. Pure in its inputs and recomputable at
/// any time; nothing else feeds it.
pub fn quality_score(text_len: usize, avg_confidence: f64, text: &str, vocabulary: &[&str]) -> f64 {
    text_len as f64 * avg_confidence * keyword_bonus(text, vocabulary)
}

/// Pick the best candidate.
///
/// Ties break by engine priority, then by the order candidates were
/// produced (variant list order). An empty list, or one where every
/// candidate is empty with a zero score, is a hard failure.
pub fn select_best(
    candidates: Vec<ExtractionCandidate>,
) -> Result<ExtractionResult, ExtractionError> {
    if candidates.is_empty()
        || candidates
            .iter()
            .all(|c| c.quality_score == 0.0 && c.text_len == 0)
    {
        return Err(ExtractionError::NoCandidates);
    }

    let mut ranked = candidates;
    // Stable sort preserves production (variant) order for equal keys.
    ranked.sort_by(|a, b| {
        b.quality_score
            .partial_cmp(&a.quality_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.engine_priority.cmp(&b.engine_priority))
    });

    let best = ranked[0].clone();
    debug!(
        "selected {} (score {:.2}) out of {} candidates",
        best.label(),
        best.quality_score,
        ranked.len()
    );

    Ok(ExtractionResult { best, ranked })
}
