//! Boundary traits for systems that sit downstream of verification.
//!
//! The pipeline never depends on these; callers wire them up when a
//! verified document should be indexed or questioned.

use std::collections::HashMap;

use crate::error::Result;

/// Answers free-form questions against previously supplied context.
pub trait AnswerProvider: Send + Sync {
    fn answer(&self, question: &str, context: &str) -> Result<String>;
}

/// Full-text index over verified document text.
pub trait DocumentIndex: Send + Sync {
    /// Store a document, returning its index id.
    fn index(&mut self, text: &str, metadata: &HashMap<String, String>) -> Result<String>;

    /// Top-k matching document ids for a query.
    fn search(&self, query: &str, k: usize) -> Result<Vec<String>>;
}
