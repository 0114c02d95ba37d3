//! Structured field extraction and validation.
//!
//! Each document type carries one declarative [`DocumentTypeSpec`]
//! naming its required fields, regex patterns, keyword vocabulary, and
//! per-field kinds. Extraction, validation, keyword bonuses, and
//! completeness scoring all read the same table.

pub mod doctype;
pub mod extract;
pub mod validate;

pub use doctype::{DocumentTypeSpec, FieldKind, spec_for};
pub use extract::extract_fields;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One extracted field with its validation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    /// Text as matched in the document.
    pub raw: String,

    /// Canonicalized value (idempotent normalization).
    pub normalized: String,

    /// Intrinsic validity, for kinds that define a check. `None`
    /// means no check exists for this field kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_valid: Option<bool>,

    /// Decomposed sub-codes (e.g. NIK region parts, currency digits).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_parts: Option<BTreeMap<String, String>>,

    /// All values for multi-valued fields (directors, commissioners).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
}

/// Extracted fields keyed by field name; absent fields are absent keys.
pub type FieldSet = BTreeMap<String, FieldValue>;
