//! Classification of the language model's raw extraction output.
//!
//! [`validate_response`] only decides whether the text is JSON.  It never
//! fails: a parse error is folded into [`ExtractionResult::Failed`] together
//! with the untouched model output.
//!
//! [`evaluate_response`] adds the schema check on top and yields the
//! three-way [`ExtractionOutcome`] the UI renders.

use serde_json::Value;

use crate::llm::schema::{check_schema, InvoiceRecord, SchemaViolation};

/// Fixed user-facing notice for output that is not JSON.
pub const EXTRACTION_FAILED_MESSAGE: &str =
    "Failed to parse JSON from the language model response.";

// ---------------------------------------------------------------------------
// ExtractionResult
// ---------------------------------------------------------------------------

/// Result of strictly decoding the model output.  Exactly one state; never
/// partially parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    /// The whole output parsed as JSON.
    Decoded(Value),
    /// The output is not JSON.
    Failed {
        /// The model output exactly as received.
        raw: String,
        /// Parser error, for diagnostics.
        reason: String,
    },
}

impl ExtractionResult {
    pub fn is_decoded(&self) -> bool {
        matches!(self, ExtractionResult::Decoded(_))
    }

    /// The fixed user-facing notice for the failed state.
    pub fn failure_message(&self) -> Option<&'static str> {
        match self {
            ExtractionResult::Decoded(_) => None,
            ExtractionResult::Failed { .. } => Some(EXTRACTION_FAILED_MESSAGE),
        }
    }
}

/// Strictly decode `raw` as a single JSON document.
///
/// Leading and trailing whitespace is allowed (it is valid JSON text);
/// anything else around the document, such as prose or Markdown fences,
/// makes the whole output fail.
pub fn validate_response(raw: &str) -> ExtractionResult {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => ExtractionResult::Decoded(value),
        Err(e) => {
            log::debug!("model output is not JSON ({e}); len={}", raw.len());
            ExtractionResult::Failed {
                raw: raw.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ExtractionOutcome
// ---------------------------------------------------------------------------

/// What the user sees after an extraction run.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// JSON that conforms to the schema.
    Valid { json: Value, record: InvoiceRecord },
    /// JSON, but the wrong shape.  Never presented as success.
    SchemaMismatch {
        json: Value,
        violations: Vec<SchemaViolation>,
    },
    /// Not JSON at all.
    Unparsed { raw: String, reason: String },
}

impl ExtractionOutcome {
    /// Pretty-printed JSON for the decoded states.
    pub fn pretty_json(&self) -> Option<String> {
        match self {
            ExtractionOutcome::Valid { json, .. }
            | ExtractionOutcome::SchemaMismatch { json, .. } => {
                serde_json::to_string_pretty(json).ok()
            }
            ExtractionOutcome::Unparsed { .. } => None,
        }
    }
}

/// Decode then schema-check the model output.
pub fn evaluate_response(raw: &str) -> ExtractionOutcome {
    match validate_response(raw) {
        ExtractionResult::Failed { raw, reason } => ExtractionOutcome::Unparsed { raw, reason },
        ExtractionResult::Decoded(json) => match check_schema(&json) {
            Ok(record) => ExtractionOutcome::Valid { json, record },
            Err(violations) => {
                log::warn!(
                    "model output violates the extraction schema ({} problem(s))",
                    violations.len()
                );
                ExtractionOutcome::SchemaMismatch { json, violations }
            }
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
