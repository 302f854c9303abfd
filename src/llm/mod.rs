//! Language-model module for the help-desk assistant.
//!
//! This module provides:
//! * [`LlmClient`]: async trait for a single non-streaming completion.
//! * [`ApiClient`]: Ollama / OpenAI-compatible HTTP implementation.
//! * [`PromptBuilder`]: help-desk persona prompt for free-text questions.
//! * [`build_extraction_prompt`]: fenced invoice-extraction prompt.
//! * [`validate_response`] / [`evaluate_response`]: classify raw model output.
//! * [`check_schema`]: schema conformance for decoded output.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use helpdesk_assistant::config::AppConfig;
//! use helpdesk_assistant::llm::{build_extraction_prompt, evaluate_response, ApiClient, LlmClient};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let client = ApiClient::from_config(&config.llm);
//!
//!     let prompt = build_extraction_prompt("Invoice 12 from Acme, 40 euros, due May 1st");
//!     let raw = client.complete(None, &prompt).await.unwrap();
//!     println!("{:?}", evaluate_response(&raw));
//! }
//! ```

pub mod client;
pub mod extraction;
pub mod prompt;
pub mod schema;
pub mod validator;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{ApiClient, LlmClient, LlmError};
pub use extraction::{build_extraction_prompt, SCHEMA_TEMPLATE};
pub use prompt::PromptBuilder;
pub use schema::{check_schema, InvoiceRecord, LineItem, SchemaViolation};
pub use validator::{
    evaluate_response, validate_response, ExtractionOutcome, ExtractionResult,
    EXTRACTION_FAILED_MESSAGE,
};
