//! Desktop help-desk assistant.
//!
//! Files issues in a GitHub repository, answers help-desk questions with a
//! local language model, and extracts invoice data from recorded audio notes.

pub mod app;
pub mod audio;
pub mod config;
pub mod issue;
pub mod llm;
pub mod pipeline;
pub mod stt;
