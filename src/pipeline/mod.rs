//! Orchestrator module for the help-desk assistant.
//!
//! Wires the UI's commands to the issue tracker, the language model and the
//! transcription adapter, and exposes the shared state that the UI reads
//! every frame.
//!
//! # Architecture
//!
//! ```text
//! AssistantApp (egui, main thread)
//!        │ AssistantCommand (mpsc)
//!        ▼
//! AssistantOrchestrator::run()  ← async tokio task, one command at a time
//!        │
//!        ├─ SubmitIssue       → IssueTracker::create_issue
//!        ├─ AskQuestion       → LlmClient::complete (help-desk persona)
//!        └─ ProcessAudioNote  → spawn_blocking(transcribe_audio)
//!                               → LlmClient::complete (extraction prompt)
//!                               → evaluate_response
//!
//! SharedState (Arc<Mutex<AppState>>) ←─── read by egui update() each frame
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{AssistantCommand, AssistantOrchestrator};
pub use state::{lock_state, new_shared_state, AppState, IssueOutcome, PipelineState, SharedState};
