//! Orchestrator state machine and shared application state.
//!
//! [`PipelineState`] tracks what the orchestrator is doing right now.  The UI
//! reads it via [`SharedState`] to show a spinner and disable inputs.
//!
//! [`AppState`] is the single source of truth for everything the UI renders:
//! the current phase, the last outcome of each kind of action, and any error
//! message.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::llm::ExtractionOutcome;

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// Phases of the orchestrator.
///
/// ```text
/// Idle ──SubmitIssue──────▶ SubmittingIssue ─────────────────▶ Done
///      ──AskQuestion──────▶ Answering ───────────────────────▶ Done
///      ──ProcessAudioNote─▶ Transcribing ──▶ Extracting ─────▶ Done
/// any busy state ──error──▶ Error
/// ```
///
/// `Done` and `Error` are resting states; the next command starts a new cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    SubmittingIssue,
    Answering,
    /// Decoding the upload and running Whisper on the blocking pool.
    Transcribing,
    /// Waiting for the language model to return the extraction JSON.
    Extracting,
    Done,
    Error,
}

impl PipelineState {
    /// Returns `true` while a command is being processed.
    ///
    /// ```
    /// use helpdesk_assistant::pipeline::PipelineState;
    ///
    /// assert!(!PipelineState::Idle.is_busy());
    /// assert!(PipelineState::Transcribing.is_busy());
    /// assert!(!PipelineState::Error.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            PipelineState::SubmittingIssue
                | PipelineState::Answering
                | PipelineState::Transcribing
                | PipelineState::Extracting
        )
    }

    /// Short label for the status line.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Ready",
            PipelineState::SubmittingIssue => "Submitting issue…",
            PipelineState::Answering => "Thinking…",
            PipelineState::Transcribing => "Transcribing audio…",
            PipelineState::Extracting => "Extracting invoice data…",
            PipelineState::Done => "Done",
            PipelineState::Error => "Error",
        }
    }
}

// ---------------------------------------------------------------------------
// IssueOutcome
// ---------------------------------------------------------------------------

/// Result of the last issue submission, as shown under the issue form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    Created { url: String },
    Failed { message: String },
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Shared application state.
///
/// The orchestrator writes it; the egui update loop reads it each frame.
#[derive(Debug, Default)]
pub struct AppState {
    pub pipeline: PipelineState,

    /// Last issue submission result.
    pub issue_outcome: Option<IssueOutcome>,

    /// Answer to the last help-desk question.
    pub answer: Option<String>,

    /// Transcript of the last audio note.  Set as soon as Whisper finishes,
    /// before extraction starts.
    pub transcript: Option<String>,

    /// Classified extraction output for the last audio note.
    pub extraction: Option<ExtractionOutcome>,

    /// Message for the last failed question or audio note.
    pub error_message: Option<String>,
}


// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`AppState`].
///
/// Lock with [`lock_state`] for a short critical section; do **not** hold
/// the guard across `.await` points.
pub type SharedState = Arc<Mutex<AppState>>;

pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(AppState::default()))
}

/// Lock the shared state, recovering the guard if a previous holder panicked.
///
/// Every writer leaves `AppState` consistent between statements, so a
/// poisoned lock still holds usable data.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, AppState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
