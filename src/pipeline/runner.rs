//! Assistant orchestrator: runs one user action at a time.
//!
//! [`AssistantOrchestrator`] owns the collaborators and responds to
//! [`AssistantCommand`]s received over a `tokio::sync::mpsc` channel.
//!
//! # Flows
//!
//! ```text
//! SubmitIssue(submission)
//!   └─▶ tracker.create_issue                     [SubmittingIssue]
//!         ├─ Ok  → IssueOutcome::Created          [Done]
//!         └─ Err → IssueOutcome::Failed           [Error]
//!
//! AskQuestion { question }
//!   └─▶ llm.complete(help-desk persona, question) [Answering]
//!
//! ProcessAudioNote { file_name, bytes }
//!   └─▶ spawn_blocking(transcribe_audio)          [Transcribing]
//!         └─▶ llm.complete(extraction prompt)     [Extracting]
//!               └─▶ evaluate_response → ExtractionOutcome [Done]
//! ```
//!
//! Commands are handled strictly in arrival order; a command is finished
//! before the next one is read.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::issue::{IssueSubmission, IssueTracker};
use crate::llm::{build_extraction_prompt, evaluate_response, LlmClient, PromptBuilder};
use crate::stt::{transcribe_audio, SttEngine};

use super::state::{lock_state, IssueOutcome, PipelineState, SharedState};

// ---------------------------------------------------------------------------
// AssistantCommand
// ---------------------------------------------------------------------------

/// A user action sent from the UI to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantCommand {
    /// File a validated issue with the tracker.
    SubmitIssue(IssueSubmission),
    /// Ask the help-desk assistant a free-text question.
    AskQuestion { question: String },
    /// Transcribe an uploaded audio note and extract invoice data from it.
    ProcessAudioNote { file_name: String, bytes: Vec<u8> },
}

// ---------------------------------------------------------------------------
// AssistantOrchestrator
// ---------------------------------------------------------------------------

/// Drives every user action against the shared state.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use helpdesk_assistant::pipeline::{new_shared_state, AssistantOrchestrator};
/// # use helpdesk_assistant::{issue::IssueTracker, llm::LlmClient, stt::SttEngine};
/// # fn make_stt() -> Arc<dyn SttEngine> { unimplemented!() }
/// # fn make_llm() -> Arc<dyn LlmClient> { unimplemented!() }
/// # fn make_tracker() -> Arc<dyn IssueTracker> { unimplemented!() }
///
/// # async fn example() {
/// let state = new_shared_state();
/// let (tx, rx) = tokio::sync::mpsc::channel(16);
/// let orchestrator = AssistantOrchestrator::new(state, make_stt(), make_llm(), make_tracker());
/// tokio::spawn(orchestrator.run(rx));
/// # drop(tx);
/// # }
/// ```
pub struct AssistantOrchestrator {
    state: SharedState,
    stt: Arc<dyn SttEngine>,
    llm: Arc<dyn LlmClient>,
    tracker: Arc<dyn IssueTracker>,
    prompts: PromptBuilder,
}

impl AssistantOrchestrator {
    pub fn new(
        state: SharedState,
        stt: Arc<dyn SttEngine>,
        llm: Arc<dyn LlmClient>,
        tracker: Arc<dyn IssueTracker>,
    ) -> Self {
        Self {
            state,
            stt,
            llm,
            tracker,
            prompts: PromptBuilder::help_desk(),
        }
    }

    /// Run until `commands` is closed.
    pub async fn run(self, mut commands: mpsc::Receiver<AssistantCommand>) {
        while let Some(command) = commands.recv().await {
            match command {
                AssistantCommand::SubmitIssue(submission) => {
                    self.handle_submit_issue(submission).await;
                }
                AssistantCommand::AskQuestion { question } => {
                    self.handle_question(&question).await;
                }
                AssistantCommand::ProcessAudioNote { file_name, bytes } => {
                    self.handle_audio_note(&file_name, bytes).await;
                }
            }
        }

        log::info!("orchestrator: command channel closed, shutting down");
    }

    // -----------------------------------------------------------------------
    // Command handlers
    // -----------------------------------------------------------------------

    async fn handle_submit_issue(&self, submission: IssueSubmission) {
        {
            let mut st = lock_state(&self.state);
            st.pipeline = PipelineState::SubmittingIssue;
            st.issue_outcome = None;
        }

        let (outcome, next) = match self.tracker.create_issue(&submission).await {
            Ok(receipt) => (IssueOutcome::Created { url: receipt.url }, PipelineState::Done),
            Err(e) => {
                log::error!("orchestrator: issue submission failed: {e}");
                (
                    IssueOutcome::Failed {
                        message: e.to_string(),
                    },
                    PipelineState::Error,
                )
            }
        };

        let mut st = lock_state(&self.state);
        st.issue_outcome = Some(outcome);
        st.pipeline = next;
    }

    async fn handle_question(&self, question: &str) {
        if question.trim().is_empty() {
            self.set_error("Please type a question first.".into());
            return;
        }

        {
            let mut st = lock_state(&self.state);
            st.pipeline = PipelineState::Answering;
            st.answer = None;
            st.error_message = None;
        }

        let (system, user) = self.prompts.build_chat(question);
        match self.llm.complete(Some(&system), &user).await {
            Ok(answer) if answer.trim().is_empty() => {
                self.set_error("The assistant returned an empty answer.".into());
            }
            Ok(answer) => {
                let mut st = lock_state(&self.state);
                st.answer = Some(answer.trim().to_string());
                st.pipeline = PipelineState::Done;
            }
            Err(e) => self.set_error(format!("Could not get an answer: {e}")),
        }
    }

    async fn handle_audio_note(&self, file_name: &str, bytes: Vec<u8>) {
        {
            let mut st = lock_state(&self.state);
            st.pipeline = PipelineState::Transcribing;
            st.transcript = None;
            st.extraction = None;
            st.error_message = None;
        }

        // ── 1. Decode + Whisper (blocking → thread pool) ─────────────────
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        let stt = Arc::clone(&self.stt);
        let stt_result =
            tokio::task::spawn_blocking(move || transcribe_audio(stt.as_ref(), &bytes, &extension))
                .await;

        let transcript = match stt_result {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                self.set_error(format!("Transcription failed: {e}"));
                return;
            }
            Err(e) => {
                self.set_error(format!("Internal error: {e}"));
                return;
            }
        };

        log::debug!("orchestrator: transcript = {transcript:?}");
        {
            let mut st = lock_state(&self.state);
            st.transcript = Some(transcript.clone());
            st.pipeline = PipelineState::Extracting;
        }

        // ── 2. Extraction prompt → LLM ───────────────────────────────────
        let prompt = build_extraction_prompt(&transcript);
        let raw = match self.llm.complete(None, &prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                self.set_error(format!("Extraction failed: {e}"));
                return;
            }
        };

        // ── 3. Validate + schema check ───────────────────────────────────
        let outcome = evaluate_response(&raw);
        let mut st = lock_state(&self.state);
        st.extraction = Some(outcome);
        st.pipeline = PipelineState::Done;
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn set_error(&self, message: String) {
        log::error!("orchestrator error: {message}");
        let mut st = lock_state(&self.state);
        st.pipeline = PipelineState::Error;
        st.error_message = Some(message);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::issue::{IssueError, IssueReceipt};
    use crate::llm::{ExtractionOutcome, LlmError, SCHEMA_TEMPLATE};
    use crate::pipeline::state::new_shared_state;
    use crate::stt::{MockSttEngine, SttError};

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Replies with a fixed string and records every call.
    struct ScriptedLlm {
        reply: Result<String, ()>,
        calls: Mutex<Vec<(Option<String>, String)>>,
    }

    impl ScriptedLlm {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(Option<String>, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String, LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push((system.map(str::to_string), prompt.to_string()));
            self.reply.clone().map_err(|_| LlmError::Timeout)
        }
    }

    /// Counts submissions; answers with a receipt or a rejection.
    struct CountingTracker {
        accept: bool,
        count: AtomicUsize,
    }

    impl CountingTracker {
        fn new(accept: bool) -> Arc<Self> {
            Arc::new(Self {
                accept,
                count: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl IssueTracker for CountingTracker {
        async fn create_issue(&self, _s: &IssueSubmission) -> Result<IssueReceipt, IssueError> {
            let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;
            if self.accept {
                Ok(IssueReceipt {
                    url: format!("https://x/{n}"),
                })
            } else {
                Err(IssueError::Rejected {
                    status: 422,
                    body: "bad request".into(),
                })
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn one_second_wav() -> Vec<u8> {
        crate::audio::decode::wav_bytes(&vec![0i16; 16_000], 16_000, 1)
    }

    fn orchestrator(
        stt: Arc<dyn SttEngine>,
        llm: Arc<dyn LlmClient>,
        tracker: Arc<dyn IssueTracker>,
    ) -> (AssistantOrchestrator, SharedState) {
        let state = new_shared_state();
        let orc = AssistantOrchestrator::new(Arc::clone(&state), stt, llm, tracker);
        (orc, state)
    }

    async fn run_commands(orc: AssistantOrchestrator, commands: Vec<AssistantCommand>) {
        let (tx, rx) = mpsc::channel(8);
        for c in commands {
            tx.send(c).await.unwrap();
        }
        drop(tx);
        orc.run(rx).await;
    }

    fn issue(title: &str) -> AssistantCommand {
        AssistantCommand::SubmitIssue(IssueSubmission::new(title, "details").unwrap())
    }

    // -----------------------------------------------------------------------
    // Issues
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn created_issue_publishes_url() {
        let tracker = CountingTracker::new(true);
        let (orc, state) = orchestrator(
            Arc::new(MockSttEngine::ok("unused")),
            ScriptedLlm::ok("unused"),
            tracker.clone(),
        );

        run_commands(orc, vec![issue("Login broken")]).await;

        let st = lock_state(&state);
        assert_eq!(st.pipeline, PipelineState::Done);
        assert_eq!(
            st.issue_outcome,
            Some(IssueOutcome::Created {
                url: "https://x/1".into()
            })
        );
    }

    #[tokio::test]
    async fn rejected_issue_publishes_diagnostic() {
        let (orc, state) = orchestrator(
            Arc::new(MockSttEngine::ok("unused")),
            ScriptedLlm::ok("unused"),
            CountingTracker::new(false),
        );

        run_commands(orc, vec![issue("Login broken")]).await;

        let st = lock_state(&state);
        assert_eq!(st.pipeline, PipelineState::Error);
        match st.issue_outcome.as_ref() {
            Some(IssueOutcome::Failed { message }) => {
                assert!(message.contains("422"));
                assert!(message.contains("bad request"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_submissions_are_each_filed_in_order() {
        let tracker = CountingTracker::new(true);
        let (orc, state) = orchestrator(
            Arc::new(MockSttEngine::ok("unused")),
            ScriptedLlm::ok("unused"),
            tracker.clone(),
        );

        run_commands(orc, vec![issue("Same"), issue("Same")]).await;

        assert_eq!(tracker.count.load(Ordering::SeqCst), 2);
        assert_eq!(
            lock_state(&state).issue_outcome,
            Some(IssueOutcome::Created {
                url: "https://x/2".into()
            })
        );
    }

    // -----------------------------------------------------------------------
    // Questions
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn question_is_sent_with_persona_and_answer_published() {
        let llm = ScriptedLlm::ok("Open Settings, then Upload.");
        let (orc, state) = orchestrator(
            Arc::new(MockSttEngine::ok("unused")),
            llm.clone(),
            CountingTracker::new(true),
        );

        run_commands(
            orc,
            vec![AssistantCommand::AskQuestion {
                question: "  How do I upload a PDF? ".into(),
            }],
        )
        .await;

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        let (system, user) = &calls[0];
        assert!(system.as_deref().unwrap_or_default().contains("help-desk"));
        assert_eq!(user, "How do I upload a PDF?");

        let st = lock_state(&state);
        assert_eq!(st.pipeline, PipelineState::Done);
        assert_eq!(st.answer.as_deref(), Some("Open Settings, then Upload."));
    }

    #[tokio::test]
    async fn answer_is_trimmed_and_blank_answer_is_an_error() {
        let (orc, state) = orchestrator(
            Arc::new(MockSttEngine::ok("unused")),
            ScriptedLlm::ok("\n  Restart the app.  \n"),
            CountingTracker::new(true),
        );
        run_commands(
            orc,
            vec![AssistantCommand::AskQuestion {
                question: "It froze".into(),
            }],
        )
        .await;
        assert_eq!(lock_state(&state).answer.as_deref(), Some("Restart the app."));

        let (orc, state) = orchestrator(
            Arc::new(MockSttEngine::ok("unused")),
            ScriptedLlm::ok(" \n"),
            CountingTracker::new(true),
        );
        run_commands(
            orc,
            vec![AssistantCommand::AskQuestion {
                question: "It froze".into(),
            }],
        )
        .await;
        let st = lock_state(&state);
        assert_eq!(st.pipeline, PipelineState::Error);
        assert!(st.answer.is_none());
        assert!(st.error_message.as_deref().unwrap().contains("empty answer"));
    }

    #[tokio::test]
    async fn blank_question_never_reaches_the_model() {
        let llm = ScriptedLlm::ok("unused");
        let (orc, state) = orchestrator(
            Arc::new(MockSttEngine::ok("unused")),
            llm.clone(),
            CountingTracker::new(true),
        );

        run_commands(
            orc,
            vec![AssistantCommand::AskQuestion {
                question: " \n ".into(),
            }],
        )
        .await;

        assert!(llm.calls().is_empty());
        assert_eq!(lock_state(&state).pipeline, PipelineState::Error);
    }

    #[tokio::test]
    async fn llm_failure_on_question_is_reported() {
        let (orc, state) = orchestrator(
            Arc::new(MockSttEngine::ok("unused")),
            ScriptedLlm::failing(),
            CountingTracker::new(true),
        );

        run_commands(
            orc,
            vec![AssistantCommand::AskQuestion {
                question: "hello?".into(),
            }],
        )
        .await;

        let st = lock_state(&state);
        assert_eq!(st.pipeline, PipelineState::Error);
        assert!(st.answer.is_none());
        assert!(st.error_message.as_deref().unwrap().contains("timed out"));
    }

    // -----------------------------------------------------------------------
    // Audio notes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn audio_note_yields_transcript_and_valid_extraction() {
        let llm = ScriptedLlm::ok(SCHEMA_TEMPLATE);
        let (orc, state) = orchestrator(
            Arc::new(MockSttEngine::ok("Invoice 7 from Acme")),
            llm.clone(),
            CountingTracker::new(true),
        );

        run_commands(
            orc,
            vec![AssistantCommand::ProcessAudioNote {
                file_name: "note.WAV".into(),
                bytes: one_second_wav(),
            }],
        )
        .await;

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.is_none());
        assert!(calls[0].1.contains("Invoice 7 from Acme"));

        let st = lock_state(&state);
        assert_eq!(st.pipeline, PipelineState::Done);
        assert_eq!(st.transcript.as_deref(), Some("Invoice 7 from Acme"));
        assert!(matches!(st.extraction, Some(ExtractionOutcome::Valid { .. })));
    }

    #[tokio::test]
    async fn unparsable_model_output_is_kept_raw() {
        let (orc, state) = orchestrator(
            Arc::new(MockSttEngine::ok("something")),
            ScriptedLlm::ok("Sorry, I cannot process this."),
            CountingTracker::new(true),
        );

        run_commands(
            orc,
            vec![AssistantCommand::ProcessAudioNote {
                file_name: "note.wav".into(),
                bytes: one_second_wav(),
            }],
        )
        .await;

        let st = lock_state(&state);
        match st.extraction.as_ref() {
            Some(ExtractionOutcome::Unparsed { raw, .. }) => {
                assert_eq!(raw, "Sorry, I cannot process this.");
            }
            other => panic!("expected Unparsed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn raw_model_output_reaches_the_validator_untouched() {
        for reply in ["  \n", "  Sorry, I cannot process this.\n\n"] {
            let (orc, state) = orchestrator(
                Arc::new(MockSttEngine::ok("something")),
                ScriptedLlm::ok(reply),
                CountingTracker::new(true),
            );

            run_commands(
                orc,
                vec![AssistantCommand::ProcessAudioNote {
                    file_name: "note.wav".into(),
                    bytes: one_second_wav(),
                }],
            )
            .await;

            let st = lock_state(&state);
            assert_eq!(st.pipeline, PipelineState::Done);
            assert!(st.error_message.is_none());
            match st.extraction.as_ref() {
                Some(ExtractionOutcome::Unparsed { raw, .. }) => assert_eq!(raw, reply),
                other => panic!("expected Unparsed for {reply:?}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn transcription_failure_skips_the_model() {
        let llm = ScriptedLlm::ok("unused");
        let (orc, state) = orchestrator(
            Arc::new(MockSttEngine::err(SttError::ModelNotFound("ggml-base.bin".into()))),
            llm.clone(),
            CountingTracker::new(true),
        );

        run_commands(
            orc,
            vec![AssistantCommand::ProcessAudioNote {
                file_name: "note.wav".into(),
                bytes: one_second_wav(),
            }],
        )
        .await;

        assert!(llm.calls().is_empty());
        let st = lock_state(&state);
        assert_eq!(st.pipeline, PipelineState::Error);
        assert!(st.transcript.is_none());
        assert!(st.error_message.as_deref().unwrap().contains("ggml-base.bin"));
    }

    #[tokio::test]
    async fn unsupported_upload_is_reported() {
        let (orc, state) = orchestrator(
            Arc::new(MockSttEngine::ok("unused")),
            ScriptedLlm::ok("unused"),
            CountingTracker::new(true),
        );

        run_commands(
            orc,
            vec![AssistantCommand::ProcessAudioNote {
                file_name: "notes.txt".into(),
                bytes: b"hello".to_vec(),
            }],
        )
        .await;

        let st = lock_state(&state);
        assert_eq!(st.pipeline, PipelineState::Error);
        assert!(st.error_message.as_deref().unwrap().contains("unsupported"));
    }

    #[tokio::test]
    async fn extraction_failure_keeps_transcript() {
        let (orc, state) = orchestrator(
            Arc::new(MockSttEngine::ok("Invoice 9")),
            ScriptedLlm::failing(),
            CountingTracker::new(true),
        );

        run_commands(
            orc,
            vec![AssistantCommand::ProcessAudioNote {
                file_name: "a.wav".into(),
                bytes: one_second_wav(),
            }],
        )
        .await;

        let st = lock_state(&state);
        assert_eq!(st.pipeline, PipelineState::Error);
        assert_eq!(st.transcript.as_deref(), Some("Invoice 9"));
        assert!(st.extraction.is_none());
    }

    #[tokio::test]
    async fn closed_channel_leaves_state_idle() {
        let (orc, state) = orchestrator(
            Arc::new(MockSttEngine::ok("unused")),
            ScriptedLlm::ok("unused"),
            CountingTracker::new(true),
        );

        run_commands(orc, Vec::new()).await;
        assert_eq!(lock_state(&state).pipeline, PipelineState::Idle);
    }
}
