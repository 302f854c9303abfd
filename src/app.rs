//! Help-desk assistant window: egui/eframe application.
//!
//! # Architecture
//!
//! [`AssistantApp`] is the top-level [`eframe::App`].  It owns the form
//! inputs and one channel endpoint:
//!
//! * `command_tx` sends [`AssistantCommand`]s to the orchestrator.
//!
//! Everything the orchestrator produces is read back from [`SharedState`]
//! every frame.  Input is validated here, so blank forms never produce a
//! command.
//!
//! # Categories
//!
//! | Category | Content |
//! |----------|---------|
//! | `Issue`  | Title + description form, link to the created issue |
//! | `Help`   | Link to the configured help center |
//! | `Doubts` | Question box, audio-note loader, extraction result |

use std::path::Path;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::audio::is_supported_audio;
use crate::config::AppConfig;
use crate::issue::{IssueError, IssueSubmission};
use crate::llm::{ExtractionOutcome, InvoiceRecord, EXTRACTION_FAILED_MESSAGE};
use crate::pipeline::{lock_state, AssistantCommand, IssueOutcome, PipelineState, SharedState};

const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(230, 110, 60);
const OK_COLOR: egui::Color32 = egui::Color32::from_rgb(80, 180, 110);
const MUTED_COLOR: egui::Color32 = egui::Color32::from_rgb(140, 140, 140);

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Top-level section selected in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    Issue,
    Help,
    Doubts,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Issue, Category::Help, Category::Doubts];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Issue => "Issue",
            Category::Help => "Help",
            Category::Doubts => "Doubts",
        }
    }
}

// ---------------------------------------------------------------------------
// AssistantApp
// ---------------------------------------------------------------------------

/// eframe application: the help-desk assistant window.
pub struct AssistantApp {
    state: SharedState,
    command_tx: mpsc::Sender<AssistantCommand>,
    config: AppConfig,

    category: Category,

    // ── Issue form ───────────────────────────────────────────────────────
    issue_title: String,
    issue_body: String,
    issue_form_error: Option<String>,
    /// A submission is in flight; the form is kept until it is created.
    issue_pending: bool,

    // ── Doubts ───────────────────────────────────────────────────────────
    question: String,
    question_error: Option<String>,
    audio_path: String,
    audio_error: Option<String>,
}

impl AssistantApp {
    pub fn new(
        state: SharedState,
        command_tx: mpsc::Sender<AssistantCommand>,
        config: AppConfig,
    ) -> Self {
        Self {
            state,
            command_tx,
            config,
            category: Category::default(),
            issue_title: String::new(),
            issue_body: String::new(),
            issue_form_error: None,
            issue_pending: false,
            question: String::new(),
            question_error: None,
            audio_path: String::new(),
            audio_error: None,
        }
    }

    fn is_busy(&self) -> bool {
        lock_state(&self.state).pipeline.is_busy()
    }

    /// Queue a command.  Returns the reason when it could not be queued.
    fn send(&self, command: AssistantCommand) -> Result<(), String> {
        if self.is_busy() {
            return Err("Please wait for the current request to finish.".into());
        }
        self.command_tx.try_send(command).map_err(|e| {
            log::warn!("ui: could not queue command: {e}");
            "The assistant is not accepting requests right now.".to_string()
        })
    }

    // ── Actions ──────────────────────────────────────────────────────────

    /// Validate the issue form and queue it.  The inputs stay in place until
    /// the tracker confirms the issue, so a rejected one can be resubmitted.
    fn submit_issue(&mut self) {
        let submission = match IssueSubmission::new(&self.issue_title, &self.issue_body) {
            Ok(s) => s,
            Err(IssueError::EmptyTitle) => {
                self.issue_form_error = Some("Please enter a title.".into());
                return;
            }
            Err(IssueError::EmptyBody) => {
                self.issue_form_error = Some("Please describe the issue.".into());
                return;
            }
            Err(e) => {
                self.issue_form_error = Some(e.to_string());
                return;
            }
        };

        match self.send(AssistantCommand::SubmitIssue(submission)) {
            Ok(()) => {
                self.issue_form_error = None;
                self.issue_pending = true;
                lock_state(&self.state).issue_outcome = None;
            }
            Err(message) => self.issue_form_error = Some(message),
        }
    }

    /// Clear the issue form once the pending submission has been created.
    fn reconcile_issue_form(&mut self) {
        if !self.issue_pending {
            return;
        }
        let created = match lock_state(&self.state).issue_outcome {
            Some(IssueOutcome::Created { .. }) => true,
            Some(IssueOutcome::Failed { .. }) => false,
            None => return,
        };
        self.issue_pending = false;
        if created {
            self.issue_title.clear();
            self.issue_body.clear();
        }
    }

    fn ask_question(&mut self) {
        let question = self.question.trim();
        if question.is_empty() {
            self.question_error = Some("Please type a question.".into());
            return;
        }

        let command = AssistantCommand::AskQuestion {
            question: question.to_string(),
        };
        self.question_error = self.send(command).err();
    }

    /// Read the file named in the path box and queue it as an audio note.
    fn load_audio_path(&mut self) {
        let path = self.audio_path.trim().to_string();
        if path.is_empty() {
            self.audio_error = Some("Please enter the path of an audio file.".into());
            return;
        }

        let path = Path::new(&path);
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        if !has_supported_extension(&file_name) {
            self.audio_error = Some(unsupported_message(&file_name));
            return;
        }

        match std::fs::read(path) {
            Ok(bytes) => self.queue_audio(file_name, bytes),
            Err(e) => {
                log::warn!("ui: cannot read {}: {e}", path.display());
                self.audio_error = Some(format!("Could not read {}: {e}", path.display()));
            }
        }
    }

    /// Queue a file dropped onto the window.
    fn load_dropped_file(&mut self, file: &egui::DroppedFile) {
        let file_name = file
            .path
            .as_ref()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| file.name.clone());

        if !has_supported_extension(&file_name) {
            self.audio_error = Some(unsupported_message(&file_name));
            return;
        }

        let bytes = match (&file.bytes, &file.path) {
            (Some(bytes), _) => Ok(bytes.to_vec()),
            (None, Some(path)) => std::fs::read(path).map_err(|e| e.to_string()),
            (None, None) => Err("the dropped file has no content".to_string()),
        };

        match bytes {
            Ok(bytes) => {
                if let Some(path) = &file.path {
                    self.audio_path = path.display().to_string();
                }
                self.queue_audio(file_name, bytes);
            }
            Err(e) => self.audio_error = Some(format!("Could not read {file_name}: {e}")),
        }
    }

    fn queue_audio(&mut self, file_name: String, bytes: Vec<u8>) {
        log::info!("ui: queueing audio note {file_name} ({} bytes)", bytes.len());
        self.audio_error = self
            .send(AssistantCommand::ProcessAudioNote { file_name, bytes })
            .err();
    }

    // ── Panels ───────────────────────────────────────────────────────────

    fn draw_status_bar(&self, ui: &mut egui::Ui) {
        let pipeline = lock_state(&self.state).pipeline;
        ui.horizontal(|ui| {
            if pipeline.is_busy() {
                ui.spinner();
            }
            let color = match pipeline {
                PipelineState::Error => ERROR_COLOR,
                PipelineState::Done => OK_COLOR,
                _ => MUTED_COLOR,
            };
            ui.label(egui::RichText::new(pipeline.label()).color(color));
        });
    }

    fn draw_issue(&mut self, ui: &mut egui::Ui, busy: bool) {
        ui.heading("Report an issue");
        ui.add_space(4.0);

        ui.label("Title");
        ui.add_enabled(
            !busy,
            egui::TextEdit::singleline(&mut self.issue_title).desired_width(f32::INFINITY),
        );
        ui.label("Description");
        ui.add_enabled(
            !busy,
            egui::TextEdit::multiline(&mut self.issue_body)
                .desired_rows(8)
                .desired_width(f32::INFINITY),
        );

        ui.add_space(4.0);
        if ui.add_enabled(!busy, egui::Button::new("Submit")).clicked() {
            self.submit_issue();
        }

        if let Some(err) = &self.issue_form_error {
            ui.colored_label(ERROR_COLOR, err);
        }

        let outcome = lock_state(&self.state).issue_outcome.clone();
        match outcome {
            Some(IssueOutcome::Created { url }) => {
                ui.horizontal(|ui| {
                    ui.colored_label(OK_COLOR, "Issue created:");
                    ui.hyperlink(url);
                });
            }
            Some(IssueOutcome::Failed { message }) => {
                ui.colored_label(ERROR_COLOR, message);
            }
            None => {}
        }
    }

    fn draw_help(&self, ui: &mut egui::Ui) {
        ui.heading("Help");
        ui.add_space(4.0);
        match &self.config.ui.help_center_url {
            Some(url) => {
                ui.hyperlink_to("Open the help center", url);
            }
            None => {
                ui.colored_label(MUTED_COLOR, "No help center link is configured.");
            }
        }
    }

    fn draw_doubts(&mut self, ui: &mut egui::Ui, busy: bool) {
        ui.heading("Ask a question");
        ui.add_enabled(
            !busy,
            egui::TextEdit::multiline(&mut self.question)
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );
        if ui.add_enabled(!busy, egui::Button::new("Ask")).clicked() {
            self.ask_question();
        }
        if let Some(err) = &self.question_error {
            ui.colored_label(ERROR_COLOR, err);
        }

        let (answer, transcript, extraction, error) = {
            let st = lock_state(&self.state);
            (
                st.answer.clone(),
                st.transcript.clone(),
                st.extraction.clone(),
                st.error_message.clone(),
            )
        };

        if let Some(answer) = answer {
            ui.add_space(4.0);
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.label(answer);
            });
        }

        ui.separator();
        ui.heading("Audio note");
        ui.label(
            egui::RichText::new("Enter a .wav, .mp3 or .m4a path, or drop the file on the window.")
                .color(MUTED_COLOR),
        );
        ui.horizontal(|ui| {
            ui.add_enabled(
                !busy,
                egui::TextEdit::singleline(&mut self.audio_path).hint_text("/path/to/note.m4a"),
            );
            if ui.add_enabled(!busy, egui::Button::new("Process")).clicked() {
                self.load_audio_path();
            }
        });
        if let Some(err) = &self.audio_error {
            ui.colored_label(ERROR_COLOR, err);
        }

        if let Some(transcript) = transcript {
            ui.add_space(4.0);
            ui.strong("Transcript");
            ui.label(transcript);
        }

        if let Some(outcome) = extraction {
            ui.add_space(4.0);
            draw_extraction(ui, &outcome);
        }

        if let Some(error) = error {
            ui.colored_label(ERROR_COLOR, error);
        }
    }
}

fn draw_extraction(ui: &mut egui::Ui, outcome: &ExtractionOutcome) {
    match outcome {
        ExtractionOutcome::Valid { record, .. } => {
            ui.colored_label(OK_COLOR, "Extracted invoice data");
            draw_record(ui, record);
            ui.collapsing("JSON", |ui| {
                show_code(ui, &outcome.pretty_json().unwrap_or_default());
            });
        }
        ExtractionOutcome::SchemaMismatch { violations, .. } => {
            ui.colored_label(
                ERROR_COLOR,
                format!(
                    "The JSON does not match the invoice schema ({} problem(s)):",
                    violations.len()
                ),
            );
            for v in violations {
                ui.label(format!("• {v}"));
            }
            show_code(ui, &outcome.pretty_json().unwrap_or_default());
        }
        ExtractionOutcome::Unparsed { raw, .. } => {
            ui.colored_label(ERROR_COLOR, EXTRACTION_FAILED_MESSAGE);
            show_code(ui, raw);
        }
    }
}

fn draw_record(ui: &mut egui::Ui, record: &InvoiceRecord) {
    if record.is_empty() {
        ui.colored_label(MUTED_COLOR, "No invoice details were found in the note.");
        return;
    }

    egui::Grid::new("invoice_fields")
        .num_columns(2)
        .striped(true)
        .show(ui, |ui| {
            for (label, value) in record_rows(record) {
                ui.strong(label);
                ui.label(value);
                ui.end_row();
            }
        });

    if record.items.is_empty() {
        return;
    }
    ui.add_space(4.0);
    egui::Grid::new("invoice_items")
        .num_columns(4)
        .striped(true)
        .show(ui, |ui| {
            for header in ["Description", "Qty", "Unit price", "Total"] {
                ui.strong(header);
            }
            ui.end_row();
            for item in &record.items {
                ui.label(item.description.as_deref().unwrap_or("-"));
                ui.label(format_number(item.quantity));
                ui.label(format_number(item.unit_price));
                ui.label(format_number(item.total_price));
                ui.end_row();
            }
        });
}

/// Label/value pairs for the header fields the model filled in.
fn record_rows(record: &InvoiceRecord) -> Vec<(&'static str, String)> {
    let total = record.total_amount.map(|amount| match &record.currency {
        Some(currency) => format!("{amount:.2} {currency}"),
        None => format!("{amount:.2}"),
    });
    [
        ("Invoice number", record.invoice_number.clone()),
        ("Company", record.company_name.clone()),
        ("Invoice date", record.invoice_date.clone()),
        ("Due date", record.due_date.clone()),
        ("Total", total),
        ("Notes", record.notes.clone()),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|v| (label, v)))
    .collect()
}

fn format_number(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn show_code(ui: &mut egui::Ui, text: &str) {
    egui::ScrollArea::vertical()
        .max_height(260.0)
        .id_salt("extraction_output")
        .show(ui, |ui| {
            ui.add(
                egui::TextEdit::multiline(&mut &*text)
                    .code_editor()
                    .desired_width(f32::INFINITY),
            );
        });
}

fn has_supported_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(is_supported_audio)
}

fn unsupported_message(file_name: &str) -> String {
    format!("{file_name:?} is not a supported audio file (use .wav, .mp3 or .m4a).")
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for AssistantApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let busy = self.is_busy();
        self.reconcile_issue_form();

        // Keep polling the shared state while the orchestrator works.
        if busy {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        let dropped: Vec<egui::DroppedFile> = ctx.input(|i| i.raw.dropped_files.clone());
        if let Some(file) = dropped.first() {
            self.category = Category::Doubts;
            self.load_dropped_file(file);
        }

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            self.draw_status_bar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                for category in Category::ALL {
                    ui.selectable_value(&mut self.category, category, category.label());
                }
            });
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| match self.category {
                Category::Issue => self.draw_issue(ui, busy),
                Category::Help => self.draw_help(ui),
                Category::Doubts => self.draw_doubts(ui, busy),
            });
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
