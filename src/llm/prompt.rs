//! Help-desk prompt for free-text questions.
//!
//! [`PromptBuilder::build_chat`] returns a `(system_msg, user_msg)` pair; the
//! system message sets the assistant persona and the user message is the
//! question itself.

// ---------------------------------------------------------------------------
// System instruction
// ---------------------------------------------------------------------------

/// Persona for document parsing, troubleshooting and help-desk questions.
pub const HELP_DESK_INSTRUCTION: &str = "\
You are a knowledgeable and helpful virtual assistant specialised in document \
parsing, troubleshooting and help-desk support.

Your roles:
1. Document parsing guidance: explain how to upload, highlight and parse \
documents (invoices, receipts, PDFs, Word or Excel files) to extract \
structured data.
2. Troubleshooting: help resolve common errors, OCR problems, parsing \
inaccuracies and other software issues.
3. Help desk: explain software features and workflows, and give tips for \
efficient document management.

Guidelines:
- Answer clearly and concisely, step by step.
- Be friendly and professional; avoid unnecessary jargon.
- Ask a clarifying question when the problem is unclear.
- Use bullet points or numbered steps for instructions.
- Give code blocks or JSON examples only when they help with a parsing task.
- Suggest workarounds when a direct solution is not possible.
- Use the headings Document Parsing, Troubleshooting or Help Desk when relevant.
- Keep instructions general enough to apply in different software environments.";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds help-desk prompts.
///
/// # Example
/// ```rust
/// use helpdesk_assistant::llm::PromptBuilder;
///
/// let (system, user) = PromptBuilder::help_desk().build_chat("How do I parse a scanned receipt?");
/// assert!(system.contains("help-desk"));
/// assert_eq!(user, "How do I parse a scanned receipt?");
/// ```
pub struct PromptBuilder {
    instruction: &'static str,
}

impl PromptBuilder {
    /// Builder with the help-desk persona.
    pub fn help_desk() -> Self {
        Self {
            instruction: HELP_DESK_INSTRUCTION,
        }
    }

    /// Build a **(system_msg, user_msg)** pair.  The question is trimmed and
    /// otherwise passed through untouched.
    pub fn build_chat(&self, question: &str) -> (String, String) {
        (self.instruction.to_string(), question.trim().to_string())
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::help_desk()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
