//! Issue submission value type and the errors raised while filing one.

use thiserror::Error;

/// Errors from validating or filing an issue.
#[derive(Debug, Error, PartialEq)]
pub enum IssueError {
    #[error("issue title must not be empty")]
    EmptyTitle,

    #[error("issue description must not be empty")]
    EmptyBody,

    /// Transport failure before any status was received.
    #[error("issue request failed: {0}")]
    Request(String),

    /// The tracker answered with anything other than `201 Created`.
    #[error("failed to create issue: {status} - {body}")]
    Rejected { status: u16, body: String },

    /// `201 Created`, but the response carried no usable issue URL.
    #[error("issue was created but the response had no html_url: {0}")]
    MalformedReceipt(String),
}

impl From<reqwest::Error> for IssueError {
    fn from(e: reqwest::Error) -> Self {
        IssueError::Request(e.to_string())
    }
}

/// A validated issue: title and body are trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSubmission {
    title: String,
    body: String,
}

impl IssueSubmission {
    /// Validate user input.  The title is checked first.
    ///
    /// ```rust
    /// use helpdesk_assistant::issue::{IssueError, IssueSubmission};
    ///
    /// assert!(IssueSubmission::new("Login fails", "Steps: ...").is_ok());
    /// assert_eq!(IssueSubmission::new("  ", "x"), Err(IssueError::EmptyTitle));
    /// ```
    pub fn new(title: &str, body: &str) -> Result<Self, IssueError> {
        let title = title.trim();
        let body = body.trim();

        if title.is_empty() {
            return Err(IssueError::EmptyTitle);
        }
        if body.is_empty() {
            return Err(IssueError::EmptyBody);
        }

        Ok(Self {
            title: title.to_string(),
            body: body.to_string(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Proof that the tracker accepted an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueReceipt {
    /// Browser URL of the created issue.
    pub url: String,
}
