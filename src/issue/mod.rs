//! Issue filing: validated submissions and the GitHub tracker adapter.

pub mod github;
pub mod submission;

pub use github::{GithubIssueClient, IssueTracker};
pub use submission::{IssueError, IssueReceipt, IssueSubmission};
