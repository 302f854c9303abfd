//! GitHub REST adapter: `POST /repos/{owner}/{repo}/issues`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{TrackerConfig, TrackerCredentials};
use crate::issue::submission::{IssueError, IssueReceipt, IssueSubmission};

// ---------------------------------------------------------------------------
// IssueTracker trait
// ---------------------------------------------------------------------------

/// Something that can file an issue and return where it lives.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn create_issue(&self, submission: &IssueSubmission) -> Result<IssueReceipt, IssueError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct CreateIssueRequest<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct CreateIssueResponse {
    html_url: Option<String>,
}

// ---------------------------------------------------------------------------
// GithubIssueClient
// ---------------------------------------------------------------------------

pub struct GithubIssueClient {
    client: reqwest::Client,
    api_base: String,
    user_agent: String,
    credentials: TrackerCredentials,
}

impl GithubIssueClient {
    pub fn new(config: &TrackerConfig, credentials: TrackerCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
            credentials,
        }
    }

    /// Point the client at another API root (GitHub Enterprise, test server).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn issues_url(&self) -> String {
        let repo = &self.credentials.repo;
        format!("{}/repos/{}/{}/issues", self.api_base, repo.owner, repo.name)
    }
}

#[async_trait]
impl IssueTracker for GithubIssueClient {
    async fn create_issue(&self, submission: &IssueSubmission) -> Result<IssueReceipt, IssueError> {
        let url = self.issues_url();
        log::info!("filing issue in {}", self.credentials.repo);

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, format!("token {}", self.credentials.token))
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .json(&CreateIssueRequest {
                title: submission.title(),
                body: submission.body(),
            })
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        // Only 201 Created means the issue exists.
        if status != reqwest::StatusCode::CREATED {
            log::warn!("issue tracker rejected the issue with HTTP {}", status.as_u16());
            return Err(IssueError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: CreateIssueResponse =
            serde_json::from_str(&text).map_err(|e| IssueError::MalformedReceipt(e.to_string()))?;
        match parsed.html_url {
            Some(url) if !url.is_empty() => {
                log::info!("issue created: {url}");
                Ok(IssueReceipt { url })
            }
            _ => Err(IssueError::MalformedReceipt(text)),
        }
    }
}
