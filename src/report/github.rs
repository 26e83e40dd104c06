//! GitHub Issues as the error tracker.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::{ErrorReport, Reporter, ReporterConfig, RequestContext};
use crate::handler::HandlerError;

/// Label every automatically filed issue carries; also the lookup filter.
pub const ISSUE_LABEL: &str = "uncaught-error";
const LABELS: [&str; 3] = [ISSUE_LABEL, "automated", "bug"];
const AGENT: &str = "apis.is-error-monitor";
const TITLE_CHARS: usize = 80;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("tracker answered with status {0}")]
    Status(u16),
}

/// An open issue as returned by the tracker.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub body: Option<String>,
}

/// Payload for a new issue.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// The remote side of error reporting.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn open_issues(&self, label: &str) -> Result<Vec<Issue>, TrackerError>;
    async fn create_issue(&self, issue: NewIssue) -> Result<(), TrackerError>;
    async fn comment(&self, number: u64, body: String) -> Result<(), TrackerError>;
}

// ── GithubClient ──────────────────────────────────────────────────────────────

/// GitHub REST v3 client scoped to one repository.
pub struct GithubClient {
    http: reqwest::Client,
    repo_url: String,
    token: String,
}

impl GithubClient {
    pub fn new(api_base: &str, owner: &str, repo: &str, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            repo_url: format!("{}/repos/{owner}/{repo}", api_base.trim_end_matches('/')),
            token: token.into(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.repo_url))
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github.v3+json")
            .header(USER_AGENT, AGENT)
    }
}

#[async_trait]
impl IssueTracker for GithubClient {
    async fn open_issues(&self, label: &str) -> Result<Vec<Issue>, TrackerError> {
        let res = self.request(reqwest::Method::GET, "/issues")
            .query(&[("state", "open"), ("labels", label), ("per_page", "100")])
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(TrackerError::Status(res.status().as_u16()));
        }
        Ok(res.json().await?)
    }

    async fn create_issue(&self, issue: NewIssue) -> Result<(), TrackerError> {
        self.request(reqwest::Method::POST, "/issues")
            .json(&issue)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn comment(&self, number: u64, body: String) -> Result<(), TrackerError> {
        #[derive(Serialize)]
        struct Comment {
            body: String,
        }

        self.request(reqwest::Method::POST, &format!("/issues/{number}/comments"))
            .json(&Comment { body })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

// ── IssueReporter ─────────────────────────────────────────────────────────────

/// What [`IssueReporter::submit`] did with a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submitted {
    Created,
    Commented(u64),
}

/// A [`Reporter`] that always logs the failure locally and, when enabled,
/// files it with an [`IssueTracker`] on a background task.
pub struct IssueReporter {
    tracker: Option<Arc<dyn IssueTracker>>,
}

impl IssueReporter {
    /// Builds a GitHub-backed reporter, or a log-only one when `config` lacks
    /// the production signal or credentials.
    pub fn new(config: &ReporterConfig) -> Self {
        let tracker = match (config.is_enabled(), config.owner_repo(), config.token.as_deref()) {
            (true, Some((owner, repo)), Some(token)) => {
                info!(%owner, %repo, "error reporting to GitHub issues enabled");
                Some(Arc::new(GithubClient::new(&config.api_base, owner, repo, token)) as Arc<dyn IssueTracker>)
            }
            _ => {
                info!(
                    has_deployment_id = config.deployment_id.is_some(),
                    has_token = config.token.is_some(),
                    has_repository = config.owner_repo().is_some(),
                    "error reporting disabled: not in production or missing configuration"
                );
                None
            }
        };
        Self { tracker }
    }

    /// A reporter that only logs.
    pub fn disabled() -> Self {
        Self { tracker: None }
    }

    /// A reporter backed by an arbitrary tracker.
    pub fn with_tracker(tracker: Arc<dyn IssueTracker>) -> Self {
        Self { tracker: Some(tracker) }
    }

    pub fn is_enabled(&self) -> bool {
        self.tracker.is_some()
    }

    /// Files `report`: comments on the open issue carrying its fingerprint,
    /// or opens a new one.
    ///
    /// A listing refused with an error status (rate limit, outage) skips the
    /// duplicate check and opens a new issue. Only transport failures abort.
    pub async fn submit(tracker: &dyn IssueTracker, report: &ErrorReport) -> Result<Submitted, TrackerError> {
        let issues = match tracker.open_issues(ISSUE_LABEL).await {
            Ok(issues) => issues,
            Err(TrackerError::Status(status)) => {
                warn!(status, "open issue lookup unavailable, filing a new issue");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        let marker = fingerprint_marker(&report.fingerprint);
        let existing = issues
            .into_iter()
            .find(|issue| issue.body.as_deref().is_some_and(|b| b.contains(&marker)));

        match existing {
            Some(issue) => {
                tracker.comment(issue.number, comment_body(report)).await?;
                Ok(Submitted::Commented(issue.number))
            }
            None => {
                tracker.create_issue(new_issue(report)).await?;
                Ok(Submitted::Created)
            }
        }
    }
}

impl Reporter for IssueReporter {
    fn report(&self, err: &HandlerError, ctx: Option<RequestContext>) {
        let report = ErrorReport::new(err, ctx);
        error!(
            kind = %report.kind,
            message = %report.message,
            fingerprint = %report.fingerprint,
            method = report.request.as_ref().map(|r| r.method.as_str()),
            url = report.request.as_ref().map(|r| r.url.as_str()),
            "uncaught handler error"
        );

        let Some(tracker) = self.tracker.clone() else {
            debug!("error reporting disabled, not filing an issue");
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            error!("no async runtime available, not filing an issue");
            return;
        };
        runtime.spawn(async move {
            match IssueReporter::submit(tracker.as_ref(), &report).await {
                Ok(outcome) => debug!(?outcome, fingerprint = %report.fingerprint, "error reported"),
                Err(e) => error!(error = %e, fingerprint = %report.fingerprint, "failed to report error"),
            }
        });
    }
}

fn fingerprint_marker(fingerprint: &str) -> String {
    format!("**Fingerprint:** `{fingerprint}`")
}

fn request_fields(report: &ErrorReport) -> (&str, &str) {
    match &report.request {
        Some(r) => (r.method.as_str(), r.url.as_str()),
        None => ("N/A", "N/A"),
    }
}

fn new_issue(report: &ErrorReport) -> NewIssue {
    let summary: String = report.message.chars().take(TITLE_CHARS).collect();
    let trace = if report.trace.is_empty() {
        "No stack trace available".to_owned()
    } else {
        report.trace.join("\n")
    };
    let (method, url) = request_fields(report);

    let body = format!(
        "An uncaught error occurred in production.

**Error Kind:** `{kind}`

**Error Message:**
```
{message}
```

**Stack Trace:**
```
{trace}
```

**Request Details:**
- Method: {method}
- URL: {url}
- Timestamp: {timestamp}

{marker}

This issue was automatically created by the error monitoring system.",
        kind = report.kind,
        message = report.message,
        timestamp = report.timestamp_iso(),
        marker = fingerprint_marker(&report.fingerprint),
    );

    NewIssue {
        title: format!("🚨 Uncaught Error: {summary}"),
        body,
        labels: LABELS.iter().map(|l| (*l).to_owned()).collect(),
    }
}

fn comment_body(report: &ErrorReport) -> String {
    let (method, url) = request_fields(report);
    format!(
        "Error occurred again at {}\n\n**Request:** {method} {url}\n\nSee deployment logs for more details.",
        report.timestamp_iso(),
    )
}
