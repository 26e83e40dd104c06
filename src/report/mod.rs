//! Error reporting side channel.
//!
//! The dispatcher hands every handler failure to a [`Reporter`]. Reporting
//! must never delay or alter the response, so [`Reporter::report`] is a plain
//! synchronous call: implementations that talk to the network spawn their
//! own work and swallow (log) their own failures.
//!
//! The shipped implementation, [`IssueReporter`], deduplicates failures by
//! [`fingerprint`] and files them as GitHub issues when running in
//! production with credentials configured.

mod github;

pub use github::{GithubClient, Issue, IssueReporter, IssueTracker, NewIssue, Submitted, TrackerError};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::handler::HandlerError;
use crate::request::Request;

/// How many leading trace lines feed the fingerprint.
pub const TRACE_PREFIX: usize = 3;

/// Receives handler failures. Must not block and must not panic.
pub trait Reporter: Send + Sync + 'static {
    fn report(&self, error: &HandlerError, ctx: Option<RequestContext>);
}

/// The request a failure happened on, captured before the handler ran.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestContext {
    pub method: String,
    pub url: String,
}

impl RequestContext {
    pub fn from_request(req: &Request) -> Self {
        Self { method: req.method().to_string(), url: req.target() }
    }
}

/// Everything a tracker record is rendered from.
#[derive(Clone, Debug)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
    pub trace: Vec<String>,
    pub fingerprint: String,
    pub timestamp: DateTime<Utc>,
    pub request: Option<RequestContext>,
}

impl ErrorReport {
    pub fn new(error: &HandlerError, request: Option<RequestContext>) -> Self {
        Self {
            kind: error.kind().to_owned(),
            message: error.message().to_owned(),
            trace: error.trace().to_vec(),
            fingerprint: fingerprint(error.kind(), error.message(), error.trace()),
            timestamp: Utc::now(),
            request,
        }
    }

    /// ISO 8601 with millisecond precision, UTC.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Stable deduplication key for a failure: `error-<hex>` of a 32-bit
/// rolling hash over kind, message and the first [`TRACE_PREFIX`] trace lines.
pub fn fingerprint(kind: &str, message: &str, trace: &[String]) -> String {
    let head = trace.iter()
        .take(TRACE_PREFIX)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");
    let input = format!("{kind}:{message}:{head}");

    let hash = input.encode_utf16().fold(0_i32, |h, unit| {
        h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(unit))
    });
    format!("error-{:x}", hash.unsigned_abs())
}

/// Deployment signal and credentials for [`IssueReporter`].
#[derive(Clone, Debug, Default)]
pub struct ReporterConfig {
    /// Present only in production deployments.
    pub deployment_id: Option<String>,
    pub token: Option<String>,
    /// `owner/repo`.
    pub repository: Option<String>,
    pub api_base: String,
}

impl ReporterConfig {
    /// `(owner, repo)` when the repository is well formed.
    pub fn owner_repo(&self) -> Option<(&str, &str)> {
        let (owner, repo) = self.repository.as_deref()?.split_once('/')?;
        (!owner.is_empty() && !repo.is_empty() && !repo.contains('/')).then_some((owner, repo))
    }

    /// Reporting happens only in production with a token and a repository.
    pub fn is_enabled(&self) -> bool {
        self.deployment_id.is_some()
            && self.token.as_deref().is_some_and(|t| !t.is_empty())
            && self.owner_repo().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn fingerprint_is_stable_and_prefixed() {
        let a = fingerprint("Error", "boom", &lines(&["at a.rs:1:1"]));
        let b = fingerprint("Error", "boom", &lines(&["at a.rs:1:1"]));
        assert_eq!(a, b);
        assert!(a.starts_with("error-"));
        assert!(a["error-".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_depends_on_kind_message_and_origin() {
        let base = fingerprint("Error", "boom", &lines(&["at a.rs:1:1"]));
        assert_ne!(base, fingerprint("TypeError", "boom", &lines(&["at a.rs:1:1"])));
        assert_ne!(base, fingerprint("Error", "bang", &lines(&["at a.rs:1:1"])));
        assert_ne!(base, fingerprint("Error", "boom", &lines(&["at b.rs:9:9"])));
    }

    #[test]
    fn fingerprint_ignores_trace_beyond_prefix() {
        let short = lines(&["1", "2", "3"]);
        let long = lines(&["1", "2", "3", "4", "5"]);
        assert_eq!(fingerprint("E", "m", &short), fingerprint("E", "m", &long));
    }

    #[test]
    fn fingerprint_matches_js_string_hash() {
        // "a::" → ((97 * 31) + 58) * 31 + 58 = 95073 = 0x17361
        assert_eq!(fingerprint("a", "", &[]), "error-17361");
    }

    #[test]
    fn config_requires_signal_token_and_repo() {
        let full = ReporterConfig {
            deployment_id: Some("dep".into()),
            token: Some("tok".into()),
            repository: Some("owner/repo".into()),
            api_base: "https://api.github.com".into(),
        };
        assert!(full.is_enabled());
        assert_eq!(full.owner_repo(), Some(("owner", "repo")));

        assert!(!ReporterConfig { deployment_id: None, ..full.clone() }.is_enabled());
        assert!(!ReporterConfig { token: Some(String::new()), ..full.clone() }.is_enabled());
        assert!(!ReporterConfig { repository: Some("no-slash".into()), ..full.clone() }.is_enabled());
        assert!(!ReporterConfig { repository: Some("a/b/c".into()), ..full }.is_enabled());
    }

    #[test]
    fn context_captures_method_and_target() {
        let ctx = RequestContext::from_request(&Request::get("/error?x=1"));
        assert_eq!(ctx, RequestContext { method: "GET".into(), url: "/error?x=1".into() });
    }
}
