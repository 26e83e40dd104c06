//! Meetup listings and their ingestion from issue forms.
//!
//! The listing is a JSON array kept in `data/meetups.json` and compiled into
//! the server. New entries arrive as GitHub issue-form bodies, which the
//! `add-meetup` binary parses, validates, and prepends to the file.

use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker GitHub issue forms use for an empty optional field.
const NO_RESPONSE: &str = "_No response_";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meetup {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub data: Schedule,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub start: String,
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title is required")]
    MissingTitle,
    #[error("URL is required")]
    MissingUrl,
    #[error("URL must be a valid HTTP(S) URL")]
    BadUrl,
    #[error("Start date is required")]
    MissingStart,
    #[error("Start date must be in ISO 8601 format")]
    BadStart,
    #[error("End date must be in ISO 8601 format")]
    BadEnd,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a meetup list: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Copy)]
enum Field {
    Title,
    Description,
    Url,
    Start,
    End,
}

impl Field {
    fn from_header(line: &str) -> Option<Self> {
        match line {
            "### Meetup Title" => Some(Self::Title),
            "### Description" => Some(Self::Description),
            "### Event URL" => Some(Self::Url),
            "### Start Date and Time" => Some(Self::Start),
            "### End Date and Time" => Some(Self::End),
            _ => None,
        }
    }
}

fn answered(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty() && value != NO_RESPONSE).then(|| value.to_owned())
}

impl Meetup {
    /// Reads the answers out of an issue-form body.
    ///
    /// Single-line fields take the first non-blank line under their header.
    /// The description keeps every non-blank line up to the next header.
    /// Unknown headers and stray text are ignored.
    pub fn from_issue_form(body: &str) -> Self {
        let mut meetup = Self::default();
        let mut field = None;
        let mut description: Vec<&str> = Vec::new();

        for raw in body.lines() {
            let line = raw.trim();
            if let Some(next) = Field::from_header(line) {
                if matches!(next, Field::Description) {
                    description.clear();
                }
                field = Some(next);
                continue;
            }
            if line.is_empty() || line.starts_with("###") {
                continue;
            }

            match field {
                Some(Field::Description) => description.push(raw),
                Some(single) => {
                    let value = answered(line);
                    match single {
                        Field::Title => meetup.title = value.unwrap_or_default(),
                        Field::Url => meetup.url = value.unwrap_or_default(),
                        Field::Start => meetup.data.start = value.unwrap_or_default(),
                        Field::End => meetup.data.end = value,
                        Field::Description => {}
                    }
                    field = None;
                }
                None => {}
            }
        }

        meetup.description = answered(&description.join("\n"));
        meetup
    }

    /// Every problem with this entry, in field order.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(ValidationError::MissingTitle);
        }

        let url = self.url.trim();
        if url.is_empty() {
            errors.push(ValidationError::MissingUrl);
        } else if !is_http_url(url) {
            errors.push(ValidationError::BadUrl);
        }

        if self.data.start.trim().is_empty() {
            errors.push(ValidationError::MissingStart);
        } else if parse_instant(&self.data.start).is_none() {
            errors.push(ValidationError::BadStart);
        }

        if let Some(end) = self.data.end.as_deref().filter(|e| !e.trim().is_empty()) {
            if parse_instant(end).is_none() {
                errors.push(ValidationError::BadEnd);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn is_http_url(url: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|scheme| url.strip_prefix(scheme).is_some_and(|rest| !rest.is_empty()))
}

/// Parses an ISO 8601 timestamp. Values without an offset are taken as UTC,
/// and a bare date is midnight UTC.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parses the bundled listing.
pub fn parse_list(json: &str) -> Result<Vec<Meetup>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Puts `meetup` first in the listing at `path` and rewrites the file as
/// two-space indented JSON with a trailing newline. Returns the new length.
pub fn prepend_to_file(path: &Path, meetup: Meetup) -> Result<usize, IngestError> {
    let display = path.display().to_string();
    let raw = fs::read_to_string(path)
        .map_err(|source| IngestError::Io { path: display.clone(), source })?;
    let mut list = parse_list(&raw)
        .map_err(|source| IngestError::Json { path: display.clone(), source })?;

    list.insert(0, meetup);

    let mut out = serde_json::to_string_pretty(&list)
        .map_err(|source| IngestError::Json { path: display.clone(), source })?;
    out.push('\n');
    fs::write(path, out).map_err(|source| IngestError::Io { path: display, source })?;
    Ok(list.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = "\
### Meetup Title

Rust Reykjavík

### Description

Monthly Rust meetup.
  Bring a laptop.

### Event URL

https://example.is/rust

### Start Date and Time

2026-11-05T18:00:00Z

### End Date and Time

_No response_
";

    #[test]
    fn parses_issue_form() {
        let m = Meetup::from_issue_form(FORM);
        assert_eq!(m.title, "Rust Reykjavík");
        assert_eq!(m.description.as_deref(), Some("Monthly Rust meetup.\n  Bring a laptop."));
        assert_eq!(m.url, "https://example.is/rust");
        assert_eq!(m.data.start, "2026-11-05T18:00:00Z");
        assert_eq!(m.data.end, None);
        assert_eq!(m.validate(), Ok(()));
    }

    #[test]
    fn no_response_description_is_absent() {
        let m = Meetup::from_issue_form("### Description\n\n_No response_\n\n### Event URL\n\nhttps://a.is\n");
        assert_eq!(m.description, None);
        assert_eq!(m.url, "https://a.is");
    }

    #[test]
    fn validation_collects_every_error() {
        let m = Meetup {
            title: " ".into(),
            description: None,
            url: "ftp://example.is".into(),
            data: Schedule { start: "next tuesday".into(), end: Some("later".into()) },
        };
        assert_eq!(
            m.validate(),
            Err(vec![
                ValidationError::MissingTitle,
                ValidationError::BadUrl,
                ValidationError::BadStart,
                ValidationError::BadEnd,
            ])
        );
    }

    #[test]
    fn validation_requires_url_and_start() {
        let m = Meetup { title: "x".into(), ..Meetup::default() };
        assert_eq!(
            m.validate(),
            Err(vec![ValidationError::MissingUrl, ValidationError::MissingStart])
        );
        assert!(!is_http_url("https://"));
    }

    #[test]
    fn instants_accept_common_iso_shapes() {
        let expected = "2026-11-05T18:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(parse_instant("2026-11-05T18:00:00Z"), Some(expected));
        assert_eq!(parse_instant("2026-11-05T18:00:00+00:00"), Some(expected));
        assert_eq!(parse_instant("2026-11-05T18:00"), Some(expected));
        assert_eq!(parse_instant("2026-11-05").map(|d| d.to_rfc3339()), Some("2026-11-05T00:00:00+00:00".into()));
        assert_eq!(parse_instant("05/11/2026"), None);
    }

    #[test]
    fn serializes_absent_fields_as_null() {
        let m = Meetup { title: "t".into(), url: "https://a.is".into(), ..Meetup::default() };
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(
            v,
            serde_json::json!({ "title": "t", "description": null, "url": "https://a.is", "data": { "start": "", "end": null } })
        );
    }

    #[test]
    fn prepend_rewrites_file_pretty() {
        let path = std::env::temp_dir().join(format!("apis-meetups-{}.json", std::process::id()));
        fs::write(&path, r#"[{"title":"old","description":null,"url":"https://old.is","data":{"start":"2026-01-01","end":null}}]"#).unwrap();

        let new = Meetup::from_issue_form(FORM);
        let len = prepend_to_file(&path, new.clone()).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(len, 2);
        assert!(written.ends_with("]\n"));
        assert!(written.contains("\n  {\n    \"title\": \"Rust Reykjavík\""));
        let list = parse_list(&written).unwrap();
        assert_eq!(list[0], new);
        assert_eq!(list[1].title, "old");
    }
}
