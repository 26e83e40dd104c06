//! Path templates.
//!
//! A template is a `/`-separated path whose segments are either literal text
//! or a named parameter. `{:name}` is required and must capture a non-empty
//! segment; `{:name}?` is optional and may only appear at the end:
//!
//! ```text
//! /x/car/{:number}        matches /x/car/AB123        → {number: "AB123"}
//! /x/gengi/{:code}?       matches /x/gengi/USD        → {code: "USD"}
//!                         matches /x/gengi/           → {}
//! ```
//!
//! Each compiled template owns a tiny [`matchit`] tree holding one route per
//! accepted shape (the full template, then one truncation per optional
//! parameter), so segment matching and capture are matchit's.

use std::collections::HashMap;
use std::fmt;

use matchit::Router as MatchitRouter;

use crate::error::PatternError;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param { name: String, optional: bool },
}

/// A compiled path template.
pub struct PathPattern {
    template: String,
    tree: MatchitRouter<()>,
}

impl PathPattern {
    /// Compiles `template`, rejecting malformed ones.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        if !template.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash);
        }
        check_braces(template)?;

        let mut segments = Vec::new();
        let mut seen_optional = false;
        for raw in template[1..].split('/') {
            let segment = parse_segment(raw)?;
            match &segment {
                Segment::Param { name, optional } => {
                    if segments.iter().any(|s| matches!(s, Segment::Param { name: n, .. } if n == name)) {
                        return Err(PatternError::DuplicateParam(name.clone()));
                    }
                    if seen_optional && !optional {
                        return Err(PatternError::OptionalNotTrailing(last_optional(&segments)));
                    }
                    seen_optional |= *optional;
                }
                Segment::Literal(_) if seen_optional => {
                    return Err(PatternError::OptionalNotTrailing(last_optional(&segments)));
                }
                Segment::Literal(_) => {}
            }
            segments.push(segment);
        }

        let mut tree = MatchitRouter::new();
        for shape in shapes(&segments) {
            // Shapes are distinct prefixes of a validated template; matchit
            // only rejects them if the translation above is wrong.
            tree.insert(shape.clone(), ())
                .map_err(|_| PatternError::PartialSegment(shape))?;
        }

        Ok(Self { template: template.to_owned(), tree })
    }

    /// The template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Whether `path` satisfies this template.
    pub fn test(&self, path: &str) -> bool {
        self.tree.at(path).is_ok()
    }

    /// Captured parameters for `path`, or `None` when it does not match.
    /// Optional parameters the path leaves out are absent from the result.
    pub fn extract(&self, path: &str) -> Option<Params> {
        let matched = self.tree.at(path).ok()?;
        Some(Params(
            matched.params.iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        ))
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathPattern").field(&self.template).finish()
    }
}

fn check_braces(template: &str) -> Result<(), PatternError> {
    let mut open: Option<usize> = None;
    for (i, c) in template.char_indices() {
        match c {
            '{' if open.is_some() => return Err(PatternError::UnbalancedBraces(i)),
            '{' => open = Some(i),
            '}' if open.is_none() => return Err(PatternError::UnbalancedBraces(i)),
            '}' => open = None,
            _ => {}
        }
    }
    match open {
        Some(i) => Err(PatternError::UnbalancedBraces(i)),
        None => Ok(()),
    }
}

fn parse_segment(raw: &str) -> Result<Segment, PatternError> {
    if !raw.contains('{') {
        return Ok(Segment::Literal(raw.to_owned()));
    }
    let (body, optional) = match raw.strip_suffix('?') {
        Some(b) => (b, true),
        None => (raw, false),
    };
    let inner = body.strip_prefix('{').and_then(|b| b.strip_suffix('}'));
    let Some(inner) = inner else {
        return Err(PatternError::PartialSegment(raw.to_owned()));
    };
    let name = inner.strip_prefix(':').unwrap_or(inner);
    if !inner.starts_with(':') || !is_ident(name) {
        return Err(PatternError::BadParamName(inner.to_owned()));
    }
    Ok(Segment::Param { name: name.to_owned(), optional })
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn last_optional(segments: &[Segment]) -> String {
    segments.iter().rev()
        .find_map(|s| match s {
            Segment::Param { name, optional: true } => Some(name.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

/// Every concrete route the template accepts, in matchit syntax: the full
/// template first, then the template cut before each optional parameter,
/// keeping the `/` that preceded it.
fn shapes(segments: &[Segment]) -> Vec<String> {
    let render = |segs: &[Segment]| -> String {
        segs.iter()
            .map(|s| match s {
                Segment::Literal(text) => format!("/{text}"),
                Segment::Param { name, .. } => format!("/{{{name}}}"),
            })
            .collect()
    };

    let mut out = vec![render(segments)];
    for (i, s) in segments.iter().enumerate().rev() {
        if matches!(s, Segment::Param { optional: true, .. }) {
            out.push(format!("{}/", render(&segments[..i])));
        }
    }
    out
}

// ── Params ────────────────────────────────────────────────────────────────────

/// Path parameters captured by a matched route.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params(HashMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
