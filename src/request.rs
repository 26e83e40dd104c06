//! Incoming HTTP request type.

use std::net::SocketAddr;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue};

/// An incoming HTTP request with its body fully read.
///
/// The method is kept as the raw [`http::Method`] so that verbs the route
/// table does not know about still show up correctly in the access log.
pub struct Request {
    pub(crate) method: http::Method,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) peer: Option<SocketAddr>,
}

impl Request {
    /// Builds a request for `target`, which is a path with an optional
    /// `?query` suffix (e.g. `/x/meetups?format=rss`).
    pub fn new(method: http::Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p.to_owned(), Some(q.to_owned())),
            None => (target.to_owned(), None),
        };
        Self {
            method,
            path,
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            peer: None,
        }
    }

    /// Shorthand for `Request::new(http::Method::GET, target)`.
    pub fn get(target: &str) -> Self {
        Self::new(http::Method::GET, target)
    }

    /// Adds a header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(n), Ok(v)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            self.headers.append(n, v);
        }
        self
    }

    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    pub(crate) fn from_parts(parts: http::request::Parts, body: Bytes, peer: SocketAddr) -> Self {
        Self {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().map(str::to_owned),
            headers: parts.headers,
            body,
            peer: Some(peer),
        }
    }

    pub fn method(&self) -> &http::Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn peer_addr(&self) -> Option<SocketAddr> { self.peer }

    /// Path plus `?query` when a query string is present.
    pub fn target(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    /// Case-insensitive header lookup. Non-UTF-8 values are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// First value of a query-string key, percent-decoded.
    pub fn query_param(&self, key: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// `true` when the caller asked for indented JSON with `?pretty=true`.
    pub fn wants_pretty(&self) -> bool {
        self.query_param("pretty").as_deref() == Some("true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_path_and_query() {
        let req = Request::get("/search?q=test&limit=10");
        assert_eq!(req.path(), "/search");
        assert_eq!(req.query(), Some("q=test&limit=10"));
        assert_eq!(req.target(), "/search?q=test&limit=10");
    }

    #[test]
    fn query_param_decodes() {
        let req = Request::get("/x?name=a%20b&pretty=true");
        assert_eq!(req.query_param("name").as_deref(), Some("a b"));
        assert!(req.wants_pretty());
        assert!(!Request::get("/x?pretty=1").wants_pretty());
        assert!(!Request::get("/x").wants_pretty());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::get("/").with_header("X-Real-IP", "10.0.0.1");
        assert_eq!(req.header("x-real-ip"), Some("10.0.0.1"));
    }
}
