//! Access logging in Common Log Format.
//!
//! `$client - - [$time_local] "$method $target HTTP/1.1" $status $bytes`

use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use tracing::info;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

type Sink = Arc<dyn Fn(&str) + Send + Sync>;

/// Middleware that logs exactly one line per request, after the rest of the
/// chain has produced the final response.
///
/// Lines go to `tracing` at `INFO` on target `access` unless a sink is set.
/// Register it first so the line reflects what every other middleware did to
/// the response.
#[derive(Clone, Default)]
pub struct AccessLog {
    sink: Option<Sink>,
}

impl AccessLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends formatted lines to `sink` instead of `tracing`.
    pub fn with_sink(sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self { sink: Some(Arc::new(sink)) }
    }
}

impl Middleware for AccessLog {
    fn call(&self, req: Request, next: Next) -> BoxFuture<Response> {
        let client = client_of(&req);
        let method = req.method().to_string();
        let target = req.target();
        let received = Local::now();
        let sink = self.sink.clone();

        Box::pin(async move {
            let res = next.run(req).await;
            let line = format_line(
                &client,
                &received,
                &method,
                &target,
                res.status_code().as_u16(),
                res.body().len(),
            );
            match sink {
                Some(sink) => sink(&line),
                None => info!(target: "access", "{line}"),
            }
            res
        })
    }
}

/// The client address to log: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the socket peer, then `-`.
pub fn client_of(req: &Request) -> String {
    let forwarded = req.header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_owned();
    }
    if let Some(ip) = req.header("x-real-ip").map(str::trim).filter(|v| !v.is_empty()) {
        return ip.to_owned();
    }
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_owned())
}

/// Renders one access-log line.
///
/// The protocol token is always `HTTP/1.1`, whatever version the client
/// actually spoke, so log consumers see one fixed shape.
pub fn format_line<Tz>(
    client: &str,
    time: &DateTime<Tz>,
    method: &str,
    target: &str,
    status: u16,
    bytes: usize,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{client} - - [{}] \"{method} {target} HTTP/1.1\" {status} {bytes}",
        time.format("%d/%b/%Y:%H:%M:%S %z"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn formats_common_log_line() {
        let tz = FixedOffset::west_opt(7 * 3600).unwrap();
        let time = tz.with_ymd_and_hms(2000, 10, 10, 13, 55, 36).unwrap();
        let line = format_line("127.0.0.1", &time, "GET", "/search?q=1", 200, 2326);
        assert_eq!(
            line,
            r#"127.0.0.1 - - [10/Oct/2000:13:55:36 -0700] "GET /search?q=1 HTTP/1.1" 200 2326"#
        );
    }

    #[test]
    fn client_prefers_forwarded_for() {
        let req = Request::get("/")
            .with_header("x-forwarded-for", " 203.0.113.7 , 10.0.0.1")
            .with_header("x-real-ip", "10.0.0.2");
        assert_eq!(client_of(&req), "203.0.113.7");
    }

    #[test]
    fn client_falls_back_to_real_ip_then_peer_then_dash() {
        let req = Request::get("/").with_header("x-real-ip", "10.0.0.2");
        assert_eq!(client_of(&req), "10.0.0.2");

        let req = Request::get("/").with_peer("192.0.2.1:5000".parse().unwrap());
        assert_eq!(client_of(&req), "192.0.2.1");

        assert_eq!(client_of(&Request::get("/")), "-");
    }

    #[tokio::test]
    async fn http2_requests_log_the_fixed_protocol_token() {
        let lines = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = Arc::clone(&lines);
        let log = AccessLog::with_sink(move |line| seen.lock().unwrap().push(line.to_owned()));

        let (parts, ()) = http::Request::builder()
            .version(http::Version::HTTP_2)
            .uri("/x/meetups")
            .body(())
            .unwrap()
            .into_parts();
        let req = Request::from_parts(parts, bytes::Bytes::new(), "192.0.2.1:5000".parse().unwrap());
        let terminal: crate::middleware::Terminal =
            Box::new(|_req: Request| -> BoxFuture<Response> { Box::pin(async { Response::text("ok") }) });
        log.call(req, Next::new(Arc::from(Vec::new()), terminal)).await;

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("\"GET /x/meetups HTTP/1.1\" 200 2"), "{}", lines[0]);
    }
}
