//! # apis
//!
//! A small HTTP gateway that puts Icelandic public data sources (currency
//! rates, vehicle records, race and meetup calendars) behind one JSON/RSS API.
//!
//! The framework half is deliberately tiny:
//!
//! - Per-method route lists matched first-come by [`PathPattern`] templates
//!   (`/x/car/{:number}`, `/x/gengi/{:code}?`)
//! - A linear [`Middleware`] chain around every request, matched or not
//! - One failure boundary: a handler that errors or panics yields a fixed
//!   JSON `500`, and the failure goes to a [`Reporter`] off the response path
//! - Graceful shutdown on SIGTERM / Ctrl-C
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use apis::{AccessLog, Endpoint, Method, Params, Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), apis::Error> {
//!     let mut app = Router::new().layer(AccessLog::new());
//!     app.add(
//!         Method::Get,
//!         "/x/hello/{:name}",
//!         Endpoint::new(hello).describe("/x/hello/{name}", "Greets you."),
//!     )?;
//!
//!     Server::bind(([0, 0, 0, 0], 8000).into()).serve(app).await
//! }
//!
//! async fn hello(req: Request, params: Params) -> Result<Response, serde_json::Error> {
//!     let name = params.get("name").unwrap_or("world");
//!     Response::json_value(&serde_json::json!({ "hello": name }), req.wants_pretty())
//! }
//! ```

mod error;
mod handler;
mod method;
mod pattern;
mod request;
mod response;
mod router;
mod server;

pub mod config;
pub mod endpoints;
pub mod meetup;
pub mod middleware;
pub mod report;
pub mod rss;
pub mod upstream;

pub use error::{Error, PatternError};
pub use handler::{BoxFuture, Endpoint, EndpointMeta, Handler, HandlerError, HandlerResult, IntoHandlerResult};
pub use method::Method;
pub use middleware::{AccessLog, Middleware, Next};
pub use pattern::{Params, PathPattern};
pub use report::{IssueReporter, Reporter, ReporterConfig};
pub use request::Request;
pub use response::{ALLOW_ORIGIN, ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
