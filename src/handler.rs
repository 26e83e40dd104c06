//! Handler trait, type erasure, and handler failures.
//!
//! # How async handlers are stored
//!
//! The route table holds handlers of *different* types in one `Vec` per
//! method, so each handler is hidden behind a trait object:
//!
//! ```text
//! async fn car(req: Request, params: Params) -> Result<Response, HandlerError>
//!        ↓ Endpoint::new(car)
//! car.into_boxed_handler()                         ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(car))                         ← stored as BoxedHandler
//!        ↓
//! handler.call(req, params)  at request time       ← one vtable dispatch
//!        ↓
//! Box::pin(async { car(req, params).await.into_handler_result() })
//! ```
//!
//! An [`Endpoint`] pairs that handler with optional [`EndpointMeta`], which is
//! what the discovery listing is built from.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::Location;
use std::pin::Pin;
use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;

use crate::pattern::Params;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future.
///
/// `Send + 'static` let tokio move the future across threads safely.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// What a handler produces: a response, or a failure the dispatcher turns
/// into the fixed `500`.
pub type HandlerResult = Result<Response, HandlerError>;

// ── HandlerError ──────────────────────────────────────────────────────────────

/// A handler failure.
///
/// Built with `?` from any [`std::error::Error`], or with
/// [`HandlerError::msg`]. It records what the error reporter fingerprints:
/// a *kind* (the error's type name), a *message* (its `Display`), and an
/// origin *trace* (where the conversion happened, then the `source()` chain).
///
/// Like `anyhow::Error`, it does not implement `std::error::Error` itself,
/// which is what lets the blanket `From` impl exist.
pub struct HandlerError {
    kind: String,
    message: String,
    trace: Vec<String>,
}

impl HandlerError {
    /// A failure with a free-form message and kind `Error`.
    #[track_caller]
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new("Error", message)
    }

    #[track_caller]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            trace: vec![origin(Location::caller())],
        }
    }

    /// A failure recovered from a panicking handler.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "handler panicked".to_owned()
        };
        Self { kind: "panic".to_owned(), message, trace: Vec::new() }
    }

    pub fn kind(&self) -> &str { &self.kind }
    pub fn message(&self) -> &str { &self.message }
    pub fn trace(&self) -> &[String] { &self.trace }
}

fn origin(loc: &Location<'_>) -> String {
    format!("at {}:{}:{}", loc.file(), loc.line(), loc.column())
}

impl<E> From<E> for HandlerError
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[track_caller]
    fn from(err: E) -> Self {
        let mut trace = vec![origin(Location::caller())];
        let mut source = err.source();
        while let Some(cause) = source {
            trace.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        Self {
            kind: std::any::type_name::<E>().to_owned(),
            message: err.to_string(),
            trace,
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("trace", &self.trace)
            .finish()
    }
}

// ── IntoHandlerResult ─────────────────────────────────────────────────────────

/// What a handler's future may resolve to.
///
/// Plain responses are always successes; `Result`s carry their failure
/// through to the dispatcher.
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for Response {
    fn into_handler_result(self) -> HandlerResult { Ok(self) }
}

impl IntoHandlerResult for &'static str {
    fn into_handler_result(self) -> HandlerResult { Ok(self.into_response()) }
}

impl IntoHandlerResult for String {
    fn into_handler_result(self) -> HandlerResult { Ok(self.into_response()) }
}

impl IntoHandlerResult for StatusCode {
    fn into_handler_result(self) -> HandlerResult { Ok(self.into_response()) }
}

impl<R, E> IntoHandlerResult for Result<R, E>
where
    R: IntoResponse,
    E: Into<HandlerError>,
{
    fn into_handler_result(self) -> HandlerResult {
        self.map(IntoResponse::into_response).map_err(Into::into)
    }
}

// ── Handler ───────────────────────────────────────────────────────────────────

#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request, params: Params) -> BoxFuture<HandlerResult>;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is satisfied by any function or
/// closure of the shape:
///
/// ```text
/// async fn name(req: Request, params: Params) -> impl IntoHandlerResult
/// ```
///
/// Closures need their argument types spelled out
/// (`|_: Request, _: Params| async { "ok" }`) because the signature is only
/// known through this trait.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Newtype bridging a concrete handler `F` to [`ErasedHandler`].
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request, Params) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult + Send + 'static,
{
    fn call(&self, req: Request, params: Params) -> BoxFuture<HandlerResult> {
        let fut = (self.0)(req, params);
        Box::pin(async move { fut.await.into_handler_result() })
    }
}

// ── Endpoint ──────────────────────────────────────────────────────────────────

/// Static, self-describing information about an endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EndpointMeta {
    pub endpoint: String,
    pub description: String,
}

/// A handler plus its optional discovery metadata.
pub struct Endpoint {
    handler: BoxedHandler,
    meta: Option<EndpointMeta>,
}

impl Endpoint {
    pub fn new(handler: impl Handler) -> Self {
        Self { handler: handler.into_boxed_handler(), meta: None }
    }

    /// Attaches discovery metadata.
    pub fn describe(mut self, endpoint: impl Into<String>, description: impl Into<String>) -> Self {
        self.meta = Some(EndpointMeta {
            endpoint: endpoint.into(),
            description: description.into(),
        });
        self
    }

    pub fn meta(&self) -> Option<&EndpointMeta> {
        self.meta.as_ref()
    }

    pub(crate) fn handler(&self) -> BoxedHandler {
        Arc::clone(&self.handler)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint").field("meta", &self.meta).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Outer(Inner);

    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("outer failed") }
    }
    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("inner cause") }
    }
    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> { Some(&self.0) }
    }
    impl std::error::Error for Inner {}

    fn fails() -> Result<(), HandlerError> {
        Err::<(), _>(Outer(Inner))?;
        Ok(())
    }

    #[test]
    fn from_error_records_kind_message_and_trace() {
        let err = fails().unwrap_err();
        assert!(err.kind().ends_with("Outer"));
        assert_eq!(err.message(), "outer failed");
        assert!(err.trace()[0].starts_with("at "));
        assert!(err.trace()[0].contains("handler.rs"));
        assert_eq!(err.trace()[1], "caused by: inner cause");
    }

    #[test]
    fn panic_payloads_become_messages() {
        let err = HandlerError::from_panic(Box::new("boom"));
        assert_eq!(err.kind(), "panic");
        assert_eq!(err.message(), "boom");

        let err = HandlerError::from_panic(Box::new(String::from("owned boom")));
        assert_eq!(err.message(), "owned boom");

        let err = HandlerError::from_panic(Box::new(42_u8));
        assert_eq!(err.message(), "handler panicked");
    }

    #[tokio::test]
    async fn boxed_handler_maps_results() {
        let ok = Endpoint::new(|_: Request, _: Params| async { "fine" });
        let res = ok.handler().call(Request::get("/"), Params::new()).await.unwrap();
        assert_eq!(res.body_text(), "fine");

        let bad = Endpoint::new(|_: Request, _: Params| async {
            Err::<Response, _>(HandlerError::msg("x"))
        });
        let err = bad.handler().call(Request::get("/"), Params::new()).await.unwrap_err();
        assert_eq!(err.message(), "x");
    }

    #[test]
    fn describe_attaches_meta() {
        let ep = Endpoint::new(|_: Request, _: Params| async { "ok" })
            .describe("/x/car/{number}", "Vehicle lookup");
        let meta = ep.meta().unwrap();
        assert_eq!(meta.endpoint, "/x/car/{number}");
        assert_eq!(meta.description, "Vehicle lookup");
    }
}
