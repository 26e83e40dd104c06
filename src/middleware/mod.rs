//! Middleware layer.
//!
//! Middleware wraps every request, matched or not, and is the right place
//! for cross-cutting concerns such as access logging or header rewriting.
//!
//! A chain of `N` middleware is a single linear continuation: middleware `i`
//! receives the request and a [`Next`] that, when run, hands the request to
//! middleware `i + 1`, or to the terminal step (the matched handler or the
//! `404` producer) once the chain is exhausted. A middleware may
//!
//! - run `next` and return its response untouched,
//! - run `next` and rewrite or replace the response, or
//! - return its own response without running `next`, in which case nothing
//!   further down the chain (handler included) executes.
//!
//! ```rust
//! use apis::{Next, Request, Response, Router};
//!
//! let router = Router::new()
//!     .layer(|req: Request, next: Next| async move {
//!         if req.header("x-block").is_some() {
//!             return Response::status(http::StatusCode::FORBIDDEN);
//!         }
//!         next.run(req).await
//!     });
//! # drop(router);
//! ```

mod access_log;

pub use access_log::{AccessLog, client_of, format_line};

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

/// A request/response wrapper run around every request.
///
/// Implemented automatically for `Fn(Request, Next) -> impl Future<Output = Response>`.
/// Implement it by hand for middleware that carries configuration, such as
/// [`AccessLog`].
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, req: Request, next: Next) -> BoxFuture<Response>;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture<Response> {
        Box::pin((self)(req, next))
    }
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// The step a request reaches once every middleware has passed it on.
pub(crate) type Terminal = Box<dyn FnOnce(Request) -> BoxFuture<Response> + Send>;

/// The remainder of the chain, from one middleware's point of view.
///
/// Consumed by [`Next::run`], so each stage can continue at most once.
pub struct Next {
    chain: Arc<[BoxedMiddleware]>,
    index: usize,
    terminal: Terminal,
}

impl Next {
    pub(crate) fn new(chain: Arc<[BoxedMiddleware]>, terminal: Terminal) -> Self {
        Self { chain, index: 0, terminal }
    }

    /// Runs the rest of the chain and returns its response.
    pub async fn run(mut self, req: Request) -> Response {
        match self.chain.get(self.index).cloned() {
            Some(middleware) => {
                self.index += 1;
                middleware.call(req, self).await
            }
            None => (self.terminal)(req).await,
        }
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("len", &self.chain.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> BoxedMiddleware {
        let log = Arc::clone(log);
        Arc::new(move |req: Request, next: Next| {
            log.lock().unwrap().push(name.to_owned());
            next.run(req)
        })
    }

    fn terminal(log: &Arc<Mutex<Vec<String>>>) -> Terminal {
        let log = Arc::clone(log);
        Box::new(move |_req: Request| -> BoxFuture<Response> {
            log.lock().unwrap().push("terminal".to_owned());
            Box::pin(async { Response::text("done") })
        })
    }

    #[tokio::test]
    async fn empty_chain_goes_straight_to_terminal() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let res = Next::new(Arc::from(Vec::new()), terminal(&log)).run(Request::get("/")).await;
        assert_eq!(res.body_text(), "done");
        assert_eq!(*log.lock().unwrap(), vec!["terminal"]);
    }

    #[tokio::test]
    async fn runs_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain: Arc<[BoxedMiddleware]> = Arc::from(vec![recorder(&log, "a"), recorder(&log, "b")]);
        Next::new(chain, terminal(&log)).run(Request::get("/")).await;
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "terminal"]);
    }

    #[tokio::test]
    async fn short_circuit_skips_the_rest() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stop: BoxedMiddleware = Arc::new(|_req: Request, _next: Next| async {
            Response::status(http::StatusCode::FORBIDDEN)
        });
        let chain: Arc<[BoxedMiddleware]> = Arc::from(vec![stop, recorder(&log, "after")]);
        let res = Next::new(chain, terminal(&log)).run(Request::get("/")).await;
        assert_eq!(res.status_code(), http::StatusCode::FORBIDDEN);
        assert!(log.lock().unwrap().is_empty());
    }
}
