//! Request router and dispatcher.
//!
//! One ordered route list per [`Method`]. Lookup walks the list in
//! registration order and takes the first pattern that matches, so a route
//! registered after an identical (or broader) one is simply unreachable.
//! There is no conflict detection and no priority: order *is* the priority.
//!
//! Every request, matched or not, then runs through the same middleware
//! chain. Handler failures (returned errors and panics alike) are caught at
//! exactly one place, the terminal step built in [`Router::route`], where they
//! are reported and turned into the fixed `500`.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::debug;

use crate::error::Error;
use crate::handler::{BoxFuture, BoxedHandler, Endpoint, EndpointMeta, Handler, HandlerError};
use crate::method::Method;
use crate::middleware::{BoxedMiddleware, Middleware, Next, Terminal};
use crate::pattern::{Params, PathPattern};
use crate::report::{IssueReporter, Reporter, RequestContext};
use crate::request::Request;
use crate::response::Response;

struct Route {
    pattern: PathPattern,
    endpoint: Endpoint,
}

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// It is never mutated while serving.
pub struct Router {
    routes: [Vec<Route>; Method::COUNT],
    middleware: Arc<[BoxedMiddleware]>,
    reporter: Arc<dyn Reporter>,
}

impl Router {
    /// An empty router whose failures are only logged.
    pub fn new() -> Self {
        Self {
            routes: Default::default(),
            middleware: Arc::from(Vec::new()),
            reporter: Arc::new(IssueReporter::disabled()),
        }
    }

    /// Appends `endpoint` to the route list for `method`.
    ///
    /// Path templates use `{:name}` for required and `{:name}?` for optional
    /// trailing parameters. A malformed template is an [`Error::InvalidPattern`].
    pub fn add(&mut self, method: Method, template: &str, endpoint: Endpoint) -> Result<(), Error> {
        let pattern = PathPattern::compile(template).map_err(|source| Error::InvalidPattern {
            template: template.to_owned(),
            source,
        })?;
        debug!(%method, template, "route registered");
        self.routes[method.index()].push(Route { pattern, endpoint });
        Ok(())
    }

    /// Registers a handler without metadata. Returns `self` for chaining:
    ///
    /// ```rust
    /// # use apis::{Method, Params, Request, Router};
    /// # async fn car(_: Request, _: Params) -> &'static str { "" }
    /// # fn main() -> Result<(), apis::Error> {
    /// let router = Router::new()
    ///     .on(Method::Get, "/x/car/{:number}", car)?
    ///     .on(Method::Get, "/x/gengi/{:code}?", car)?;
    /// # Ok(()) }
    /// ```
    pub fn on(mut self, method: Method, template: &str, handler: impl Handler) -> Result<Self, Error> {
        self.add(method, template, Endpoint::new(handler))?;
        Ok(self)
    }

    /// Appends a middleware. Middleware runs in the order it was added.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        let mut chain = self.middleware.to_vec();
        chain.push(Arc::new(middleware));
        self.middleware = chain.into();
        self
    }

    /// Replaces the failure reporter.
    pub fn with_reporter(mut self, reporter: impl Reporter) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// The first route for `method` whose pattern matches `path`, with the
    /// parameters it captured.
    pub fn lookup(&self, method: Method, path: &str) -> Option<(&Endpoint, Params)> {
        self.routes[method.index()]
            .iter()
            .find_map(|route| route.pattern.extract(path).map(|params| (&route.endpoint, params)))
    }

    /// Metadata of every registered endpoint that has some, by method and
    /// then registration order.
    pub fn endpoints(&self) -> Vec<EndpointMeta> {
        self.routes
            .iter()
            .flatten()
            .filter_map(|route| route.endpoint.meta().cloned())
            .collect()
    }

    /// Produces exactly one response for `req`.
    pub async fn route(&self, req: Request) -> Response {
        let matched = Method::try_from(req.method())
            .ok()
            .and_then(|method| self.lookup(method, req.path()));

        let terminal: Terminal = match matched {
            Some((endpoint, params)) => {
                let handler = endpoint.handler();
                let reporter = Arc::clone(&self.reporter);
                Box::new(move |req: Request| -> BoxFuture<Response> {
                    Box::pin(invoke(handler, req, params, reporter))
                })
            }
            None => {
                debug!(method = %req.method(), path = req.path(), "no route matched");
                Box::new(|_req: Request| -> BoxFuture<Response> {
                    Box::pin(async { Response::not_found() })
                })
            }
        };

        Next::new(Arc::clone(&self.middleware), terminal).run(req).await
    }

    /// Runs `req` through the middleware chain with `res` as the terminal
    /// response. Used when the request can be described but not routed, such
    /// as when its body could not be read.
    pub async fn respond(&self, req: Request, res: Response) -> Response {
        let terminal: Terminal = Box::new(move |_req: Request| -> BoxFuture<Response> {
            Box::pin(async move { res })
        });
        Next::new(Arc::clone(&self.middleware), terminal).run(req).await
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut routes = f.debug_map();
        for method in Method::ALL {
            let templates: Vec<&str> = self.routes[method.index()]
                .iter()
                .map(|r| r.pattern.template())
                .collect();
            if !templates.is_empty() {
                routes.entry(&method, &templates);
            }
        }
        routes.finish()
    }
}

/// Runs the handler inside the failure boundary.
async fn invoke(
    handler: BoxedHandler,
    req: Request,
    params: Params,
    reporter: Arc<dyn Reporter>,
) -> Response {
    let ctx = RequestContext::from_request(&req);
    let outcome = AssertUnwindSafe(async move { handler.call(req, params).await })
        .catch_unwind()
        .await;

    let err = match outcome {
        Ok(Ok(res)) => return res,
        Ok(Err(err)) => err,
        Err(panic) => HandlerError::from_panic(panic),
    };
    reporter.report(&err, Some(ctx));
    Response::internal_error()
}
