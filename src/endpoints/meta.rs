//! Discovery listing served at `/`.

use std::sync::Arc;

use serde::Serialize;

use crate::handler::{Endpoint, EndpointMeta};
use crate::pattern::Params;
use crate::request::Request;
use crate::response::Response;

pub const ROUTE: &str = "/";

#[derive(Serialize)]
struct Listing<'a> {
    endpoints: &'a [EndpointMeta],
}

/// Serves `{"endpoints": [...]}` from a snapshot taken at startup.
///
/// Take the snapshot with [`Router::endpoints`](crate::Router::endpoints)
/// after everything else is registered. The listing itself has no metadata,
/// so it never lists itself.
pub fn endpoint(endpoints: Vec<EndpointMeta>) -> Endpoint {
    let endpoints: Arc<[EndpointMeta]> = endpoints.into();
    Endpoint::new(move |req: Request, _: Params| {
        let endpoints = Arc::clone(&endpoints);
        async move { Response::json_value(&Listing { endpoints: &endpoints }, req.wants_pretty()) }
    })
}
