//! The public API surface: one module per data source.
//!
//! Every endpoint answers with `Access-Control-Allow-Origin: *` and honours
//! `?pretty=true`. Upstream failures are handler failures, so callers see the
//! standard `500` and the error is reported.

pub mod car;
pub mod gengi;
pub mod meetups;
pub mod meta;
pub mod race_calendar;

use tracing::info;

use crate::config::Upstreams;
use crate::error::Error;
use crate::method::Method;
use crate::router::Router;
use crate::upstream;

/// Registers every endpoint on `router`, then the discovery listing at `/`
/// built from what was registered.
pub fn register(router: &mut Router, upstreams: &Upstreams) -> Result<(), Error> {
    let client = upstream::client();

    router.add(Method::Get, gengi::ROUTE, gengi::endpoint(client.clone(), upstreams.borgun_url.clone()))?;
    router.add(Method::Get, car::ROUTE, car::endpoint(client.clone(), upstreams.island_url.clone()))?;
    router.add(
        Method::Get,
        race_calendar::ROUTE,
        race_calendar::endpoint(client, upstreams.race_calendar_url.clone()),
    )?;
    router.add(Method::Get, meetups::ROUTE, meetups::endpoint(meetups::bundled()?))?;

    let listing = router.endpoints();
    info!(endpoints = listing.len(), "endpoints registered");
    router.add(Method::Get, meta::ROUTE, meta::endpoint(listing))
}
