//! Icelandic tech meetups, as JSON or RSS.

use std::sync::Arc;

use chrono::Utc;

use crate::handler::{Endpoint, HandlerResult};
use crate::meetup::{Meetup, parse_list};
use crate::pattern::Params;
use crate::request::Request;
use crate::response::{ContentType, Response};
use crate::rss;

pub const ROUTE: &str = "/x/meetups";
pub const DESCRIPTION: &str = "List of Icelandic tech meetups and community groups. Add ?format=rss for an RSS feed.";

const BUNDLED: &str = include_str!("../../data/meetups.json");

/// The listing compiled into the binary.
pub fn bundled() -> Result<Vec<Meetup>, serde_json::Error> {
    parse_list(BUNDLED)
}

pub fn endpoint(meetups: Vec<Meetup>) -> Endpoint {
    let meetups = Arc::new(meetups);
    Endpoint::new(move |req: Request, _: Params| {
        let meetups = Arc::clone(&meetups);
        async move { respond(&meetups, &req) }
    })
    .describe(ROUTE, DESCRIPTION)
}

fn respond(meetups: &[Meetup], req: &Request) -> HandlerResult {
    if req.query_param("format").as_deref() == Some("rss") {
        return Ok(Response::builder()
            .allow_any_origin()
            .bytes(ContentType::Rss, rss::render(meetups, Utc::now())));
    }
    Ok(Response::json_value(meetups, req.wants_pretty())?)
}
