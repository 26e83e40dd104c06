//! Vehicle lookup through island.is.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{Value, json};

use crate::handler::{Endpoint, HandlerResult};
use crate::pattern::Params;
use crate::request::Request;
use crate::response::Response;
use crate::upstream::{UpstreamError, ensure_success, take_path};

pub const ROUTE: &str = "/x/car/{:number}";
pub const ENDPOINT: &str = "/x/car/{number}";
pub const DESCRIPTION: &str = "Vehicle information lookup by registration number from island.is.";

const OPERATION: &str = "GetPublicVehicleSearch";
const PERSISTED_QUERY: &str = r#"{"persistedQuery":{"version":1,"sha256Hash":"b04f6f91c746425e2b15966df336f47814b94a0642bfbf6fa3ad7bdd8d3c80e5"}}"#;

/// The persisted-query GET for `number`.
pub fn search_request(client: &Client, base: &str, number: &str) -> reqwest::Result<reqwest::Request> {
    let variables = json!({ "input": { "search": number } }).to_string();
    client
        .get(base)
        .query(&[
            ("operationName", OPERATION),
            ("variables", variables.as_str()),
            ("extensions", PERSISTED_QUERY),
        ])
        .build()
}

pub fn endpoint(client: Client, base: String) -> Endpoint {
    let base: Arc<str> = base.into();
    Endpoint::new(move |req: Request, params: Params| {
        let client = client.clone();
        let base = Arc::clone(&base);
        async move { car(&client, &base, req, params).await }
    })
    .describe(ENDPOINT, DESCRIPTION)
}

async fn car(client: &Client, base: &str, req: Request, params: Params) -> HandlerResult {
    let number = params.get("number").unwrap_or_default();
    let vehicle = lookup(client, base, number).await?;
    Ok(Response::json_value(&vehicle, req.wants_pretty())?)
}

async fn lookup(client: &Client, base: &str, number: &str) -> Result<Value, UpstreamError> {
    let res = client.execute(search_request(client, base, number)?).await?;
    let body = ensure_success(res).await?.bytes().await?;
    take_path(serde_json::from_slice(&body)?, &["data", "getPublicVehicleSearch"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_persisted_query() {
        let client = Client::new();
        let req = search_request(&client, "https://island.is/api/graphql", "AB123").unwrap();
        let pairs: Vec<(String, String)> = req.url().query_pairs().into_owned().collect();

        assert_eq!(req.url().path(), "/api/graphql");
        assert_eq!(pairs[0], ("operationName".into(), "GetPublicVehicleSearch".into()));
        assert_eq!(pairs[1], ("variables".into(), r#"{"input":{"search":"AB123"}}"#.into()));
        let ext: Value = serde_json::from_str(&pairs[2].1).unwrap();
        assert_eq!(ext["persistedQuery"]["version"], 1);
    }

    #[test]
    fn number_is_encoded_not_spliced() {
        let client = Client::new();
        let req = search_request(&client, "https://island.is/api/graphql", r#"x"}&a=b"#).unwrap();
        let variables = req.url().query_pairs()
            .find(|(k, _)| k == "variables")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        let parsed: Value = serde_json::from_str(&variables).unwrap();
        assert_eq!(parsed["input"]["search"], r#"x"}&a=b"#);
    }
}
