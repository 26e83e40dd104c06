//! Currency exchange rates from Borgun.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::handler::{Endpoint, HandlerResult};
use crate::pattern::Params;
use crate::request::Request;
use crate::response::Response;
use crate::upstream::{UpstreamError, ensure_success};

pub const ROUTE: &str = "/x/gengi/{:code}?";
pub const ENDPOINT: &str = "/x/gengi/{code}";
pub const DESCRIPTION: &str = "Currency exchange rates from Borgun. Optional {code} parameter to filter by currency code(s), comma-separated.";

#[derive(Debug, Deserialize)]
struct Rates {
    #[serde(rename = "Rate", default)]
    rates: Vec<RateRow>,
}

#[derive(Debug, Deserialize)]
struct RateRow {
    #[serde(rename = "CurrencyCode")]
    code: String,
    #[serde(rename = "CurrencyDescription", default)]
    description: String,
    #[serde(rename = "CurrencyRate")]
    rate: f64,
}

/// One currency in the output, keyed by its ISO code.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Currency {
    pub description: String,
    pub rate: f64,
}

pub type RateTable = BTreeMap<String, Currency>;

/// Parses Borgun's `<Rates><Rate>…</Rate></Rates>` document.
pub fn parse_rates(xml: &str) -> Result<RateTable, UpstreamError> {
    let doc: Rates = quick_xml::de::from_str(xml)?;
    Ok(doc.rates
        .into_iter()
        .map(|r| (r.code, Currency { description: r.description, rate: r.rate }))
        .collect())
}

/// Keeps only the comma-separated `codes`. Matching ignores case and
/// surrounding whitespace; unknown codes are dropped silently.
pub fn filter(table: RateTable, codes: &str) -> RateTable {
    let wanted: Vec<&str> = codes
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    table.into_iter()
        .filter(|(code, _)| wanted.iter().any(|w| w.eq_ignore_ascii_case(code)))
        .collect()
}

pub fn endpoint(client: Client, url: String) -> Endpoint {
    let url: Arc<str> = url.into();
    Endpoint::new(move |req: Request, params: Params| {
        let client = client.clone();
        let url = Arc::clone(&url);
        async move { gengi(&client, &url, req, params).await }
    })
    .describe(ENDPOINT, DESCRIPTION)
}

async fn gengi(client: &Client, url: &str, req: Request, params: Params) -> HandlerResult {
    let mut rates = fetch(client, url).await?;
    if let Some(codes) = params.get("code") {
        rates = filter(rates, codes);
    }
    // Indented unless explicitly turned off.
    let pretty = req.query_param("pretty").as_deref() != Some("false");
    Ok(Response::json_value(&rates, pretty)?)
}

async fn fetch(client: &Client, url: &str) -> Result<RateTable, UpstreamError> {
    let res = client.get(url).query(&[("function", "all")]).send().await?;
    let xml = ensure_success(res).await?.text().await?;
    parse_rates(&xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Rates>
  <Rate>
    <CurrencyCode>USD</CurrencyCode>
    <CurrencyDescription>Dollar, US</CurrencyDescription>
    <CurrencyRate>138.50</CurrencyRate>
  </Rate>
  <Rate>
    <CurrencyCode>EUR</CurrencyCode>
    <CurrencyDescription>Euro, EU</CurrencyDescription>
    <CurrencyRate>151.20</CurrencyRate>
  </Rate>
  <Rate>
    <CurrencyCode>GBP</CurrencyCode>
    <CurrencyDescription>Pound, Great Britain</CurrencyDescription>
    <CurrencyRate>175.30</CurrencyRate>
  </Rate>
</Rates>"#;

    #[test]
    fn parses_every_rate() {
        let table = parse_rates(XML).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table["USD"], Currency { description: "Dollar, US".into(), rate: 138.50 });
        assert_eq!(table["GBP"].rate, 175.30);
    }

    #[test]
    fn filters_single_and_multiple_codes() {
        let table = parse_rates(XML).unwrap();

        let one = filter(table.clone(), "USD");
        assert_eq!(one.keys().collect::<Vec<_>>(), ["USD"]);

        let two = filter(table.clone(), "usd, EUR");
        assert_eq!(two.keys().collect::<Vec<_>>(), ["EUR", "USD"]);

        assert!(filter(table, "XYZ").is_empty());
    }

    #[test]
    fn serializes_as_code_keyed_object() {
        let table = filter(parse_rates(XML).unwrap(), "USD");
        let v = serde_json::to_value(&table).unwrap();
        assert_eq!(v, serde_json::json!({ "USD": { "description": "Dollar, US", "rate": 138.5 } }));
    }

    #[test]
    fn rejects_non_numeric_rate() {
        let xml = "<Rates><Rate><CurrencyCode>USD</CurrencyCode><CurrencyRate>n/a</CurrencyRate></Rate></Rates>";
        assert!(matches!(parse_rates(xml), Err(UpstreamError::Xml(_))));
    }

    #[test]
    fn empty_document_has_no_rates() {
        assert!(parse_rates("<Rates></Rates>").unwrap().is_empty());
    }
}
