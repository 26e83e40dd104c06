//! Process configuration.
//!
//! Parsed once in `main` from flags and environment, then passed down. The
//! library never reads the environment itself.

use std::net::SocketAddr;

use clap::Parser;

use crate::report::ReporterConfig;

/// Runtime configuration for the `apis` server.
#[derive(Clone, Debug, Parser)]
#[command(name = "apis", version, about = "Icelandic data sources behind one JSON/RSS API")]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// Set only in production deployments; enables issue reporting.
    #[arg(long, env = "DENO_DEPLOYMENT_ID")]
    pub deployment_id: Option<String>,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// `owner/repo` that receives error issues.
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub github_repository: Option<String>,

    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub github_api: String,

    #[command(flatten)]
    pub upstreams: Upstreams,
}

/// Base URLs of the data sources. Overridable so the gateway can be pointed
/// at a local stub.
#[derive(Clone, Debug, clap::Args)]
pub struct Upstreams {
    /// Borgun currency XML feed.
    #[arg(long, env = "BORGUN_URL", default_value = "https://www.borgun.is/currency/Default.aspx")]
    pub borgun_url: String,

    /// island.is GraphQL gateway.
    #[arg(long, env = "ISLAND_URL", default_value = "https://island.is/api/graphql")]
    pub island_url: String,

    /// hlaupadagskra.is items query.
    #[arg(
        long,
        env = "RACE_CALENDAR_URL",
        default_value = "https://www.hlaupadagskra.is/_api/cloud-data/v2/items/query"
    )]
    pub race_calendar_url: String,
}

impl Default for Upstreams {
    fn default() -> Self {
        Self {
            borgun_url: "https://www.borgun.is/currency/Default.aspx".to_owned(),
            island_url: "https://island.is/api/graphql".to_owned(),
            race_calendar_url: "https://www.hlaupadagskra.is/_api/cloud-data/v2/items/query".to_owned(),
        }
    }
}

impl Config {
    pub fn reporter_config(&self) -> ReporterConfig {
        ReporterConfig {
            deployment_id: self.deployment_id.clone(),
            token: self.github_token.clone(),
            repository: self.github_repository.clone(),
            api_base: self.github_api.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_feed_reporter_config() {
        let cfg = Config::try_parse_from([
            "apis",
            "--listen", "127.0.0.1:9000",
            "--deployment-id", "dep-1",
            "--github-token", "tok",
            "--github-repository", "acme/apis",
        ])
        .unwrap();

        assert_eq!(cfg.listen, "127.0.0.1:9000".parse().unwrap());
        let rc = cfg.reporter_config();
        assert!(rc.is_enabled());
        assert_eq!(rc.owner_repo(), Some(("acme", "apis")));
    }

    #[test]
    fn rejects_bad_listen_address() {
        assert!(Config::try_parse_from(["apis", "--listen", "not-an-addr"]).is_err());
    }
}
