use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use apis::config::Config;
use apis::{AccessLog, IssueReporter, Router, Server, endpoints};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "apis=info,access=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    tracing::info!(listen = %config.listen, "apis v{} starting", env!("CARGO_PKG_VERSION"));

    let mut router = Router::new()
        .layer(AccessLog::new())
        .with_reporter(IssueReporter::new(&config.reporter_config()));
    endpoints::register(&mut router, &config.upstreams)?;

    Server::bind(config.listen).serve(router).await?;
    Ok(())
}
