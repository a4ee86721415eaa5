//! cartscrape - product and order page scraping with local archiving.

use cartscrape::cli;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logs go to stderr so `list --json` and `message` output stay parseable.
/// `RUST_LOG` wins over `-v`.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "cartscrape=info" } else { "cartscrape=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env may supply CARTSCRAPE_* overrides
    let _ = dotenvy::dotenv();
    init_logging(cli::is_verbose());

    cli::run().await
}
