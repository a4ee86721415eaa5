//! Command-line interface.
//!
//! Parses arguments, resolves settings and dispatches to the command
//! modules under `commands`.

mod commands;
mod helpers;
mod progress;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::export::ExportFormat;
use crate::models::Site;
use crate::storage::RecordKind;

#[derive(Parser)]
#[command(name = "cartscrape")]
#[command(about = "Scrape product and order pages into a local archive")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true, env = "CARTSCRAPE_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory (overrides config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a single product page (URL or saved HTML file) and save it
    Scrape {
        /// Product page URL or path to a saved page
        target: String,
        /// Site to use instead of detecting it from the URL
        #[arg(short, long, value_enum)]
        site: Option<Site>,
        /// Print the record as JSON instead of saving it
        #[arg(long)]
        dry_run: bool,
    },

    /// Scrape every product listed on a search or category page
    Bulk {
        /// Listing page URL or path to a saved page
        listing: String,
        /// Site to use instead of detecting it from the URL
        #[arg(short, long, value_enum)]
        site: Option<Site>,
        /// Skip items whose listed price is below this
        #[arg(long)]
        min_price: Option<f64>,
        /// Skip items whose listed price is above this
        #[arg(long)]
        max_price: Option<f64>,
        /// Process at most this many items
        #[arg(short, long)]
        limit: Option<usize>,
        /// Items fetched concurrently per chunk (default from config)
        #[arg(short, long)]
        batch_size: Option<usize>,
        /// Minimum delay between chunk starts in milliseconds (default from config)
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Scrape an eBay seller order page and save it
    Order {
        /// Order details URL or path to a saved page
        target: String,
        /// Print the record as JSON instead of saving it
        #[arg(long)]
        dry_run: bool,
    },

    /// List stored records
    List {
        /// Which collection to list
        #[arg(value_enum, default_value = "products")]
        kind: RecordKind,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a collection to a file, then clear it from the store
    Export {
        /// Which collection to export
        #[arg(value_enum)]
        kind: RecordKind,
        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,
        /// Output directory (default: <data_dir>/exports)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Restore records from a JSON export
    Import {
        /// Exported JSON file
        file: PathBuf,
    },

    /// Delete stored records
    Clear {
        /// Collection to clear (default: both)
        #[arg(value_enum)]
        kind: Option<RecordKind>,
    },

    /// Answer one JSON request, e.g. '{"action":"scrapeProduct","url":"..."}'
    Message {
        /// Request JSON, or "-" to read it from stdin
        request: String,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).await?;
    let mut settings = config.into_settings()?;
    if let Some(dir) = cli.data_dir {
        settings.set_data_dir(dir);
    }

    match cli.command {
        Commands::Scrape {
            target,
            site,
            dry_run,
        } => commands::scrape::cmd_scrape(&settings, &target, site, dry_run).await,
        Commands::Bulk {
            listing,
            site,
            min_price,
            max_price,
            limit,
            batch_size,
            delay_ms,
        } => {
            commands::bulk::cmd_bulk(
                settings,
                &listing,
                site,
                commands::bulk::BulkOptions {
                    min_price,
                    max_price,
                    limit,
                    batch_size,
                    delay_ms,
                },
            )
            .await
        }
        Commands::Order { target, dry_run } => {
            commands::scrape::cmd_order(&settings, &target, dry_run).await
        }
        Commands::List { kind, json } => commands::records::cmd_list(&settings, kind, json).await,
        Commands::Export { kind, format, out } => {
            commands::export::cmd_export(&settings, kind, format, out).await
        }
        Commands::Import { file } => commands::export::cmd_import(&settings, &file).await,
        Commands::Clear { kind } => commands::records::cmd_clear(&settings, kind).await,
        Commands::Message { request } => commands::message::cmd_message(&settings, &request).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bulk_flags() {
        let cli = Cli::try_parse_from([
            "cartscrape",
            "bulk",
            "https://www.amazon.com/s?k=tea",
            "--min-price",
            "5",
            "--max-price",
            "50",
            "--limit",
            "10",
            "--batch-size",
            "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Bulk {
                min_price,
                max_price,
                limit,
                batch_size,
                ..
            } => {
                assert_eq!(min_price, Some(5.0));
                assert_eq!(max_price, Some(50.0));
                assert_eq!(limit, Some(10));
                assert_eq!(batch_size, Some(2));
            }
            _ => panic!("expected bulk"),
        }
    }

    #[test]
    fn test_parse_export_defaults_to_json() {
        let cli = Cli::try_parse_from(["cartscrape", "export", "orders"]).unwrap();
        match cli.command {
            Commands::Export { kind, format, out } => {
                assert_eq!(kind, RecordKind::Orders);
                assert_eq!(format, ExportFormat::Json);
                assert!(out.is_none());
            }
            _ => panic!("expected export"),
        }
    }
}
