//! Single page scrape commands.

use console::style;

use crate::config::Settings;
use crate::models::Site;
use crate::validation::{prepare, prepare_order};

use crate::cli::helpers::{build_scraper, open_store, print_reasons};

/// Scrape one product page and save it.
pub async fn cmd_scrape(
    settings: &Settings,
    target: &str,
    site: Option<Site>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let scraper = build_scraper(settings)?;
    let (record, validation) = prepare(scraper.scrape_product(target, site).await?);

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&record)?);
        if !validation.valid {
            print_reasons("Record", &validation.reasons);
        }
        return Ok(());
    }

    if !validation.valid {
        print_reasons(&record.label(), &validation.reasons);
        return Ok(());
    }

    let store = open_store(settings)?;
    let saved = store.save_product(&record).await?;
    println!(
        "{} {} {} [{}] ({} store, {} total)",
        style("✓").green(),
        if saved.replaced { "Updated" } else { "Saved" },
        record.label(),
        record.source,
        saved.tier,
        saved.total
    );
    Ok(())
}

/// Scrape one seller order page and save it.
pub async fn cmd_order(settings: &Settings, target: &str, dry_run: bool) -> anyhow::Result<()> {
    let scraper = build_scraper(settings)?;
    let (order, validation) = prepare_order(scraper.scrape_order(target).await?);

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&order)?);
        if !validation.valid {
            print_reasons("Order", &validation.reasons);
        }
        return Ok(());
    }

    if !validation.valid {
        print_reasons("Order", &validation.reasons);
        return Ok(());
    }

    let store = open_store(settings)?;
    let saved = store.save_order(&order).await?;
    println!(
        "{} {} order {} ({} store, {} total)",
        style("✓").green(),
        if saved.replaced { "Updated" } else { "Saved" },
        order.order_id.as_deref().unwrap_or("-"),
        saved.tier,
        saved.total
    );
    Ok(())
}
