//! Stored record commands.

use console::style;

use crate::config::Settings;
use crate::storage::RecordKind;

use crate::cli::helpers::{open_store, order_line, product_line};

/// List a stored collection.
pub async fn cmd_list(settings: &Settings, kind: RecordKind, json: bool) -> anyhow::Result<()> {
    let store = open_store(settings)?;

    match kind {
        RecordKind::Products => {
            let products = store.products().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&products)?);
                return Ok(());
            }
            for product in &products {
                println!("{}", product_line(product));
            }
            println!("\n{} {} products", style("→").dim(), products.len());
        }
        RecordKind::Orders => {
            let orders = store.orders().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&orders)?);
                return Ok(());
            }
            for order in &orders {
                println!("{}", order_line(order));
            }
            println!("\n{} {} orders", style("→").dim(), orders.len());
        }
    }
    Ok(())
}

/// Delete one collection, or both.
pub async fn cmd_clear(settings: &Settings, kind: Option<RecordKind>) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => vec![RecordKind::Products, RecordKind::Orders],
    };

    for kind in kinds {
        let count = store.count(kind).await?;
        store.clear(kind).await?;
        println!("{} Cleared {} {}", style("✓").green(), count, kind);
    }
    Ok(())
}
