//! Export and import commands.

use std::path::{Path, PathBuf};

use console::style;

use crate::config::Settings;
use crate::export::{ExportFormat, Exporter};
use crate::storage::RecordKind;

use crate::cli::helpers::open_store;

/// Export a collection, then clear it.
pub async fn cmd_export(
    settings: &Settings,
    kind: RecordKind,
    format: ExportFormat,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let out_dir = out.unwrap_or_else(|| settings.export_dir.clone());

    let report = Exporter::new(store).export(kind, format, &out_dir).await?;
    println!(
        "{} Exported {} {} to {}",
        style("✓").green(),
        report.count,
        kind,
        report.path.display()
    );
    if !report.cleared {
        println!(
            "{} The store could not be cleared; records are still stored",
            style("!").yellow()
        );
    }
    Ok(())
}

/// Restore a JSON export into the store.
pub async fn cmd_import(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let report = Exporter::new(store).import(file).await?;
    println!(
        "{} Imported {} {} ({} replaced existing records)",
        style("✓").green(),
        report.imported,
        report.kind,
        report.replaced
    );
    Ok(())
}
