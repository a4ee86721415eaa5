//! Export and import of stored records.
//!
//! An export writes the whole collection to a file in the output directory
//! (temp file, then atomic rename) and only clears the store once the file
//! is in place.

pub mod csv;
pub mod json;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::storage::{RecordKind, RecordStore, StoreError};
use json::Archive;

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no {0} to export")]
    Empty(RecordKind),
    #[error("{format} export is not supported for {kind}")]
    Unsupported {
        kind: RecordKind,
        format: ExportFormat,
    },
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What an export produced.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub path: PathBuf,
    pub count: usize,
    /// Whether the collection was cleared after writing.
    pub cleared: bool,
}

/// What an import restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub kind: RecordKind,
    pub imported: usize,
    pub replaced: usize,
}

/// File name for an export taken now.
pub fn export_file_name(kind: RecordKind, format: ExportFormat) -> String {
    format!(
        "scraped-{}-{}.{}",
        kind.as_str(),
        Utc::now().format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

pub struct Exporter {
    store: Arc<RecordStore>,
}

impl Exporter {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Write a collection to `out_dir` and clear it from the store.
    ///
    /// Fails without writing or clearing anything when the collection is
    /// empty or the format is not available for it.
    pub async fn export(
        &self,
        kind: RecordKind,
        format: ExportFormat,
        out_dir: &Path,
    ) -> Result<ExportReport, ExportError> {
        let (bytes, count) = match (kind, format) {
            (RecordKind::Products, ExportFormat::Csv) => {
                return Err(ExportError::Unsupported { kind, format })
            }
            (RecordKind::Products, ExportFormat::Json) => {
                let products = self.store.products().await?;
                let count = products.len();
                if count == 0 {
                    return Err(ExportError::Empty(kind));
                }
                (json::render_products(products)?, count)
            }
            (RecordKind::Orders, format) => {
                let orders = self.store.orders().await?;
                let count = orders.len();
                if count == 0 {
                    return Err(ExportError::Empty(kind));
                }
                let bytes = match format {
                    ExportFormat::Json => json::render_orders(orders)?,
                    ExportFormat::Csv => csv::render_orders(&orders)?,
                };
                (bytes, count)
            }
        };

        let path = out_dir.join(export_file_name(kind, format));
        write_atomically(&path, &bytes)?;
        info!("Exported {} {} to {}", count, kind, path.display());

        let cleared = match self.store.clear(kind).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Export written but clearing {} failed: {}", kind, e);
                false
            }
        };

        Ok(ExportReport {
            path,
            count,
            cleared,
        })
    }

    /// Restore a JSON archive, upserting every record.
    pub async fn import(&self, path: &Path) -> Result<ImportReport, ExportError> {
        let bytes = std::fs::read(path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let report = match json::parse_archive(&bytes)? {
            Archive::Products(archive) => {
                let mut report = ImportReport {
                    kind: RecordKind::Products,
                    imported: 0,
                    replaced: 0,
                };
                for product in &archive.products {
                    let saved = self.store.save_product(product).await?;
                    report.imported += 1;
                    report.replaced += usize::from(saved.replaced);
                }
                report
            }
            Archive::Orders(archive) => {
                let mut report = ImportReport {
                    kind: RecordKind::Orders,
                    imported: 0,
                    replaced: 0,
                };
                for order in &archive.orders {
                    let saved = self.store.save_order(order).await?;
                    report.imported += 1;
                    report.replaced += usize::from(saved.replaced);
                }
                report
            }
        };
        info!(
            "Imported {} {} from {} ({} replaced)",
            report.imported,
            report.kind,
            path.display(),
            report.replaced
        );
        Ok(report)
    }
}

/// Write to a temp file beside `path`, then rename over it.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let io_error = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(io_error)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_error)?;
    tmp.write_all(bytes).map_err(io_error)?;
    tmp.as_file().sync_all().map_err(io_error)?;
    tmp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}
