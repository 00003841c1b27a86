use crate::asset::NewAsset;
use crate::error::{Error, ErrorKind, Result};
use crate::progress::ProgressReporter;
use crate::storage::{AssetMetadata, Library};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// One image that could not be imported.
#[derive(Debug)]
pub struct ImportFailure {
    pub source: PathBuf,
    pub name: String,
    pub error: Error,
}

impl ImportFailure {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// Result of a batch import: per-asset successes and failures, plus the
/// size of the rebuilt index.
#[derive(Debug)]
pub struct BatchReport {
    pub imported: Vec<AssetMetadata>,
    pub failed: Vec<ImportFailure>,
    pub index_entries: usize,
    pub import_duration: Duration,
    pub index_duration: Duration,
}

impl BatchReport {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs the import flow: write every asset (collecting per-asset failures),
/// then rebuild the index once.
pub struct ImportEngine<'a> {
    library: &'a Library,
}

impl<'a> ImportEngine<'a> {
    pub fn new(library: &'a Library) -> Self {
        Self { library }
    }

    /// Import `assets` in order. A failing asset never stops the batch; an
    /// index rebuild failure does, since it concerns the whole library.
    pub fn import_batch(
        &self,
        assets: &[NewAsset],
        reporter: &dyn ProgressReporter,
    ) -> Result<BatchReport> {
        let total = assets.len();
        info!("Importing {} images into {}", total, self.library.root().display());
        reporter.on_import_start(total);

        let import_start = Instant::now();
        let mut imported = Vec::new();
        let mut failed = Vec::new();

        for (i, asset) in assets.iter().enumerate() {
            match self.library.write_asset(asset) {
                Ok(metadata) => {
                    reporter.on_asset_imported(i + 1, total, &metadata.name);
                    imported.push(metadata);
                }
                Err(err) => {
                    let source = asset.source.display().to_string();
                    error!("Failed to import {}: {}", source, err);
                    reporter.on_asset_failed(i + 1, total, &source, &err.to_string());
                    failed.push(ImportFailure {
                        source: asset.source.clone(),
                        name: asset.name.clone(),
                        error: err,
                    });
                }
            }
        }
        let import_duration = import_start.elapsed();
        reporter.on_import_complete(imported.len(), failed.len(), import_duration.as_secs_f64());

        reporter.on_index_start();
        let index_start = Instant::now();
        let index_entries = self.library.rebuild_index()?;
        let index_duration = index_start.elapsed();
        reporter.on_index_complete(index_entries, index_duration.as_secs_f64());

        info!(
            "Import finished: {} imported, {} failed, index has {} entries",
            imported.len(),
            failed.len(),
            index_entries
        );

        Ok(BatchReport {
            imported,
            failed,
            index_entries,
            import_duration,
            index_duration,
        })
    }
}
