use super::atomic;
use super::library::{Library, METADATA_FILE};
use super::models::MtimeIndex;
use crate::error::Result;
use crate::scanner::{self, AssetDir};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::{Instant, UNIX_EPOCH};
use tracing::{debug, info};

impl Library {
    /// Recompute `mtime.json` from the asset directories on disk and return
    /// the number of entries written.
    ///
    /// Directories without a readable `metadata.json` are treated as
    /// unfinished writes and left out. Keys are written sorted, so two
    /// rebuilds with no change in between produce identical files.
    pub fn rebuild_index(&self) -> Result<usize> {
        let _lock = self.lock()?;
        let start = Instant::now();

        let dirs = scanner::list_asset_dirs(&self.images_dir())?;
        let index: MtimeIndex = dirs
            .par_iter()
            .filter_map(index_entry)
            .collect();

        atomic::write_json_compact(&self.index_file(), &index)?;

        info!(
            "Rebuilt index: {} of {} asset directories in {:.2}s",
            index.len(),
            dirs.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(index.len())
    }

    /// Current contents of `mtime.json`; a library that never had its index
    /// built reads as empty.
    pub fn read_index(&self) -> Result<MtimeIndex> {
        match fs::read(self.index_file()) {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(MtimeIndex::new()),
            Err(err) => Err(err.into()),
        }
    }
}

fn index_entry(dir: &AssetDir) -> Option<(String, i64)> {
    let meta_path = dir.path.join(METADATA_FILE);
    match metadata_mtime_ms(&meta_path) {
        Ok(mtime) => Some((dir.id.clone(), mtime)),
        Err(err) => {
            debug!("Skipping {}: {}", dir.path.display(), err);
            None
        }
    }
}

fn metadata_mtime_ms(meta_path: &Path) -> io::Result<i64> {
    // Opening proves readability, not just existence.
    let file = File::open(meta_path)?;
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        return Err(io::Error::new(io::ErrorKind::Other, "metadata.json is not a file"));
    }
    let modified = metadata.modified()?;
    let since_epoch = modified
        .duration_since(UNIX_EPOCH)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    Ok(i64::try_from(since_epoch.as_millis()).unwrap_or(i64::MAX))
}
