use super::atomic;
use super::lock::LibraryLock;
use super::models::{LibraryDocument, MtimeIndex};
use crate::config::AppConfig;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const IMAGES_DIR: &str = "images";
pub const ASSET_DIR_SUFFIX: &str = ".info";
pub const METADATA_FILE: &str = "metadata.json";
pub const INDEX_FILE: &str = "mtime.json";
pub const LOCK_FILE: &str = ".ingest.lock";
pub const THUMBNAIL_SUFFIX: &str = "_thumbnail.png";

/// Handle on one library directory. Every operation that touches the
/// library goes through this, so the root is never a global.
pub struct Library {
    config: AppConfig,
}

impl Library {
    pub fn open(config: AppConfig) -> Self {
        Self { config }
    }

    /// Create the library skeleton (images dir, empty folder tree, empty
    /// index) without touching any file that already exists.
    pub fn init(config: AppConfig) -> Result<Self> {
        let library = Self::open(config);
        fs::create_dir_all(library.images_dir())?;

        if !library.folders_file().exists() {
            atomic::write_json_pretty(&library.folders_file(), &LibraryDocument::default())?;
        }
        if !library.index_file().exists() {
            atomic::write_json_compact(&library.index_file(), &MtimeIndex::new())?;
        }

        info!("Library initialized at {}", library.root().display());
        Ok(library)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.library_root
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root().join(IMAGES_DIR)
    }

    pub fn asset_dir(&self, asset_id: &str) -> PathBuf {
        self.images_dir()
            .join(format!("{}{}", asset_id, ASSET_DIR_SUFFIX))
    }

    pub fn asset_metadata_file(&self, asset_id: &str) -> PathBuf {
        self.asset_dir(asset_id).join(METADATA_FILE)
    }

    /// The library-level `metadata.json` holding the folder tree.
    pub fn folders_file(&self) -> PathBuf {
        self.root().join(METADATA_FILE)
    }

    pub fn index_file(&self) -> PathBuf {
        self.root().join(INDEX_FILE)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root().join(LOCK_FILE)
    }

    /// Take the single-writer lock guarding the folder tree and index.
    pub fn lock(&self) -> Result<LibraryLock> {
        LibraryLock::acquire(
            &self.lock_file(),
            Duration::from_millis(self.config.lock_timeout_ms),
        )
    }
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
