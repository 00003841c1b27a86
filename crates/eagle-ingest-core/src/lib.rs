pub mod asset;
pub mod config;
pub mod engine;
pub mod error;
pub mod ids;
pub mod integrity;
pub mod media;
pub mod progress;
pub mod scanner;
pub mod storage;

pub use asset::NewAsset;
pub use config::AppConfig;
pub use engine::{BatchReport, ImportEngine, ImportFailure};
pub use error::{Error, ErrorKind, Result};
pub use integrity::{validate_asset_dir, ValidationReport};
pub use progress::{ProgressReporter, SilentReporter};
pub use storage::{AssetMetadata, Folder, FolderTree, Library};
