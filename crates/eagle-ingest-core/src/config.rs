use crate::error::{Error, Result};
use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_THUMBNAIL_SIZE: u32 = 240;
pub const DEFAULT_NAME_MAX_LEN: usize = 80;
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_ID_MAX_ATTEMPTS: u32 = 16;

/// A human name mapped to an existing folder id, e.g. `Pixiv -> KMTBCL1D9MF66`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamedFolder {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub library_root: PathBuf,
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,
    #[serde(default = "default_name_max_len")]
    pub name_max_len: usize,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    #[serde(default = "default_id_max_attempts")]
    pub id_max_attempts: u32,
    #[serde(default)]
    pub folders: Vec<NamedFolder>,
}

fn default_thumbnail_size() -> u32 {
    DEFAULT_THUMBNAIL_SIZE
}

fn default_name_max_len() -> usize {
    DEFAULT_NAME_MAX_LEN
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

fn default_id_max_attempts() -> u32 {
    DEFAULT_ID_MAX_ATTEMPTS
}

impl AppConfig {
    /// Config for a library at `root` with every other setting at its default.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            library_root: root.into(),
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            name_max_len: DEFAULT_NAME_MAX_LEN,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            id_max_attempts: DEFAULT_ID_MAX_ATTEMPTS,
            folders: Vec::new(),
        }
    }

    pub fn with_folder(mut self, name: &str, id: &str) -> Self {
        self.folders.push(NamedFolder {
            name: name.to_string(),
            id: id.to_string(),
        });
        self
    }

    /// Reject settings no library operation can work with.
    pub fn validate(&self) -> Result<()> {
        if self.thumbnail_size == 0 {
            return Err(Error::Validation("thumbnail_size must be at least 1".into()));
        }
        if self.name_max_len == 0 {
            return Err(Error::Validation("name_max_len must be at least 1".into()));
        }
        if self.id_max_attempts == 0 {
            return Err(Error::Validation("id_max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    /// Look up a folder id in the named-folder table. Names compare exactly.
    pub fn folder_id(&self, name: &str) -> Option<&str> {
        self.folders
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.id.as_str())
    }
}

/// Layered load: optional `Config.toml` (or the file named by
/// `EAGLE_INGEST_CONFIG`), then `EAGLE_INGEST_*` environment variables.
pub fn load_configuration() -> Result<AppConfig> {
    let file_name = env::var("EAGLE_INGEST_CONFIG").unwrap_or_else(|_| "Config".to_string());

    let builder = Config::builder()
        .add_source(ConfigFile::with_name(&file_name).required(false))
        .add_source(Environment::with_prefix("EAGLE_INGEST").try_parsing(true))
        .build()?;
    let config = builder.try_deserialize::<AppConfig>()?;
    config.validate()?;
    Ok(config)
}
