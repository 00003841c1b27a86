use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Folder {0} not found")]
    FolderNotFound(String),

    #[error("Asset {0} not found")]
    AssetNotFound(String),

    #[error("Folder id {0} appears more than once in the folder tree")]
    DuplicateFolderId(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Library is locked by another writer ({})", .0.display())]
    Locked(PathBuf),

    #[error("Could not allocate a unique {kind} id after {attempts} attempts")]
    IdExhausted { kind: &'static str, attempts: u32 },
}

/// Coarse failure category, used by batch callers to decide whether to
/// continue and by the CLI to summarize failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Decode,
    Io,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) | Error::DuplicateFolderId(_) | Error::IdExhausted { .. } => {
                ErrorKind::Validation
            }
            Error::FolderNotFound(_) | Error::AssetNotFound(_) => ErrorKind::NotFound,
            Error::Decode(image::ImageError::IoError(_)) => ErrorKind::Io,
            Error::Decode(_) => ErrorKind::Decode,
            Error::Io(_) | Error::Json(_) | Error::Locked(_) => ErrorKind::Io,
            Error::Config(_) => ErrorKind::Config,
        }
    }
}
