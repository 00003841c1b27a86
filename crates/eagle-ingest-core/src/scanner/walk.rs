use crate::ids;
use crate::storage::library::ASSET_DIR_SUFFIX;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// An `<asset-id>.info` directory found under the images root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDir {
    pub id: String,
    pub path: PathBuf,
}

/// List the asset directories directly under `images_dir`, sorted by id.
/// Entries whose name does not follow the asset id pattern are ignored.
/// A missing images directory is an empty library, not an error.
pub fn list_asset_dirs(images_dir: &Path) -> io::Result<Vec<AssetDir>> {
    let entries = match fs::read_dir(images_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(io::Error::new(
                err.kind(),
                format!("Error reading directory {}: {}", images_dir.display(), err),
            ))
        }
    };

    let mut dirs = Vec::new();
    for entry_result in entries {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                error!(
                    "Error reading entry in directory {}: {}",
                    images_dir.display(),
                    err
                );
                continue;
            }
        };

        let file_name = entry.file_name();
        let Some(id) = file_name
            .to_str()
            .and_then(|name| name.strip_suffix(ASSET_DIR_SUFFIX))
            .filter(|id| ids::is_asset_id(id))
        else {
            debug!("Skipping non-asset entry {:?}", file_name);
            continue;
        };

        let path = entry.path();
        if path.is_dir() {
            dirs.push(AssetDir {
                id: id.to_string(),
                path,
            });
        }
    }

    dirs.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(dirs)
}
