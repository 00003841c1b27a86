use super::sanitize::{sanitize_filename, stored_extension};
use crate::error::{Error, Result};
use crate::ids;
use crate::media::{read_orientation, write_thumbnail};
use crate::storage::atomic;
use crate::storage::library::{now_ms, Library, METADATA_FILE};
use crate::storage::models::{thumbnail_file_name, AssetMetadata};
use filetime::FileTime;
use image::ImageReader;
use serde_json::Map;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

pub const MAX_STAR: u8 = 5;

/// Everything a collaborator hands over for one image.
#[derive(Debug, Clone, Default)]
pub struct NewAsset {
    /// Image already on local storage; copied, never moved.
    pub source: PathBuf,
    /// Display name, sanitized before use.
    pub name: String,
    pub folder_id: String,
    pub url: String,
    pub annotation: String,
    pub tags: Vec<String>,
    /// 0 = unrated, otherwise 1..=5.
    pub star: u8,
}

impl NewAsset {
    pub fn new(source: impl Into<PathBuf>, name: &str, folder_id: &str) -> Self {
        Self {
            source: source.into(),
            name: name.to_string(),
            folder_id: folder_id.to_string(),
            ..Default::default()
        }
    }

    fn check(&self) -> Result<()> {
        if self.star > MAX_STAR {
            return Err(Error::Validation(format!(
                "star rating {} is outside 0..={}",
                self.star, MAX_STAR
            )));
        }
        if self.folder_id.trim().is_empty() {
            return Err(Error::Validation("destination folder id is empty".into()));
        }
        if !self.source.is_file() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("source image {} not found", self.source.display()),
            )));
        }
        Ok(())
    }
}

impl Library {
    /// Create one asset record on disk and return its metadata.
    ///
    /// Files land in a freshly claimed `images/<id>.info` directory; the
    /// `metadata.json` is published last and atomically, so a failure at any
    /// earlier step leaves only a metadata-less directory that readers ignore.
    pub fn write_asset(&self, asset: &NewAsset) -> Result<AssetMetadata> {
        self.write_asset_with(asset, ids::new_asset_id)
    }

    pub(crate) fn write_asset_with<G>(&self, asset: &NewAsset, generate: G) -> Result<AssetMetadata>
    where
        G: FnMut() -> String,
    {
        self.config().validate()?;
        asset.check()?;

        let (asset_id, asset_dir) = self.claim_asset_dir(generate)?;

        let source_name = asset
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = stored_extension(&source_name);
        let mut name = sanitize_filename(&asset.name, self.config().name_max_len);
        if name.is_empty() {
            debug!("Name {:?} sanitized to nothing, using {}", asset.name, asset_id);
            name = asset_id.clone();
        }

        let image_path = asset_dir.join(format!("{}.{}", name, ext));
        copy_preserving_mtime(&asset.source, &image_path)?;

        let thumb_path = asset_dir.join(thumbnail_file_name(&name));
        write_thumbnail(&image_path, &thumb_path, self.config().thumbnail_size)?;

        let (width, height) = ImageReader::open(&image_path)?
            .with_guessed_format()?
            .into_dimensions()?;
        let orientation = read_orientation(&image_path);

        let stat = fs::metadata(&image_path)?;
        let mtime = system_time_ms(stat.modified()?);
        let btime = match stat.created() {
            Ok(created) => system_time_ms(created),
            Err(_) => mtime,
        };
        let now = now_ms();

        let metadata = AssetMetadata {
            id: asset_id,
            name,
            size: stat.len(),
            btime,
            mtime,
            ext: ext.to_string(),
            width,
            height,
            orientation,
            modification_time: now,
            last_modified: now,
            folders: vec![asset.folder_id.clone()],
            tags: asset.tags.clone(),
            is_deleted: false,
            url: asset.url.clone(),
            annotation: asset.annotation.clone(),
            palettes: Vec::new(),
            star: asset.star,
            extra: Map::new(),
        };

        atomic::write_json_pretty(&asset_dir.join(METADATA_FILE), &metadata)?;

        info!(
            "Wrote asset {} '{}' ({}x{}, {} bytes) into folder {}",
            metadata.id, metadata.name, width, height, metadata.size, asset.folder_id
        );
        Ok(metadata)
    }

    pub fn read_asset(&self, asset_id: &str) -> Result<AssetMetadata> {
        match fs::read(self.asset_metadata_file(asset_id)) {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(Error::AssetNotFound(asset_id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Replace an existing record as a whole, bumping `lastModified`.
    pub fn rewrite_asset(&self, metadata: &AssetMetadata) -> Result<AssetMetadata> {
        let meta_path = self.asset_metadata_file(&metadata.id);
        if !meta_path.is_file() {
            return Err(Error::AssetNotFound(metadata.id.clone()));
        }
        let mut updated = metadata.clone();
        updated.last_modified = now_ms();
        atomic::write_json_pretty(&meta_path, &updated)?;
        debug!("Rewrote metadata for {}", updated.id);
        Ok(updated)
    }

    /// Flag an asset as deleted. Its files stay where they are.
    pub fn soft_delete(&self, asset_id: &str) -> Result<AssetMetadata> {
        let mut metadata = self.read_asset(asset_id)?;
        if metadata.is_deleted {
            return Ok(metadata);
        }
        metadata.is_deleted = true;
        let updated = self.rewrite_asset(&metadata)?;
        info!("Soft-deleted asset {}", asset_id);
        Ok(updated)
    }

    /// Pick an id whose directory does not exist yet and create that
    /// directory exclusively, so two writers can never share one.
    fn claim_asset_dir<G>(&self, generate: G) -> Result<(String, PathBuf)>
    where
        G: FnMut() -> String,
    {
        fs::create_dir_all(self.images_dir())?;

        let mut claimed = None;
        let id = ids::allocate_unique(
            "asset",
            self.config().id_max_attempts,
            generate,
            |candidate| {
                let dir = self.asset_dir(candidate);
                match fs::create_dir(&dir) {
                    Ok(()) => {
                        claimed = Some(Ok(dir));
                        false
                    }
                    Err(err) if err.kind() == io::ErrorKind::AlreadyExists => true,
                    Err(err) => {
                        // Stop retrying; the error is surfaced below.
                        claimed = Some(Err(err));
                        false
                    }
                }
            },
        )?;

        match claimed {
            Some(Ok(dir)) => Ok((id, dir)),
            Some(Err(err)) => Err(err.into()),
            None => Err(Error::IdExhausted {
                kind: "asset",
                attempts: self.config().id_max_attempts,
            }),
        }
    }
}

/// Copy `source` to `dest` and carry the source modification time over.
/// A platform that refuses the timestamp only costs the original mtime.
fn copy_preserving_mtime(source: &Path, dest: &Path) -> io::Result<()> {
    let source_meta = fs::metadata(source)?;
    fs::copy(source, dest)?;
    let mtime = FileTime::from_last_modification_time(&source_meta);
    if let Err(err) = filetime::set_file_mtime(dest, mtime) {
        warn!("Could not preserve mtime on {}: {}", dest.display(), err);
    }
    Ok(())
}

fn system_time_ms(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
