use exif::{In, Reader, Tag};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, warn};

pub const DEFAULT_ORIENTATION: u32 = 1;

/// EXIF orientation (tag 274) of the image at `path`.
///
/// A missing tag, or a container that carries no EXIF block at all, yields
/// [`DEFAULT_ORIENTATION`] quietly. Anything else that stops the read is
/// logged at warn level and also yields the default.
pub fn read_orientation(path: &Path) -> u32 {
    match try_read_orientation(path) {
        Ok(Some(value)) => value,
        Ok(None) => {
            debug!("No EXIF orientation in {}, using 1", path.display());
            DEFAULT_ORIENTATION
        }
        Err(exif::Error::NotFound(_)) | Err(exif::Error::NotSupported(_)) => {
            debug!("No EXIF data in {}, using orientation 1", path.display());
            DEFAULT_ORIENTATION
        }
        Err(err) => {
            warn!(
                "Unreadable EXIF in {}: {}; using orientation 1",
                path.display(),
                err
            );
            DEFAULT_ORIENTATION
        }
    }
}

fn try_read_orientation(path: &Path) -> Result<Option<u32>, exif::Error> {
    let file = File::open(path)?;
    let exif = Reader::new().read_from_container(&mut BufReader::new(file))?;
    Ok(exif
        .get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .filter(|value| (1..=8).contains(value)))
}
