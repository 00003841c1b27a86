use crate::error::Result;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tempfile::Builder;
use tracing::trace;

/// Publish `bytes` at `target` so readers see either the old file or the
/// complete new one, never a partial write.
///
/// The bytes go to a temporary file in the target's own directory (so the
/// final rename stays on one filesystem), are synced, and the temp file is
/// then renamed over `target`. If anything fails before the rename, the
/// temporary file is removed when it drops.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = Builder::new().prefix(".tmp-").tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    set_readable(tmp.as_file())?;
    tmp.persist(target).map_err(|e| e.error)?;

    trace!("Published {} ({} bytes)", target.display(), bytes.len());
    Ok(())
}

pub fn write_json_pretty<T: Serialize>(target: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_atomic(target, &bytes)
}

pub fn write_json_compact<T: Serialize>(target: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    write_atomic(target, &bytes)
}

// Temp files are created 0600; library files are shared with the viewer app.
#[cfg(unix)]
fn set_readable(file: &std::fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_readable(_file: &std::fs::File) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_write_atomic_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("doc.json");
        fs::write(&target, "old").unwrap();

        write_atomic(&target, b"new contents").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new contents");
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_write_atomic_missing_dir_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("doc.json");
        assert!(write_atomic(&target, b"{}").is_err());
        assert!(!target.exists());
    }

    #[test]
    fn test_pretty_json_uses_two_space_indent_and_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("doc.json");
        write_json_pretty(&target, &serde_json::json!({"name": "插图"})).unwrap();
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "{\n  \"name\": \"插图\"\n}"
        );
    }
}
