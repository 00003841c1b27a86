use crate::error::Result;
use crate::ids::ID_LEN;
use crate::scanner;
use crate::storage::library::{Library, ASSET_DIR_SUFFIX, METADATA_FILE, THUMBNAIL_SUFFIX};
use crate::storage::models::{thumbnail_file_name, REQUIRED_ASSET_KEYS};
use glob::Pattern;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of auditing one asset directory. `valid` is true iff `errors`
/// is empty; warnings never affect it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }
}

/// Check one `<id>.info` directory against the record schema and the files
/// a viewer needs. Only a missing or unparsable `metadata.json` stops the
/// checks early.
pub fn validate_asset_dir(asset_dir: &Path) -> ValidationReport {
    let mut report = ValidationReport::default();

    let meta_path = asset_dir.join(METADATA_FILE);
    let raw = match fs::read(&meta_path) {
        Ok(raw) => raw,
        Err(err) => {
            report.errors.push(format!("missing metadata.json ({})", err));
            return report.finish();
        }
    };
    let meta = match serde_json::from_slice::<Value>(&raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            report.errors.push("metadata.json is not a JSON object".into());
            return report.finish();
        }
        Err(err) => {
            report.errors.push(format!("metadata.json is not valid JSON ({})", err));
            return report.finish();
        }
    };

    for key in REQUIRED_ASSET_KEYS {
        if !meta.contains_key(key) {
            report.errors.push(format!("missing field: {}", key));
        }
    }

    let id = meta.get("id").and_then(Value::as_str).unwrap_or_default();
    if id.chars().count() != ID_LEN {
        report
            .errors
            .push(format!("id length {} != {}", id.chars().count(), ID_LEN));
    }
    let expected_dir = format!("{}{}", id, ASSET_DIR_SUFFIX);
    if asset_dir.file_name().and_then(|n| n.to_str()) != Some(expected_dir.as_str()) {
        report
            .warnings
            .push(format!("directory name does not match {}", expected_dir));
    }

    let name = meta.get("name").and_then(Value::as_str).unwrap_or_default();
    let ext = meta.get("ext").and_then(Value::as_str).unwrap_or("jpg");
    if !is_plain_component(name) || !is_plain_component(ext) {
        report.errors.push(format!(
            "name {:?} / ext {:?} is not a plain file name",
            name, ext
        ));
        return report.finish();
    }
    let image_name = format!("{}.{}", name, ext);
    if !asset_dir.join(&image_name).is_file() {
        report
            .errors
            .push(format!("missing image file {}", image_name));
    }

    // A png whose name ends in `_thumbnail` matches the pattern too.
    let thumbnails: Vec<String> = thumbnail_files(asset_dir)
        .into_iter()
        .filter(|file| *file != image_name)
        .collect();
    if thumbnails.is_empty() {
        report.errors.push("missing thumbnail".into());
    } else if !thumbnails.contains(&thumbnail_file_name(name)) {
        report.warnings.push(format!(
            "thumbnail is not named {}",
            thumbnail_file_name(name)
        ));
    }

    report.finish()
}

/// A single path component that cannot leave the asset directory.
fn is_plain_component(part: &str) -> bool {
    !part.is_empty()
        && part != "."
        && part != ".."
        && !part.contains(&['/', '\\', '\0'][..])
}

fn thumbnail_files(asset_dir: &Path) -> Vec<String> {
    let pattern = match Pattern::new(&format!("*{}", THUMBNAIL_SUFFIX)) {
        Ok(p) => p,
        Err(e) => {
            warn!("Invalid thumbnail pattern: {}", e);
            return Vec::new();
        }
    };
    let Ok(entries) = fs::read_dir(asset_dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| pattern.matches(name))
        .collect()
}

impl Library {
    pub fn validate_asset(&self, asset_id: &str) -> ValidationReport {
        validate_asset_dir(&self.asset_dir(asset_id))
    }

    /// Audit every asset directory in the library, in id order.
    pub fn validate_all(&self) -> Result<Vec<(String, ValidationReport)>> {
        let dirs = scanner::list_asset_dirs(&self.images_dir())?;
        let reports: Vec<_> = dirs
            .into_iter()
            .map(|dir| {
                let report = validate_asset_dir(&dir.path);
                if !report.valid {
                    debug!("{} invalid: {:?}", dir.id, report.errors);
                }
                (dir.id, report)
            })
            .collect();
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_metadata_short_circuits() {
        let tmp = tempfile::tempdir().unwrap();
        let report = validate_asset_dir(tmp.path());
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("missing metadata.json"));
    }

    #[test]
    fn test_bad_json_short_circuits() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(METADATA_FILE), "{ not json").unwrap();
        let report = validate_asset_dir(tmp.path());
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_collects_every_problem() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join(METADATA_FILE),
            r#"{"id": "KSHORT", "name": "a", "ext": "png"}"#,
        )
        .unwrap();
        let report = validate_asset_dir(tmp.path());
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e == "missing field: size"));
        assert!(report.errors.iter().any(|e| e == "id length 6 != 13"));
        assert!(report.errors.iter().any(|e| e == "missing image file a.png"));
        assert!(report.errors.iter().any(|e| e == "missing thumbnail"));
    }

    #[test]
    fn test_primary_png_is_not_taken_for_the_thumbnail() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join(METADATA_FILE),
            r#"{"id": "KAAAAAAAAAAAA", "name": "cover_thumbnail", "ext": "png"}"#,
        )
        .unwrap();
        fs::write(tmp.path().join("cover_thumbnail.png"), b"png").unwrap();

        let report = validate_asset_dir(tmp.path());
        assert!(report.errors.iter().any(|e| e == "missing thumbnail"));
    }

    #[test]
    fn test_names_that_escape_the_asset_dir_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let asset_dir = tmp.path().join("KAAAAAAAAAAAA.info");
        fs::create_dir_all(&asset_dir).unwrap();
        // Files outside the asset dir that a joined "../x" would find.
        fs::write(tmp.path().join("x.jpg"), b"jpg").unwrap();
        fs::write(tmp.path().join("x_thumbnail.png"), b"png").unwrap();
        fs::write(
            asset_dir.join(METADATA_FILE),
            r#"{"id": "KAAAAAAAAAAAA", "name": "../x", "ext": "jpg"}"#,
        )
        .unwrap();

        let report = validate_asset_dir(&asset_dir);
        assert!(!report.valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("is not a plain file name")));
        assert!(!report.errors.iter().any(|e| e.starts_with("missing image file")));

        assert!(is_plain_component("My Art_ Draft _1"));
        assert!(!is_plain_component("a\\b"));
        assert!(!is_plain_component(".."));
        assert!(!is_plain_component(""));
    }
}
