use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

use eagle_ingest_core::storage::library::METADATA_FILE;
use eagle_ingest_core::{AppConfig, Error, ErrorKind, Library, NewAsset};
use filetime::FileTime;
use image::{Rgb, RgbImage, Rgba, RgbaImage};

fn make_jpeg(dir: &Path, file_name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(file_name);
    RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
        .save_with_format(&path, image::ImageFormat::Jpeg)
        .unwrap();
    path
}

fn make_rgba_png(dir: &Path, file_name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(file_name);
    RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 90]))
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();
    path
}

fn new_library(root: &Path) -> Library {
    Library::init(AppConfig::new(root.join("Test.library"))).unwrap()
}

#[test]
fn test_import_scenario_from_empty_library() {
    let tmp = tempdir().unwrap();
    let library = new_library(tmp.path());
    let source = make_jpeg(tmp.path(), "download.jpg", 1200, 800);

    let meta = library
        .write_asset(&NewAsset::new(&source, "My Art: Draft #1", "F1"))
        .unwrap();

    assert_eq!(meta.id.len(), 13);
    assert!(meta.id.starts_with('K'));
    assert_eq!(meta.name, "My Art_ Draft _1");
    assert_eq!((meta.width, meta.height), (1200, 800));
    assert_eq!(meta.folders, vec!["F1".to_string()]);
    assert_eq!(meta.ext, "jpg");
    assert_eq!(meta.orientation, 1);
    assert!(!meta.is_deleted);

    let asset_dir = library.asset_dir(&meta.id);
    assert_eq!(
        asset_dir.file_name().unwrap().to_string_lossy(),
        format!("{}.info", meta.id)
    );
    let image_path = asset_dir.join("My Art_ Draft _1.jpg");
    assert!(image_path.is_file());
    assert_eq!(meta.size, fs::metadata(&image_path).unwrap().len());

    let thumb = image::open(asset_dir.join("My Art_ Draft _1_thumbnail.png")).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (240, 160));

    let on_disk: serde_json::Value =
        serde_json::from_slice(&fs::read(asset_dir.join(METADATA_FILE)).unwrap()).unwrap();
    assert_eq!(on_disk["width"], 1200);
    assert_eq!(on_disk["height"], 800);
    assert_eq!(on_disk["folders"], serde_json::json!(["F1"]));
    assert_eq!(on_disk["ext"], "jpg");
    assert_eq!(on_disk["isDeleted"], false);
    assert_eq!(on_disk["modificationTime"], on_disk["lastModified"]);

    let count = library.rebuild_index().unwrap();
    assert_eq!(count, 1);
    let index = library.read_index().unwrap();
    assert_eq!(index.keys().cloned().collect::<Vec<_>>(), vec![meta.id.clone()]);
}

#[test]
fn test_written_asset_validates_clean() {
    let tmp = tempdir().unwrap();
    let library = new_library(tmp.path());
    let source = make_jpeg(tmp.path(), "a.jpeg", 300, 500);

    let mut asset = NewAsset::new(&source, "Portrait", "F1");
    asset.tags = vec!["b".into(), "a".into()];
    asset.star = 4;
    asset.url = "https://example.com/p/1".into();
    asset.annotation = "作者: someone".into();
    let meta = library.write_asset(&asset).unwrap();

    assert_eq!(meta.ext, "jpeg");
    assert_eq!(meta.tags, vec!["b".to_string(), "a".to_string()]);
    assert_eq!(meta.star, 4);

    let report = library.validate_asset(&meta.id);
    assert!(report.valid, "errors: {:?}", report.errors);
    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty());

    let thumb = image::open(library.asset_dir(&meta.id).join("Portrait_thumbnail.png")).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (144, 240));
}

#[test]
fn test_transparent_png_gets_opaque_thumbnail() {
    let tmp = tempdir().unwrap();
    let library = new_library(tmp.path());
    let source = make_rgba_png(tmp.path(), "sprite.PNG", 480, 480);

    let meta = library
        .write_asset(&NewAsset::new(&source, "sprite", "F1"))
        .unwrap();
    assert_eq!(meta.ext, "png");

    let thumb = image::open(library.asset_dir(&meta.id).join("sprite_thumbnail.png")).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (240, 240));
    assert!(!thumb.color().has_alpha());
}

#[test]
fn test_unlisted_extension_falls_back_to_jpg() {
    let tmp = tempdir().unwrap();
    let library = new_library(tmp.path());
    // PNG bytes behind an extension outside the allow-list.
    let source = make_rgba_png(tmp.path(), "scan.png", 64, 32);
    let renamed = tmp.path().join("scan.tiff");
    fs::rename(&source, &renamed).unwrap();

    let meta = library
        .write_asset(&NewAsset::new(&renamed, "scan", "F1"))
        .unwrap();
    assert_eq!(meta.ext, "jpg");
    assert_eq!((meta.width, meta.height), (64, 32));
    assert!(library.asset_dir(&meta.id).join("scan.jpg").is_file());
}

#[test]
fn test_source_mtime_is_preserved() {
    let tmp = tempdir().unwrap();
    let library = new_library(tmp.path());
    let source = make_jpeg(tmp.path(), "old.jpg", 50, 50);
    filetime::set_file_mtime(&source, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();

    let meta = library
        .write_asset(&NewAsset::new(&source, "old", "F1"))
        .unwrap();
    assert_eq!(meta.mtime, 1_600_000_000_000);
    assert!(meta.modification_time > meta.mtime);
}

#[test]
fn test_corrupt_source_is_decode_error_and_stays_invisible() {
    let tmp = tempdir().unwrap();
    let library = new_library(tmp.path());
    let source = tmp.path().join("broken.jpg");
    fs::write(&source, b"this is not an image").unwrap();

    let err = library
        .write_asset(&NewAsset::new(&source, "broken", "F1"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);

    let leftovers: Vec<_> = fs::read_dir(library.images_dir()).unwrap().flatten().collect();
    assert_eq!(leftovers.len(), 1);
    assert!(!leftovers[0].path().join(METADATA_FILE).exists());

    assert_eq!(library.rebuild_index().unwrap(), 0);
}

#[test]
fn test_rejects_bad_input_before_touching_disk() {
    let tmp = tempdir().unwrap();
    let library = new_library(tmp.path());
    let source = make_jpeg(tmp.path(), "a.jpg", 10, 10);

    let mut starred = NewAsset::new(&source, "a", "F1");
    starred.star = 6;
    assert!(matches!(
        library.write_asset(&starred),
        Err(Error::Validation(_))
    ));

    let missing = NewAsset::new(tmp.path().join("nope.jpg"), "a", "F1");
    assert_eq!(library.write_asset(&missing).unwrap_err().kind(), ErrorKind::Io);

    let no_folder = NewAsset::new(&source, "a", " ");
    assert!(matches!(
        library.write_asset(&no_folder),
        Err(Error::Validation(_))
    ));

    assert_eq!(fs::read_dir(library.images_dir()).unwrap().count(), 0);
}

#[test]
fn test_empty_sanitized_name_falls_back_to_id() {
    let tmp = tempdir().unwrap();
    let library = new_library(tmp.path());
    let source = make_jpeg(tmp.path(), "a.jpg", 10, 10);

    let meta = library
        .write_asset(&NewAsset::new(&source, "   ", "F1"))
        .unwrap();
    assert_eq!(meta.name, meta.id);
    assert!(library.validate_asset(&meta.id).valid);
}

#[test]
fn test_soft_delete_keeps_files_and_unknown_keys() {
    let tmp = tempdir().unwrap();
    let library = new_library(tmp.path());
    let source = make_jpeg(tmp.path(), "a.jpg", 20, 20);
    let meta = library
        .write_asset(&NewAsset::new(&source, "keep", "F1"))
        .unwrap();

    // Another tool adds a field we do not model.
    let meta_path = library.asset_metadata_file(&meta.id);
    let mut raw: serde_json::Value = serde_json::from_slice(&fs::read(&meta_path).unwrap()).unwrap();
    raw["noThumbnail"] = serde_json::Value::Bool(false);
    fs::write(&meta_path, serde_json::to_vec_pretty(&raw).unwrap()).unwrap();

    let deleted = library.soft_delete(&meta.id).unwrap();
    assert!(deleted.is_deleted);

    let reread = library.read_asset(&meta.id).unwrap();
    assert!(reread.is_deleted);
    assert_eq!(reread.extra.get("noThumbnail"), Some(&serde_json::Value::Bool(false)));
    assert!(library.asset_dir(&meta.id).join("keep.jpg").is_file());

    assert!(matches!(
        library.soft_delete("KAAAAAAAAAAAA"),
        Err(Error::AssetNotFound(_))
    ));
}

#[test]
fn test_zero_thumbnail_size_is_rejected_before_writing() {
    let tmp = tempdir().unwrap();
    let mut config = AppConfig::new(tmp.path().join("Zero.library"));
    config.thumbnail_size = 0;
    let library = Library::init(config).unwrap();
    let source = make_jpeg(tmp.path(), "a.jpg", 40, 30);

    let err = library
        .write_asset(&NewAsset::new(&source, "a", "F1"))
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(fs::read_dir(library.images_dir()).unwrap().count(), 0);
}

#[test]
fn test_missing_thumbnail_is_caught_when_name_ends_in_thumbnail() {
    let tmp = tempdir().unwrap();
    let library = new_library(tmp.path());
    let source = make_rgba_png(tmp.path(), "a.png", 30, 30);

    let meta = library
        .write_asset(&NewAsset::new(&source, "cover_thumbnail", "F1"))
        .unwrap();
    let asset_dir = library.asset_dir(&meta.id);
    assert!(asset_dir.join("cover_thumbnail.png").is_file());
    fs::remove_file(asset_dir.join("cover_thumbnail_thumbnail.png")).unwrap();

    let report = library.validate_asset(&meta.id);
    assert!(!report.valid);
    assert!(report.errors.iter().any(|e| e == "missing thumbnail"));
}
