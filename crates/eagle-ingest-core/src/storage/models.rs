use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Keys every asset `metadata.json` must carry.
pub const REQUIRED_ASSET_KEYS: [&str; 18] = [
    "id",
    "name",
    "size",
    "btime",
    "mtime",
    "ext",
    "width",
    "height",
    "orientation",
    "modificationTime",
    "lastModified",
    "folders",
    "tags",
    "isDeleted",
    "url",
    "annotation",
    "palettes",
    "star",
];

/// One imported image, as stored in `images/<id>.info/metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetadata {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub btime: i64,
    pub mtime: i64,
    pub ext: String,
    pub width: u32,
    pub height: u32,
    pub orientation: u32,
    pub modification_time: i64,
    pub last_modified: i64,
    pub folders: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub annotation: String,
    #[serde(default)]
    pub palettes: Vec<Value>,
    #[serde(default)]
    pub star: u8,
    /// Keys written by other tools, kept across rewrites.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AssetMetadata {
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.ext)
    }

    pub fn thumbnail_name(&self) -> String {
        thumbnail_file_name(&self.name)
    }
}

pub fn thumbnail_file_name(stem: &str) -> String {
    format!("{}{}", stem, super::library::THUMBNAIL_SUFFIX)
}

/// A node of the folder tree in the library `metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub children: Vec<Folder>,
    #[serde(default)]
    pub modification_time: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_tips: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Folder {
    pub fn new(id: String, name: &str, description: &str, modification_time: i64) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: description.to_string(),
            children: Vec::new(),
            modification_time,
            tags: Vec::new(),
            password: String::new(),
            password_tips: String::new(),
            extra: Map::new(),
        }
    }
}

/// The library-level `metadata.json`. Only `folders` is interpreted; every
/// other key (smart folders, tag groups, ...) is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryDocument {
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `mtime.json`: asset id -> metadata file mtime in ms. Sorted for
/// reproducible output.
pub type MtimeIndex = BTreeMap<String, i64>;
