use super::atomic;
use super::library::{now_ms, Library};
use super::models::{Folder, LibraryDocument};
use crate::error::{Error, Result};
use crate::ids;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The whole folder tree, loaded from the library `metadata.json`.
/// Mutations happen in memory and are persisted by rewriting the whole
/// document.
#[derive(Debug, Clone)]
pub struct FolderTree {
    path: PathBuf,
    document: LibraryDocument,
}

impl FolderTree {
    /// Load and check the tree. A folder id used twice anywhere in the tree
    /// is rejected, so id lookups are never ambiguous.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path)?;
        let document: LibraryDocument = serde_json::from_slice(&raw)?;

        let mut seen = HashSet::new();
        let mut duplicate = None;
        walk_folders(&document.folders, 0, &mut |folder: &Folder, _: usize| {
            if duplicate.is_none() && !seen.insert(folder.id.clone()) {
                duplicate = Some(folder.id.clone());
            }
        });
        if let Some(id) = duplicate {
            return Err(Error::DuplicateFolderId(id));
        }

        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    pub fn document(&self) -> &LibraryDocument {
        &self.document
    }

    pub fn roots(&self) -> &[Folder] {
        &self.document.folders
    }

    pub fn find(&self, id: &str) -> Option<&Folder> {
        find_in(&self.document.folders, id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn ids(&self) -> HashSet<String> {
        let mut ids = HashSet::new();
        self.walk(|folder, _| {
            ids.insert(folder.id.clone());
        });
        ids
    }

    /// Direct child of `parent_id` with the given display name.
    pub fn find_child_by_name(&self, parent_id: &str, name: &str) -> Option<&Folder> {
        self.find(parent_id)?
            .children
            .iter()
            .find(|child| child.name == name)
    }

    /// Depth-first, pre-order visit of every folder with its depth.
    pub fn walk<F: FnMut(&Folder, usize)>(&self, mut visit: F) {
        walk_folders(&self.document.folders, 0, &mut visit);
    }

    /// Append `folder` under `parent_id`. Nothing changes if the parent is
    /// not in the tree.
    pub fn insert_child(&mut self, parent_id: &str, folder: Folder) -> Result<()> {
        match find_in_mut(&mut self.document.folders, parent_id) {
            Some(parent) => {
                parent.children.push(folder);
                Ok(())
            }
            None => Err(Error::FolderNotFound(parent_id.to_string())),
        }
    }

    pub fn push_root(&mut self, folder: Folder) {
        self.document.folders.push(folder);
    }

    pub fn save(&self) -> Result<()> {
        atomic::write_json_pretty(&self.path, &self.document)
    }
}

fn find_in<'a>(folders: &'a [Folder], id: &str) -> Option<&'a Folder> {
    for folder in folders {
        if folder.id == id {
            return Some(folder);
        }
        if let Some(found) = find_in(&folder.children, id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(folders: &'a mut [Folder], id: &str) -> Option<&'a mut Folder> {
    for folder in folders {
        if folder.id == id {
            return Some(folder);
        }
        if let Some(found) = find_in_mut(&mut folder.children, id) {
            return Some(found);
        }
    }
    None
}

fn walk_folders<F: FnMut(&Folder, usize)>(folders: &[Folder], depth: usize, visit: &mut F) {
    for folder in folders {
        visit(folder, depth);
        walk_folders(&folder.children, depth + 1, visit);
    }
}

impl Library {
    pub fn load_folders(&self) -> Result<FolderTree> {
        FolderTree::load(&self.folders_file())
    }

    pub fn folder_exists(&self, folder_id: &str) -> Result<bool> {
        Ok(self.load_folders()?.contains(folder_id))
    }

    /// Create a folder named `name` under `parent_id` and return its id.
    pub fn insert_folder(&self, parent_id: &str, name: &str, description: &str) -> Result<String> {
        self.insert_folder_with(parent_id, name, description, ids::new_folder_id)
    }

    pub(crate) fn insert_folder_with<G>(
        &self,
        parent_id: &str,
        name: &str,
        description: &str,
        generate: G,
    ) -> Result<String>
    where
        G: FnMut() -> String,
    {
        let _lock = self.lock()?;
        let mut tree = self.load_folders()?;
        let id = self.add_child(&mut tree, parent_id, name, description, generate)?;
        tree.save()?;

        info!("Created folder '{}' ({}) under {}", name, id, parent_id);
        Ok(id)
    }

    /// Create a top-level folder and return its id.
    pub fn insert_root_folder(&self, name: &str, description: &str) -> Result<String> {
        let _lock = self.lock()?;
        let mut tree = self.load_folders()?;

        let folder = self.new_folder(&tree, name, description, ids::new_folder_id)?;
        let id = folder.id.clone();
        tree.push_root(folder);
        tree.save()?;

        info!("Created top-level folder '{}' ({})", name, id);
        Ok(id)
    }

    /// Id of the direct child of `parent_id` called `name`, creating it if
    /// there is none. Lookup and insert happen under one lock hold, so
    /// concurrent callers agree on a single folder.
    pub fn ensure_subfolder(
        &self,
        parent_id: &str,
        name: &str,
        description: &str,
    ) -> Result<String> {
        let _lock = self.lock()?;
        let mut tree = self.load_folders()?;
        if let Some(existing) = tree.find_child_by_name(parent_id, name) {
            debug!("Reusing folder '{}' ({})", name, existing.id);
            return Ok(existing.id.clone());
        }

        let id = self.add_child(&mut tree, parent_id, name, description, ids::new_folder_id)?;
        tree.save()?;

        info!("Created folder '{}' ({}) under {}", name, id, parent_id);
        Ok(id)
    }

    /// Resolve a configured folder name, or an existing folder id.
    pub fn resolve_folder(&self, name_or_id: &str) -> Result<String> {
        if let Some(id) = self.config().folder_id(name_or_id) {
            return Ok(id.to_string());
        }
        if self.folder_exists(name_or_id)? {
            return Ok(name_or_id.to_string());
        }
        Err(Error::FolderNotFound(name_or_id.to_string()))
    }

    /// In-memory insert; the caller holds the lock and saves.
    fn add_child<G>(
        &self,
        tree: &mut FolderTree,
        parent_id: &str,
        name: &str,
        description: &str,
        generate: G,
    ) -> Result<String>
    where
        G: FnMut() -> String,
    {
        if !tree.contains(parent_id) {
            return Err(Error::FolderNotFound(parent_id.to_string()));
        }
        let folder = self.new_folder(tree, name, description, generate)?;
        let id = folder.id.clone();
        tree.insert_child(parent_id, folder)?;
        Ok(id)
    }

    fn new_folder<G>(
        &self,
        tree: &FolderTree,
        name: &str,
        description: &str,
        generate: G,
    ) -> Result<Folder>
    where
        G: FnMut() -> String,
    {
        let taken = tree.ids();
        let id = ids::allocate_unique(
            "folder",
            self.config().id_max_attempts,
            generate,
            |candidate| taken.contains(candidate),
        )?;
        Ok(Folder::new(id, name, description, now_ms()))
    }
}
