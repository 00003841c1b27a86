pub mod atomic;
pub mod folders;
pub mod index;
pub mod library;
pub mod lock;
pub mod models;

pub use folders::FolderTree;
pub use library::Library;
pub use lock::LibraryLock;
pub use models::{AssetMetadata, Folder, LibraryDocument, MtimeIndex};
