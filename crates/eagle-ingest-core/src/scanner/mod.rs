pub mod walk;

pub use walk::{list_asset_dirs, AssetDir};
