pub mod sanitize;
pub mod writer;

pub use sanitize::{sanitize_filename, stored_extension, ALLOWED_EXTENSIONS};
pub use writer::NewAsset;
