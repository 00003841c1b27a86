pub mod orientation;
pub mod thumbnail;

pub use orientation::read_orientation;
pub use thumbnail::{fit_within, render_thumbnail, write_thumbnail};
