use crate::error::{Error, Result};
use crate::storage::atomic;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Target size for an image fitted into a `bound` x `bound` box.
/// Aspect ratio is kept, the longer side lands on `bound`, images that
/// already fit are left at their own size, and no side collapses to 0.
/// A `bound` of 0 is treated as 1.
pub fn fit_within(width: u32, height: u32, bound: u32) -> (u32, u32) {
    let bound = bound.max(1);
    if width <= bound && height <= bound {
        return (width, height);
    }
    let (long, short) = if width >= height {
        (width, height)
    } else {
        (height, width)
    };
    let scaled_short = (u64::from(short) * u64::from(bound) + u64::from(long) / 2) / u64::from(long);
    let scaled_short = u32::try_from(scaled_short).unwrap_or(bound).clamp(1, bound);
    if width >= height {
        (bound, scaled_short)
    } else {
        (scaled_short, bound)
    }
}

/// Scale `image` into a `bound` box and drop any alpha channel.
pub fn render_thumbnail(image: &DynamicImage, bound: u32) -> DynamicImage {
    let (w, h) = fit_within(image.width(), image.height(), bound);
    let resized = if (w, h) == (image.width(), image.height()) {
        image.clone()
    } else {
        image.resize_exact(w, h, FilterType::Lanczos3)
    };
    if resized.color().has_alpha() {
        DynamicImage::ImageRgb8(resized.to_rgb8())
    } else {
        resized
    }
}

/// Decode `source`, render its thumbnail and publish it as PNG at `target`.
/// Returns the thumbnail dimensions.
pub fn write_thumbnail(source: &Path, target: &Path, bound: u32) -> Result<(u32, u32)> {
    if bound == 0 {
        return Err(Error::Validation("thumbnail bound must be at least 1".into()));
    }
    let image = ImageReader::open(source)?.with_guessed_format()?.decode()?;
    let thumb = render_thumbnail(&image, bound);

    let mut encoded = Cursor::new(Vec::new());
    thumb.write_to(&mut encoded, ImageFormat::Png)?;
    atomic::write_atomic(target, encoded.get_ref())?;

    debug!(
        "Thumbnail {}x{} -> {}x{} at {}",
        image.width(),
        image.height(),
        thumb.width(),
        thumb.height(),
        target.display()
    );
    Ok((thumb.width(), thumb.height()))
}
