//! Cutting the reading field out of a rendered page.

use image::{DynamicImage, GenericImageView};
use tracing::trace;

use crate::error::RegionError;
use crate::models::config::RegionConfig;

/// Crop `region` out of `image`.
///
/// A rectangle reaching past the image means the page was rendered at the
/// wrong scale or is a different form; it is never clipped to fit.
pub fn crop(image: &DynamicImage, region: RegionConfig) -> Result<DynamicImage, RegionError> {
    let RegionConfig {
        left,
        top,
        width,
        height,
    } = region;

    if width == 0 || height == 0 {
        return Err(RegionError::Empty);
    }

    let (image_width, image_height) = image.dimensions();
    let fits = |start: u32, len: u32, limit: u32| start.checked_add(len).is_some_and(|end| end <= limit);

    if !fits(left, width, image_width) || !fits(top, height, image_height) {
        return Err(RegionError::OutOfBounds {
            left,
            top,
            width,
            height,
            image_width,
            image_height,
        });
    }

    trace!(
        "Cropping ({}, {}, {}x{}) from {}x{}",
        left, top, width, height, image_width, image_height
    );
    Ok(image.crop_imm(left, top, width, height))
}
