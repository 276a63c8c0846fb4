//! Slicing one full-height capture into page-sized rasters

use crate::layout::PageGeometry;
use image::{imageops, Rgba, RgbaImage};

/// Pixel size of one exported page at a scale factor
pub fn scaled_page_size(geometry: &PageGeometry, scale_factor: f32) -> (u32, u32) {
    let width = (geometry.content_width_px * scale_factor).round().max(1.0) as u32;
    let height = (geometry.content_height_px * scale_factor).round().max(1.0) as u32;
    (width, height)
}

/// Number of pages a capture of `image_height` rows spans
pub fn export_page_count(image_height: u32, page_height: u32) -> usize {
    (image_height.div_ceil(page_height) as usize).max(1)
}

/// Cut `source` into consecutive page rasters.
///
/// Each strip is copied unscaled to the top-left of a background-filled
/// canvas of the exact page size. A short final strip leaves background
/// below it; columns beyond the page width are cropped.
pub fn slice_pages(
    source: &RgbaImage,
    geometry: &PageGeometry,
    scale_factor: f32,
    background: Rgba<u8>,
) -> Vec<RgbaImage> {
    let (page_width, page_height) = scaled_page_size(geometry, scale_factor);
    let page_count = export_page_count(source.height(), page_height);
    let copy_width = source.width().min(page_width);

    (0..page_count)
        .map(|index| {
            let mut canvas = RgbaImage::from_pixel(page_width, page_height, background);

            let top = index as u32 * page_height;
            let bottom = (top + page_height).min(source.height());
            if bottom > top && copy_width > 0 {
                let strip =
                    imageops::crop_imm(source, 0, top, copy_width, bottom - top).to_image();
                imageops::replace(&mut canvas, &strip, 0, 0);
            }

            log::debug!(
                "sliced page {} from rows {top}..{bottom} into {page_width}x{page_height}",
                index + 1
            );
            canvas
        })
        .collect()
}
