//! Copying rectangular pixel windows in and out of RGBA buffers.

use image::RgbaImage;

use crate::geometry::PixelRect;

const CHANNELS: usize = 4;

/// Copy the pixels under `rect` into a new buffer of exactly `rect`'s size.
///
/// The window is clipped to the image, so the output may be smaller than
/// `rect` when it hangs over an edge. Returns `None` when nothing overlaps.
pub fn crop_region(image: &RgbaImage, rect: &PixelRect) -> Option<RgbaImage> {
    let (img_w, img_h) = image.dimensions();
    let left = rect.x.min(img_w);
    let top = rect.y.min(img_h);
    let out_width = rect.x.saturating_add(rect.width).min(img_w) - left;
    let out_height = rect.y.saturating_add(rect.height).min(img_h) - top;

    if out_width == 0 || out_height == 0 {
        return None;
    }

    let src = image.as_raw();
    let row_len = out_width as usize * CHANNELS;
    let mut output = Vec::with_capacity(row_len * out_height as usize);

    // Copy pixel data row by row
    for y in 0..out_height {
        let start = ((top + y) as usize * img_w as usize + left as usize) * CHANNELS;
        output.extend_from_slice(&src[start..start + row_len]);
    }

    RgbaImage::from_raw(out_width, out_height, output)
}

/// Overwrite the pixels of `target` at (`x`, `y`) with `patch`.
///
/// Parts of the patch outside the target are dropped. Pixels are replaced,
/// not blended.
pub fn paste_region(target: &mut RgbaImage, patch: &RgbaImage, x: u32, y: u32) {
    let (dst_w, dst_h) = target.dimensions();
    if x >= dst_w || y >= dst_h {
        return;
    }

    let copy_w = patch.width().min(dst_w - x) as usize;
    let copy_h = patch.height().min(dst_h - y);
    let src_stride = patch.width() as usize * CHANNELS;
    let src = patch.as_raw();
    let dst: &mut [u8] = target;

    for row in 0..copy_h {
        let src_start = row as usize * src_stride;
        let dst_start = ((y + row) as usize * dst_w as usize + x as usize) * CHANNELS;
        dst[dst_start..dst_start + copy_w * CHANNELS]
            .copy_from_slice(&src[src_start..src_start + copy_w * CHANNELS]);
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
