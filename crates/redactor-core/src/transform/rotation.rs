//! Quarter-turn rotation.
//!
//! Rotation in the editor moves in fixed quarter-turn steps, so every rotation
//! is an exact pixel permutation: no interpolation, no canvas expansion, and a
//! 90 or 270 degree turn simply swaps width and height.

use image::imageops;
use image::RgbaImage;

use crate::geometry::{PixelRect, Rotation, Size};

/// Number of clockwise quarter turns, snapping odd angles to the nearest one.
fn quarter_turns(rotation: Rotation) -> i32 {
    ((rotation.degrees() as f64 / 90.0).round() as i32).rem_euclid(4)
}

/// Rotate `image` clockwise by `rotation`.
///
/// Angles that are not a multiple of 90 degrees are snapped to the nearest
/// quarter turn.
pub fn apply_rotation(image: &RgbaImage, rotation: Rotation) -> RgbaImage {
    match quarter_turns(rotation) {
        1 => imageops::rotate90(image),
        2 => imageops::rotate180(image),
        3 => imageops::rotate270(image),
        _ => image.clone(),
    }
}

/// Where `rect` lands after rotating an image of `size` by `rotation`.
///
/// Matches [`apply_rotation`] pixel for pixel: the pixels under the returned
/// rectangle in the rotated image are exactly the pixels under `rect` in the
/// original.
pub fn rotate_rect(rect: &PixelRect, size: Size, rotation: Rotation) -> PixelRect {
    let right_gap = size.width.saturating_sub(rect.x + rect.width);
    let bottom_gap = size.height.saturating_sub(rect.y + rect.height);
    match quarter_turns(rotation) {
        1 => PixelRect::new(bottom_gap, rect.x, rect.height, rect.width),
        2 => PixelRect::new(right_gap, bottom_gap, rect.width, rect.height),
        3 => PixelRect::new(rect.y, right_gap, rect.height, rect.width),
        _ => *rect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    /// 3x2 image with a red marker in the top-left corner.
    fn marked_image() -> RgbaImage {
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([0, 0, 0, 255]));
        img.put_pixel(0, 0, RED);
        img
    }

    #[test]
    fn test_rotation_no_change() {
        let img = marked_image();
        assert_eq!(apply_rotation(&img, Rotation::NONE), img);
        assert_eq!(apply_rotation(&img, Rotation::new(360)), img);
    }

    #[test]
    fn test_rotation_90_clockwise() {
        let result = apply_rotation(&marked_image(), Rotation::new(90));
        // 90-degree rotation swaps dimensions
        assert_eq!(result.dimensions(), (2, 3));
        // Top-left corner moves to top-right
        assert_eq!(*result.get_pixel(1, 0), RED);
    }

    #[test]
    fn test_rotation_180() {
        let result = apply_rotation(&marked_image(), Rotation::new(180));
        assert_eq!(result.dimensions(), (3, 2));
        assert_eq!(*result.get_pixel(2, 1), RED);
    }

    #[test]
    fn test_rotation_counter_clockwise() {
        let result = apply_rotation(&marked_image(), Rotation::new(-90));
        assert_eq!(result.dimensions(), (2, 3));
        // Top-left corner moves to bottom-left
        assert_eq!(*result.get_pixel(0, 2), RED);
    }

    #[test]
    fn test_four_quarter_turns_identity() {
        let img = marked_image();
        let mut result = img.clone();
        for _ in 0..4 {
            result = apply_rotation(&result, Rotation::new(90));
        }
        assert_eq!(result, img);
    }

    #[test]
    fn test_rotate_rect_follows_pixels() {
        let size = crate::geometry::Size::new(7, 4);
        let rect = PixelRect::new(1, 2, 3, 1);
        let mut img = RgbaImage::from_pixel(size.width, size.height, Rgba([0, 0, 0, 255]));
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                img.put_pixel(x, y, RED);
            }
        }

        for degrees in [0, 90, 180, 270] {
            let rotation = Rotation::new(degrees);
            let rotated = apply_rotation(&img, rotation);
            let moved = rotate_rect(&rect, size, rotation);
            let red_count = rotated.pixels().filter(|p| **p == RED).count() as u32;

            assert_eq!(red_count, moved.width * moved.height, "at {degrees} degrees");
            for y in moved.y..moved.y + moved.height {
                for x in moved.x..moved.x + moved.width {
                    assert_eq!(*rotated.get_pixel(x, y), RED, "at {degrees} degrees");
                }
            }
        }
    }

    #[test]
    fn test_dimensions_match_rotation_swap() {
        let img = marked_image();
        for degrees in [0, 90, 180, 270] {
            let rotation = Rotation::new(degrees);
            let result = apply_rotation(&img, rotation);
            let expected = rotation.apply_to(crate::geometry::Size::new(3, 2));
            assert_eq!(result.dimensions(), (expected.width, expected.height));
        }
    }
}
