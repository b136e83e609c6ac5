//! Overlay rendering, blur preview and export compositing.
//!
//! # Pipeline
//!
//! While editing:
//! 1. [`draw_blur_preview`] blurs the whole source into the blur layer when blur
//!    mode is entered
//! 2. [`draw_overlay`] repaints the overlay after every selection change
//!
//! On export:
//! 1. [`export_blurred`] pastes every blur region's pixels onto a copy of the
//!    source
//! 2. [`export_crops`] cuts each crop region out of that composite
//!
//! Crops are always taken from the blurred composite, so a crop includes any
//! redaction made inside its bounds. Export functions only read their inputs
//! and return new buffers.

use std::borrow::Cow;
use std::fmt;

use image::{imageops, Rgba, RgbaImage};

use crate::config::{BlurConfig, OverlayStyle, OverlayStyles};
use crate::geometry::{ImageRect, PixelRect};
use crate::layers::Surface;
use crate::selection::{Region, RegionKind};
use crate::transform::{crop_region, paste_region};

/// Something that can blur a whole image.
///
/// The output must have the same dimensions as the input.
pub trait BlurBackend: fmt::Debug {
    fn apply_blur(&self, image: &RgbaImage) -> RgbaImage;
}

/// Gaussian blur via the `image` crate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianBlur {
    pub sigma: f32,
}

impl BlurBackend for GaussianBlur {
    fn apply_blur(&self, image: &RgbaImage) -> RgbaImage {
        if self.sigma <= 0.0 {
            return image.clone();
        }
        imageops::blur(image, self.sigma)
    }
}

/// Box-blur approximation of a gaussian via `imageops::fast_blur`.
///
/// Cost does not grow with `sigma`, so this suits large images and strong blurs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxBlur {
    pub sigma: f32,
}

impl BlurBackend for BoxBlur {
    fn apply_blur(&self, image: &RgbaImage) -> RgbaImage {
        if self.sigma <= 0.0 || image.width() == 0 || image.height() == 0 {
            return image.clone();
        }
        // Anything wider than the image already flattens it.
        let limit = image.width().max(image.height()) as f32;
        imageops::fast_blur(image, self.sigma.min(limit))
    }
}

/// Build the blur backend a config asks for.
pub fn blur_backend(config: &BlurConfig) -> Box<dyn BlurBackend> {
    match *config {
        BlurConfig::Gaussian { sigma } => Box::new(GaussianBlur { sigma }),
        BlurConfig::Box { sigma } => Box::new(BoxBlur { sigma }),
    }
}

/// Blur the whole source into the blur layer at native resolution.
///
/// Returns `false` without drawing when the layer and source sizes differ.
pub fn draw_blur_preview(
    source: &RgbaImage,
    blur_layer: &mut Surface,
    backend: &dyn BlurBackend,
) -> bool {
    let blurred = backend.apply_blur(source);
    blur_layer.draw_image(&blurred)
}

/// Merge both kinds of regions into one list in commit order.
pub fn regions_in_commit_order<'a>(crop: &'a [Region], blur: &'a [Region]) -> Vec<&'a Region> {
    let mut all: Vec<&Region> = crop.iter().chain(blur.iter()).collect();
    all.sort_by_key(|r| r.sequence);
    all
}

/// Repaint the overlay: every region in order, then the active drag on top.
///
/// Each rectangle is a translucent fill with a border drawn over it. Later
/// rectangles blend over earlier ones, so overlaps show darker.
pub fn draw_overlay(
    overlay: &mut Surface,
    regions: &[&Region],
    active: Option<(RegionKind, &ImageRect)>,
    styles: &OverlayStyles,
) {
    overlay.clear();
    let bounds = overlay.size();
    let pixels = overlay.pixels_mut();

    for region in regions {
        draw_rect(pixels, &region.rect, styles.for_kind(region.kind));
    }

    if let Some((kind, rect)) = active {
        // A drag that hasn't moved yet has nothing to show.
        if let Some(rect) = PixelRect::from_image_rect(rect, bounds) {
            draw_rect(pixels, &rect, styles.for_kind(kind));
        }
    }
}

fn draw_rect(pixels: &mut RgbaImage, rect: &PixelRect, style: &OverlayStyle) {
    let (img_w, img_h) = pixels.dimensions();
    let right = rect.x.saturating_add(rect.width).min(img_w);
    let bottom = rect.y.saturating_add(rect.height).min(img_h);
    let stroke = style.stroke_width;

    for y in rect.y..bottom {
        for x in rect.x..right {
            let px = pixels.get_pixel_mut(x, y);
            blend_over(px, style.fill);

            let on_border = x < rect.x + stroke
                || y < rect.y + stroke
                || x + stroke >= rect.x + rect.width
                || y + stroke >= rect.y + rect.height;
            if stroke > 0 && on_border {
                blend_over(px, style.stroke);
            }
        }
    }
}

/// Straight-alpha source-over blend of `src` onto `dst`.
fn blend_over(dst: &mut Rgba<u8>, src: [u8; 4]) {
    let sa = src[3] as f32 / 255.0;
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    *dst = Rgba(out);
}

/// Paste the blurred pixels of every blur region onto a copy of `base`.
///
/// A region's commit-time snapshot is used when present; otherwise its pixels
/// are read from `blur_layer`. Regions with neither are skipped.
pub fn export_blurred(
    base: &RgbaImage,
    blur_layer: Option<&RgbaImage>,
    regions: &[Region],
) -> RgbaImage {
    let mut output = base.clone();

    for region in regions.iter().filter(|r| r.kind == RegionKind::Blur) {
        let patch: Cow<'_, RgbaImage> = match &region.snapshot {
            Some(snapshot) => Cow::Borrowed(snapshot),
            None => match blur_layer.and_then(|layer| crop_region(layer, &region.rect)) {
                Some(patch) => Cow::Owned(patch),
                None => {
                    log::warn!("no blurred pixels for region {:?}, skipping", region.rect);
                    continue;
                }
            },
        };
        paste_region(&mut output, &patch, region.rect.x, region.rect.y);
    }

    output
}

/// Cut one standalone image per crop region out of `image`, at 1:1 scale.
pub fn export_crops(image: &RgbaImage, regions: &[Region]) -> Vec<RgbaImage> {
    regions
        .iter()
        .filter(|r| r.kind == RegionKind::Crop)
        .filter_map(|region| {
            let cropped = crop_region(image, &region.rect);
            if cropped.is_none() {
                log::warn!("crop region {:?} lies outside the image", region.rect);
            }
            cropped
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{compute_display_layout, Rotation, Size};
    use crate::layers::{LayerKind, LayerRegistry};

    fn region(kind: RegionKind, rect: PixelRect, sequence: u64) -> Region {
        Region {
            kind,
            rect,
            sequence,
            snapshot: None,
        }
    }

    fn mounted(size: Size) -> LayerRegistry {
        let mut layers = LayerRegistry::new();
        let layout = compute_display_layout(size, Size::new(900, 900), 100, Rotation::NONE);
        layers.resize(size, &layout);
        layers
    }

    /// Left half black, right half white.
    fn split_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn test_gaussian_preserves_size() {
        let img = split_image(20, 10);
        let blurred = GaussianBlur { sigma: 2.0 }.apply_blur(&img);
        assert_eq!(blurred.dimensions(), (20, 10));
        // The hard edge is softened
        let edge = blurred.get_pixel(10, 5).0[0];
        assert!(edge > 0 && edge < 255);
    }

    #[test]
    fn test_gaussian_zero_sigma_is_identity() {
        let img = split_image(8, 8);
        assert_eq!(GaussianBlur { sigma: 0.0 }.apply_blur(&img), img);
    }

    fn assert_pixels_near(a: &RgbaImage, b: &RgbaImage, tolerance: u8) {
        assert_eq!(a.dimensions(), b.dimensions());
        for (pa, pb) in a.pixels().zip(b.pixels()) {
            for (ca, cb) in pa.0.iter().zip(pb.0) {
                assert!(ca.abs_diff(cb) <= tolerance, "{:?} vs {:?}", pa, pb);
            }
        }
    }

    #[test]
    fn test_box_blur_uniform_image_unchanged() {
        let img = RgbaImage::from_pixel(9, 7, Rgba([40, 80, 120, 255]));
        let blurred = BoxBlur { sigma: 3.0 }.apply_blur(&img);
        assert_pixels_near(&blurred, &img, 1);
    }

    #[test]
    fn test_box_blur_softens_edge() {
        let img = split_image(40, 4);
        let blurred = BoxBlur { sigma: 2.0 }.apply_blur(&img);
        assert_eq!(blurred.dimensions(), (40, 4));
        let edge = blurred.get_pixel(20, 1).0[0];
        assert!(edge > 0 && edge < 255);
        // Far from the edge the halves keep their tone
        assert!(blurred.get_pixel(0, 1).0[0] < 10);
        assert!(blurred.get_pixel(39, 1).0[0] > 245);
    }

    #[test]
    fn test_box_blur_zero_sigma_is_identity() {
        let img = split_image(6, 6);
        assert_eq!(BoxBlur { sigma: 0.0 }.apply_blur(&img), img);
    }

    #[test]
    fn test_box_blur_huge_sigma_keeps_size() {
        let img = split_image(12, 5);
        let blurred = BoxBlur { sigma: 1.0e6 }.apply_blur(&img);
        assert_eq!(blurred.dimensions(), (12, 5));
    }

    #[test]
    fn test_blur_backend_from_config() {
        let backend = blur_backend(&BlurConfig::Box { sigma: 1.0 });
        let img = RgbaImage::from_pixel(3, 3, Rgba([5, 5, 5, 255]));
        assert_pixels_near(&backend.apply_blur(&img), &img, 1);
    }

    #[test]
    fn test_draw_blur_preview() {
        let source = split_image(10, 10);
        let mut layers = mounted(Size::new(10, 10));
        let blur = layers.get_mut(LayerKind::Blur).unwrap();
        assert!(draw_blur_preview(&source, blur, &GaussianBlur { sigma: 1.5 }));
        assert_ne!(blur.pixels(), &source);

        let mut wrong = mounted(Size::new(5, 5));
        let blur = wrong.get_mut(LayerKind::Blur).unwrap();
        assert!(!draw_blur_preview(&source, blur, &GaussianBlur { sigma: 1.5 }));
    }

    #[test]
    fn test_commit_order_merges_kinds() {
        let crop = vec![
            region(RegionKind::Crop, PixelRect::new(0, 0, 1, 1), 0),
            region(RegionKind::Crop, PixelRect::new(0, 0, 1, 1), 3),
        ];
        let blur = vec![region(RegionKind::Blur, PixelRect::new(0, 0, 1, 1), 1)];
        let order: Vec<u64> = regions_in_commit_order(&crop, &blur)
            .iter()
            .map(|r| r.sequence)
            .collect();
        assert_eq!(order, vec![0, 1, 3]);
    }

    #[test]
    fn test_draw_overlay_fills_and_strokes() {
        let mut layers = mounted(Size::new(20, 20));
        let overlay = layers.get_mut(LayerKind::Overlay).unwrap();
        let r = region(RegionKind::Crop, PixelRect::new(5, 5, 10, 10), 0);
        let styles = OverlayStyles::default();

        draw_overlay(overlay, &[&r], None, &styles);

        let px = overlay.pixels();
        // Outside untouched
        assert_eq!(px.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(px.get_pixel(15, 15).0, [0, 0, 0, 0]);
        // Interior is the translucent fill
        assert_eq!(px.get_pixel(10, 10).0, [200, 200, 200, 128]);
        // Border is opaque stroke
        assert_eq!(px.get_pixel(5, 10).0, [0, 0, 0, 255]);
        assert_eq!(px.get_pixel(14, 10).0, [0, 0, 0, 255]);
        assert_eq!(px.get_pixel(10, 6).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_draw_overlay_clears_previous() {
        let mut layers = mounted(Size::new(20, 20));
        let overlay = layers.get_mut(LayerKind::Overlay).unwrap();
        let styles = OverlayStyles::default();
        let r = region(RegionKind::Crop, PixelRect::new(0, 0, 10, 10), 0);

        draw_overlay(overlay, &[&r], None, &styles);
        draw_overlay(overlay, &[], None, &styles);
        assert!(overlay.pixels().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_draw_overlay_overlaps_accumulate() {
        let mut layers = mounted(Size::new(30, 30));
        let overlay = layers.get_mut(LayerKind::Overlay).unwrap();
        let styles = OverlayStyles::default();
        let a = region(RegionKind::Crop, PixelRect::new(0, 0, 20, 20), 0);
        let b = region(RegionKind::Crop, PixelRect::new(10, 10, 20, 20), 1);

        draw_overlay(overlay, &[&a, &b], None, &styles);
        let single = overlay.pixels().get_pixel(5, 5).0[3];
        let overlap = overlay.pixels().get_pixel(15, 15).0[3];
        assert!(overlap > single);
    }

    #[test]
    fn test_draw_overlay_active_negative_drag() {
        let mut layers = mounted(Size::new(20, 20));
        let overlay = layers.get_mut(LayerKind::Overlay).unwrap();
        let active = ImageRect::new(15.0, 15.0, -10.0, -10.0);

        draw_overlay(
            overlay,
            &[],
            Some((RegionKind::Blur, &active)),
            &OverlayStyles::default(),
        );
        assert_eq!(overlay.pixels().get_pixel(10, 10).0[3], 96);
        assert_eq!(overlay.pixels().get_pixel(16, 16).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_draw_overlay_zero_sized_active() {
        let mut layers = mounted(Size::new(10, 10));
        let overlay = layers.get_mut(LayerKind::Overlay).unwrap();
        let active = ImageRect::new(3.0, 3.0, 0.0, 0.0);
        draw_overlay(
            overlay,
            &[],
            Some((RegionKind::Crop, &active)),
            &OverlayStyles::default(),
        );
        assert!(overlay.pixels().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_blend_over() {
        let mut dst = Rgba([0, 0, 0, 0]);
        blend_over(&mut dst, [200, 200, 200, 128]);
        assert_eq!(dst.0, [200, 200, 200, 128]);

        let mut opaque = Rgba([0, 0, 0, 255]);
        blend_over(&mut opaque, [255, 255, 255, 255]);
        assert_eq!(opaque.0, [255, 255, 255, 255]);

        let mut untouched = Rgba([1, 2, 3, 4]);
        blend_over(&mut untouched, [255, 255, 255, 0]);
        assert_eq!(untouched.0, [1, 2, 3, 4]);
    }

    #[test]
    fn test_export_blurred_uses_blur_layer() {
        let base = RgbaImage::from_pixel(400, 300, Rgba([10, 10, 10, 255]));
        let blurred = RgbaImage::from_pixel(400, 300, Rgba([99, 99, 99, 255]));
        let rect = PixelRect::new(100, 100, 200, 150);
        let regions = vec![region(RegionKind::Blur, rect, 0)];

        let out = export_blurred(&base, Some(&blurred), &regions);

        assert_eq!(out.dimensions(), (400, 300));
        assert_eq!(out.get_pixel(100, 100).0, [99, 99, 99, 255]);
        assert_eq!(out.get_pixel(299, 249).0, [99, 99, 99, 255]);
        assert_eq!(out.get_pixel(300, 249).0, [10, 10, 10, 255]);
        assert_eq!(out.get_pixel(99, 100).0, [10, 10, 10, 255]);
        assert_eq!(out.get_pixel(100, 250).0, [10, 10, 10, 255]);
        // Inputs are untouched
        assert_eq!(base.get_pixel(100, 100).0, [10, 10, 10, 255]);
    }

    #[test]
    fn test_export_blurred_prefers_snapshot() {
        let base = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        let layer = RgbaImage::from_pixel(10, 10, Rgba([50, 50, 50, 255]));
        let mut r = region(RegionKind::Blur, PixelRect::new(2, 2, 3, 3), 0);
        r.snapshot = Some(RgbaImage::from_pixel(3, 3, Rgba([7, 7, 7, 255])));

        let out = export_blurred(&base, Some(&layer), &[r]);
        assert_eq!(out.get_pixel(3, 3).0, [7, 7, 7, 255]);
    }

    #[test]
    fn test_export_blurred_without_source_skips() {
        let base = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        let regions = vec![region(RegionKind::Blur, PixelRect::new(2, 2, 3, 3), 0)];
        assert_eq!(export_blurred(&base, None, &regions), base);
    }

    #[test]
    fn test_export_crops_one_per_region() {
        let image = split_image(100, 80);
        let regions = vec![
            region(RegionKind::Crop, PixelRect::new(0, 0, 30, 20), 0),
            region(RegionKind::Crop, PixelRect::new(60, 10, 25, 50), 1),
        ];
        let crops = export_crops(&image, &regions);

        assert_eq!(crops.len(), 2);
        assert_eq!(crops[0].dimensions(), (30, 20));
        assert_eq!(crops[1].dimensions(), (25, 50));
        assert_eq!(crops[0].get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(crops[1].get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_export_crops_ignores_blur_regions() {
        let image = split_image(10, 10);
        let regions = vec![region(RegionKind::Blur, PixelRect::new(0, 0, 5, 5), 0)];
        assert!(export_crops(&image, &regions).is_empty());
    }

    #[test]
    fn test_crop_includes_blur() {
        let base = RgbaImage::from_pixel(50, 50, Rgba([0, 0, 0, 255]));
        let layer = RgbaImage::from_pixel(50, 50, Rgba([128, 128, 128, 255]));
        let blur = vec![region(RegionKind::Blur, PixelRect::new(10, 10, 10, 10), 0)];
        let crop = vec![region(RegionKind::Crop, PixelRect::new(5, 5, 20, 20), 1)];

        let composite = export_blurred(&base, Some(&layer), &blur);
        let crops = export_crops(&composite, &crop);

        assert_eq!(crops[0].get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(crops[0].get_pixel(5, 5).0, [128, 128, 128, 255]);
    }
}
