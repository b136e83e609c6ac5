//! The stacked drawing surfaces behind the editor canvas.
//!
//! Three surfaces are managed, bottom to top:
//!
//! - **Image**: the source image at native resolution
//! - **Blur**: a whole-image blur preview, read back when blur regions commit
//! - **Overlay**: selection rectangles, the only surface pointer events target
//!
//! All three always share one pixel size and one display size. They are created
//! together on the first [`LayerRegistry::resize`] and resized together after.
//! Until then the registry is unmounted and every lookup returns `None`.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::geometry::{DisplayLayout, DisplaySize, Size};

/// Name of a managed surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Image,
    Blur,
    Overlay,
}

impl LayerKind {
    /// Every layer, bottom to top.
    pub const ALL: [LayerKind; 3] = [LayerKind::Image, LayerKind::Blur, LayerKind::Overlay];

    fn index(self) -> usize {
        match self {
            LayerKind::Image => 0,
            LayerKind::Blur => 1,
            LayerKind::Overlay => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LayerKind::Image => "image",
            LayerKind::Blur => "blur",
            LayerKind::Overlay => "overlay",
        }
    }
}

/// One RGBA drawing surface.
#[derive(Debug, Clone)]
pub struct Surface {
    kind: LayerKind,
    pixels: RgbaImage,
    display_size: DisplaySize,
}

impl Surface {
    fn new(kind: LayerKind, size: Size, display_size: DisplaySize) -> Self {
        Self {
            kind,
            pixels: RgbaImage::new(size.width, size.height),
            display_size,
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn size(&self) -> Size {
        let (width, height) = self.pixels.dimensions();
        Size::new(width, height)
    }

    pub fn display_size(&self) -> DisplaySize {
        self.display_size
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    /// Replace the surface content with `image`, which must match its size.
    ///
    /// Returns `false` (leaving the surface untouched) on a size mismatch.
    pub fn draw_image(&mut self, image: &RgbaImage) -> bool {
        if image.dimensions() != self.pixels.dimensions() {
            log::warn!(
                "refusing to draw {}x{} image onto {}x{} {} layer",
                image.width(),
                image.height(),
                self.pixels.width(),
                self.pixels.height(),
                self.kind.name()
            );
            return false;
        }
        self.pixels.copy_from_slice(image.as_raw());
        true
    }
}

/// Owner of the image, blur and overlay surfaces.
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    surfaces: Option<[Surface; 3]>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the surfaces exist.
    pub fn is_mounted(&self) -> bool {
        self.surfaces.is_some()
    }

    /// Give every surface `native` pixels and the layout's display size.
    ///
    /// All pixel content is cleared, so the caller must redraw the base image
    /// before anything reads from the layers.
    pub fn resize(&mut self, native: Size, layout: &DisplayLayout) {
        let display = layout.display_size;
        self.surfaces = Some(LayerKind::ALL.map(|kind| Surface::new(kind, native, display)));
        log::debug!(
            "layers resized to {}x{} (display {:.1}x{:.1})",
            native.width,
            native.height,
            display.width,
            display.height
        );
    }

    /// Update the display size of every surface without touching pixels.
    pub fn relayout(&mut self, layout: &DisplayLayout) {
        if let Some(surfaces) = self.surfaces.as_mut() {
            for surface in surfaces.iter_mut() {
                surface.display_size = layout.display_size;
            }
        }
    }

    /// Drop all surfaces.
    pub fn unmount(&mut self) {
        self.surfaces = None;
    }

    pub fn get(&self, kind: LayerKind) -> Option<&Surface> {
        self.surfaces.as_ref().map(|s| &s[kind.index()])
    }

    pub fn get_mut(&mut self, kind: LayerKind) -> Option<&mut Surface> {
        self.surfaces.as_mut().map(|s| &mut s[kind.index()])
    }

    /// Shared pixel size of the surfaces.
    pub fn size(&self) -> Option<Size> {
        self.get(LayerKind::Image).map(Surface::size)
    }

    /// Shared display size of the surfaces.
    pub fn display_size(&self) -> Option<DisplaySize> {
        self.get(LayerKind::Image).map(Surface::display_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{compute_display_layout, Rotation};

    fn layout_for(native: Size) -> DisplayLayout {
        compute_display_layout(native, Size::new(800, 800), 50, Rotation::NONE)
    }

    #[test]
    fn test_unmounted_registry() {
        let mut layers = LayerRegistry::new();
        assert!(!layers.is_mounted());
        assert!(layers.get(LayerKind::Overlay).is_none());
        assert!(layers.get_mut(LayerKind::Blur).is_none());
        assert!(layers.size().is_none());
    }

    #[test]
    fn test_resize_syncs_all_layers() {
        let mut layers = LayerRegistry::new();
        let native = Size::new(1000, 500);
        layers.resize(native, &layout_for(native));

        for kind in LayerKind::ALL {
            let surface = layers.get(kind).unwrap();
            assert_eq!(surface.kind(), kind);
            assert_eq!(surface.size(), native);
            assert!((surface.display_size().width - 700.0).abs() < 1e-9);
            assert!((surface.display_size().height - 350.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_resize_clears_content() {
        let mut layers = LayerRegistry::new();
        let native = Size::new(4, 4);
        layers.resize(native, &layout_for(native));
        layers
            .get_mut(LayerKind::Image)
            .unwrap()
            .pixels_mut()
            .put_pixel(1, 1, Rgba([255, 0, 0, 255]));

        let bigger = Size::new(8, 6);
        layers.resize(bigger, &layout_for(bigger));
        let image = layers.get(LayerKind::Image).unwrap();
        assert_eq!(image.size(), bigger);
        assert!(image.pixels().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_relayout_keeps_pixels() {
        let mut layers = LayerRegistry::new();
        let native = Size::new(4, 4);
        layers.resize(native, &layout_for(native));
        layers
            .get_mut(LayerKind::Overlay)
            .unwrap()
            .pixels_mut()
            .put_pixel(0, 0, Rgba([1, 2, 3, 4]));

        let wider = compute_display_layout(native, Size::new(400, 400), 0, Rotation::NONE);
        layers.relayout(&wider);

        assert_eq!(layers.display_size().unwrap().width, 400.0);
        assert_eq!(
            layers.get(LayerKind::Overlay).unwrap().pixels().get_pixel(0, 0).0,
            [1, 2, 3, 4]
        );
        for kind in LayerKind::ALL {
            assert_eq!(layers.get(kind).unwrap().display_size().width, 400.0);
        }
    }

    #[test]
    fn test_draw_image_size_mismatch() {
        let mut layers = LayerRegistry::new();
        let native = Size::new(4, 4);
        layers.resize(native, &layout_for(native));
        let surface = layers.get_mut(LayerKind::Image).unwrap();

        assert!(!surface.draw_image(&RgbaImage::new(3, 4)));
        assert!(surface.draw_image(&RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255]))));
        assert_eq!(surface.pixels().get_pixel(3, 3).0, [9, 9, 9, 255]);

        surface.clear();
        assert_eq!(surface.pixels().get_pixel(3, 3).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_unmount() {
        let mut layers = LayerRegistry::new();
        let native = Size::new(2, 2);
        layers.resize(native, &layout_for(native));
        layers.unmount();
        assert!(!layers.is_mounted());
    }
}
