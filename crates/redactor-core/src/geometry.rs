//! Coordinate spaces and display layout.
//!
//! Pointer events arrive in display space: the on-screen box of a surface whose
//! CSS size differs from its pixel buffer. Selections, layers and exports all work
//! in image-native space. Points and rectangles carry their space as a type
//! parameter, so a display coordinate can never be handed to code that expects an
//! image coordinate.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner in both spaces
//! - Display coordinates are CSS pixels (real-valued)
//! - Image coordinates are source pixels (real-valued until committed)

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// Marker for on-screen (CSS pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Display;

/// Marker for source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageSpace;

/// A coordinate space tag.
pub trait CoordinateSpace: Copy + Default + fmt::Debug + PartialEq {}

impl CoordinateSpace for Display {}
impl CoordinateSpace for ImageSpace {}

/// Integer pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width and height exchanged.
    pub const fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// True when either dimension is zero.
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Real-valued on-screen dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplaySize {
    pub width: f64,
    pub height: f64,
}

/// A point tagged with its coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point<S: CoordinateSpace> {
    pub x: f64,
    pub y: f64,
    space: PhantomData<S>,
}

impl<S: CoordinateSpace> Point<S> {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            space: PhantomData,
        }
    }
}

/// A rectangle tagged with its coordinate space.
///
/// Width and height may be negative while a drag is in progress: the origin is
/// where the drag started and the extent points toward the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect<S: CoordinateSpace> {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    space: PhantomData<S>,
}

impl<S: CoordinateSpace> Rect<S> {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            space: PhantomData,
        }
    }

    /// Zero-sized rectangle anchored at `origin`.
    pub fn at(origin: Point<S>) -> Self {
        Self::new(origin.x, origin.y, 0.0, 0.0)
    }

    pub fn origin(&self) -> Point<S> {
        Point::new(self.x, self.y)
    }
}

pub type DisplayPoint = Point<Display>;
pub type DisplayRect = Rect<Display>;
pub type ImagePoint = Point<ImageSpace>;
pub type ImageRect = Rect<ImageSpace>;

/// A normalized, integer-aligned rectangle in image-native pixels.
///
/// This is the form regions take once committed, and the only form used as a
/// read or write window on pixel buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Snap an image-space rectangle to whole pixels inside `bounds`.
    ///
    /// The rectangle is normalized first, so negative drags resolve to the
    /// span `min(x, x + width)..max(x, x + width)`. Returns `None` when nothing
    /// of the rectangle remains after rounding and clipping.
    pub fn from_image_rect(rect: &ImageRect, bounds: Size) -> Option<Self> {
        let rect = normalize_rectangle(rect);
        let clip = |v: f64, max: u32| v.round().clamp(0.0, max as f64) as u32;

        let left = clip(rect.x, bounds.width);
        let top = clip(rect.y, bounds.height);
        let right = clip(rect.x + rect.width, bounds.width);
        let bottom = clip(rect.y + rect.height, bounds.height);

        let snapped = Self::new(left, top, right - left, bottom - top);
        (!snapped.is_empty()).then_some(snapped)
    }
}

/// Discrete clockwise rotation, always kept in `0..360` degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rotation(i32);

impl Rotation {
    pub const NONE: Rotation = Rotation(0);

    /// Wrap any angle into `0..360`.
    pub fn new(degrees: i32) -> Self {
        Self(degrees.rem_euclid(360))
    }

    pub fn degrees(self) -> i32 {
        self.0
    }

    /// Rotate by `delta` degrees (negative = counter-clockwise).
    pub fn step(self, delta: i32) -> Self {
        Self::new(self.0 + delta.rem_euclid(360))
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// True unless the angle is a multiple of 180 degrees.
    pub fn swaps_dimensions(self) -> bool {
        self.0 % 180 != 0
    }

    /// Dimensions of an image of `size` after this rotation.
    pub fn apply_to(self, size: Size) -> Size {
        if self.swaps_dimensions() {
            size.swapped()
        } else {
            size
        }
    }
}

/// How the image is shown inside its container.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayLayout {
    /// On-screen size of every layer.
    pub display_size: DisplaySize,
    /// Display pixels per image pixel.
    pub scale: f64,
    pub rotation: Rotation,
}

/// Fit an image into its container, preserving aspect ratio.
///
/// The available area is `container - 2 * padding`. When the rotation is not a
/// multiple of 180 degrees the image dimensions are exchanged before fitting.
/// The larger image dimension is mapped exactly onto the matching container
/// dimension and the other is scaled proportionally; if that would overflow the
/// other container dimension (non-square containers) the image is letterboxed
/// on the tighter axis instead.
pub fn compute_display_layout(
    native: Size,
    container: Size,
    padding: u32,
    rotation: Rotation,
) -> DisplayLayout {
    let oriented = rotation.apply_to(native);
    if oriented.is_empty() {
        return DisplayLayout {
            rotation,
            ..Default::default()
        };
    }

    let inset = 2.0 * padding as f64;
    let avail_w = (container.width as f64 - inset).max(0.0);
    let avail_h = (container.height as f64 - inset).max(0.0);
    let (w, h) = (oriented.width as f64, oriented.height as f64);

    let mut scale = if w >= h { avail_w / w } else { avail_h / h };
    if w * scale > avail_w || h * scale > avail_h {
        scale = (avail_w / w).min(avail_h / h);
    }

    DisplayLayout {
        display_size: DisplaySize {
            width: w * scale,
            height: h * scale,
        },
        scale,
        rotation,
    }
}

/// Map a pointer position to source pixels.
///
/// `display_rect` must be the surface's bounding box at the time of the event;
/// the point is in the same (client) coordinates as the box. Returns `None`
/// when the surface has no on-screen extent.
pub fn to_image_space(
    point: DisplayPoint,
    display_rect: &DisplayRect,
    native: Size,
) -> Option<ImagePoint> {
    if display_rect.width <= 0.0 || display_rect.height <= 0.0 {
        return None;
    }
    Some(ImagePoint::new(
        (point.x - display_rect.x) * native.width as f64 / display_rect.width,
        (point.y - display_rect.y) * native.height as f64 / display_rect.height,
    ))
}

/// Inverse of [`to_image_space`].
pub fn to_display_space(
    point: ImagePoint,
    display_rect: &DisplayRect,
    native: Size,
) -> Option<DisplayPoint> {
    if native.is_empty() {
        return None;
    }
    Some(DisplayPoint::new(
        point.x * display_rect.width / native.width as f64 + display_rect.x,
        point.y * display_rect.height / native.height as f64 + display_rect.y,
    ))
}

/// Flip a rectangle so width and height are non-negative.
pub fn normalize_rectangle<S: CoordinateSpace>(rect: &Rect<S>) -> Rect<S> {
    let (x, width) = if rect.width < 0.0 {
        (rect.x + rect.width, -rect.width)
    } else {
        (rect.x, rect.width)
    };
    let (y, height) = if rect.height < 0.0 {
        (rect.y + rect.height, -rect.height)
    } else {
        (rect.y, rect.height)
    };
    Rect::new(x, y, width, height)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
