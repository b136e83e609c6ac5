//! Pixel-window and orientation transforms.
//!
//! These are the primitives export and rotation are built from. Both take an
//! image by reference and return a new buffer; nothing here mutates layers.
//!
//! # Coordinate System
//!
//! - Crop windows are [`PixelRect`](crate::geometry::PixelRect)s in source pixels
//! - Rotation is clockwise, in whole quarter turns
//! - Origin is top-left corner

mod crop;
mod rotation;

pub use crop::{crop_region, paste_region};
pub use rotation::{apply_rotation, rotate_rect};
