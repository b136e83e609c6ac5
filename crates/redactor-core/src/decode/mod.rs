//! Turning user-selected files into RGBA pixels.
//!
//! This module provides:
//! - MIME-type screening of user selections (JPEG and PNG only)
//! - Content sniffing, so a mislabelled file is still rejected
//! - Decoding with EXIF orientation applied, matching what the browser shows
//! - Wrapping pixels the host already decoded (e.g. via `createImageBitmap`)
//!
//! # Architecture
//!
//! Decoding is synchronous. The editor treats a load as a one-shot request
//! identified by a ticket; see [`Editor::begin_load`](crate::editor::Editor::begin_load).
//!
//! # Examples
//!
//! ```ignore
//! use redactor_core::decode::{decode_image, is_supported_mime};
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! if is_supported_mime("image/jpeg") {
//!     let image = decode_image(&bytes, "image/jpeg").unwrap();
//!     println!("Decoded {}x{} image", image.width, image.height);
//! }
//! ```

mod raster;
mod types;

pub use raster::{decode_image, is_supported_mime, sniff_format};
pub use types::{DecodeError, DecodedImage, Orientation};
