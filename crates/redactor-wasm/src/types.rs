//! WASM-compatible wrapper types for image data.
//!
//! These types wrap the core Redactor types, handling the conversion between
//! Rust and JavaScript data representations.

use redactor_core::decode::DecodedImage;
use redactor_core::editor::ExportedImage;
use wasm_bindgen::prelude::*;

/// A decoded image wrapper for JavaScript.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy is made
/// to JavaScript memory as a `Uint8Array`. The buffer can be handed straight to
/// `new ImageData(new Uint8ClampedArray(pixels), width, height)`.
#[wasm_bindgen]
pub struct JsDecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsDecodedImage {
    /// Create a new JsDecodedImage from dimensions and pixel data.
    ///
    /// # Arguments
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsDecodedImage {
        JsDecodedImage {
            width,
            height,
            pixels,
        }
    }

    /// Get the image width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the image height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data as Uint8Array (copied).
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsDecodedImage {
    pub(crate) fn from_decoded(img: DecodedImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            pixels: img.pixels,
        }
    }

    /// Convert back to a core DecodedImage, validating the buffer length.
    pub(crate) fn to_decoded(&self) -> Result<DecodedImage, redactor_core::decode::DecodeError> {
        DecodedImage::from_rgba(self.width, self.height, self.pixels.clone())
    }
}

/// One exported crop, PNG-encoded and named for download.
#[wasm_bindgen]
pub struct JsExportedImage {
    file_name: String,
    width: u32,
    height: u32,
    png: Vec<u8>,
}

#[wasm_bindgen]
impl JsExportedImage {
    /// Suggested download name, e.g. `image-1.png`
    #[wasm_bindgen(getter)]
    pub fn file_name(&self) -> String {
        self.file_name.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// PNG file bytes (copied). Wrap in a `Blob` with type `image/png` to download.
    pub fn bytes(&self) -> Vec<u8> {
        self.png.clone()
    }
}

impl From<ExportedImage> for JsExportedImage {
    fn from(image: ExportedImage) -> Self {
        Self {
            file_name: image.file_name,
            width: image.width,
            height: image.height,
            png: image.png,
        }
    }
}
