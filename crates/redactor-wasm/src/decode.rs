//! Image decoding WASM bindings.
//!
//! # Functions
//!
//! - [`is_supported_image`] - Check whether a file's MIME type can be opened
//! - [`decode_image`] - Decode a JPEG or PNG file to RGBA pixels
//!
//! # Example
//!
//! ```typescript
//! import { decode_image, is_supported_image } from '@redactor/wasm';
//!
//! if (is_supported_image(file.type)) {
//!   const bytes = new Uint8Array(await file.arrayBuffer());
//!   const image = decode_image(bytes, file.type);
//!   console.log(`Decoded ${image.width}x${image.height}`);
//! }
//! ```

use crate::types::JsDecodedImage;
use redactor_core::decode;
use wasm_bindgen::prelude::*;

/// Check whether the editor accepts files of this MIME type (JPEG or PNG).
#[wasm_bindgen]
pub fn is_supported_image(mime: &str) -> bool {
    decode::is_supported_mime(mime)
}

/// Decode a JPEG or PNG file to RGBA pixels.
///
/// JPEG EXIF orientation is applied, so the result is upright.
///
/// # Errors
///
/// Returns an error if the MIME type is unsupported or the bytes are not a
/// valid JPEG or PNG.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8], mime: &str) -> Result<JsDecodedImage, JsValue> {
    decode::decode_image(bytes, mime)
        .map(JsDecodedImage::from_decoded)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
