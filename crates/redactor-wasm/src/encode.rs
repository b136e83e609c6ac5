//! Image encoding WASM bindings.
//!
//! # Functions
//!
//! - [`encode_png`] - Encode RGBA pixel data to PNG bytes
//! - [`encode_png_from_image`] - Encode a JsDecodedImage to PNG bytes
//!
//! # Example
//!
//! ```typescript
//! import { encode_png } from '@redactor/wasm';
//!
//! const imageData = ctx.getImageData(0, 0, w, h);
//! const png = encode_png(new Uint8Array(imageData.data.buffer), w, h);
//! ```

use crate::types::JsDecodedImage;
use redactor_core::encode;
use wasm_bindgen::prelude::*;

/// Encode RGBA pixel data to PNG bytes.
///
/// # Errors
///
/// Returns an error if the pixel data length doesn't match width * height * 4,
/// or if either dimension is zero.
#[wasm_bindgen]
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, JsValue> {
    encode::encode_png(pixels, width, height).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Encode a JsDecodedImage to PNG bytes.
#[wasm_bindgen]
pub fn encode_png_from_image(image: &JsDecodedImage) -> Result<Vec<u8>, JsValue> {
    encode_png(&image.pixels(), image.width(), image.height())
}
