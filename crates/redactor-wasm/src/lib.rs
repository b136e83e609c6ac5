//! Redactor WASM - WebAssembly bindings for Redactor
//!
//! This crate exposes the redactor-core editor to JavaScript/TypeScript. The
//! host owns the DOM: it forwards file, button and pointer events to
//! [`JsEditor`] and copies the layer pixels it returns into its canvases.
//!
//! # Module Structure
//!
//! - `editor` - The editor controller binding
//! - `types` - WASM-compatible wrapper types for image data
//! - `decode` - JPEG / PNG decoding bindings
//! - `encode` - PNG encoding bindings
//! - `logger` - Routes `log` records to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsEditor, set_log_level } from '@redactor/wasm';
//!
//! await init();
//! set_log_level('debug');
//!
//! const editor = new JsEditor(undefined);
//! ```

use wasm_bindgen::prelude::*;

mod decode;
mod editor;
mod encode;
mod logger;
mod types;

// Re-export public types
pub use decode::{decode_image, is_supported_image};
pub use editor::{JsEditor, JsLoadTicket};
pub use encode::{encode_png, encode_png_from_image};
pub use types::{JsDecodedImage, JsExportedImage};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    logger::init(log::LevelFilter::Info);
}

/// Change how much the editor logs to the console
/// (`"off"`, `"error"`, `"warn"`, `"info"`, `"debug"` or `"trace"`).
#[wasm_bindgen]
pub fn set_log_level(level: &str) {
    logger::init(logger::parse_level(level));
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
