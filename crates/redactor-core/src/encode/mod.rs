//! Image encoding for export.
//!
//! This module provides:
//! - Encoding RGBA images to PNG, the only export format
//!
//! # Examples
//!
//! ```ignore
//! use redactor_core::encode::encode_png;
//!
//! let pixels = vec![128u8; 100 * 100 * 4]; // Gray image
//! let png_bytes = encode_png(&pixels, 100, 100).unwrap();
//! println!("Encoded {} bytes", png_bytes.len());
//! ```

mod png;

pub use png::{encode_png, encode_rgba_image, EncodeError};
