//! JPEG and PNG decoding with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageFormat, ImageReader};

use super::{DecodeError, DecodedImage, Orientation};

/// MIME types the editor accepts.
const SUPPORTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/pjpeg", "image/png"];

/// Check whether a file's declared MIME type is one the editor accepts.
pub fn is_supported_mime(mime: &str) -> bool {
    let mime = mime.trim().to_ascii_lowercase();
    SUPPORTED_MIME_TYPES.contains(&mime.as_str())
}

/// Detect JPEG or PNG from the leading bytes.
pub fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    match image::guess_format(bytes) {
        Ok(format @ (ImageFormat::Jpeg | ImageFormat::Png)) => Some(format),
        _ => None,
    }
}

/// Decode a user-selected file, applying EXIF orientation correction.
///
/// # Arguments
///
/// * `bytes` - Raw file bytes
/// * `mime` - The MIME type the host reported for the file
///
/// # Errors
///
/// Returns `DecodeError::UnsupportedType` if `mime` is not JPEG or PNG,
/// `DecodeError::InvalidFormat` if the content is not JPEG or PNG, and
/// `DecodeError::CorruptedFile` if decoding fails.
pub fn decode_image(bytes: &[u8], mime: &str) -> Result<DecodedImage, DecodeError> {
    if !is_supported_mime(mime) {
        return Err(DecodeError::UnsupportedType(mime.to_string()));
    }
    let format = sniff_format(bytes).ok_or(DecodeError::InvalidFormat)?;

    // PNG carries no EXIF orientation in practice
    let orientation = match format {
        ImageFormat::Jpeg => extract_orientation(bytes),
        _ => Orientation::Normal,
    };

    let mut reader = ImageReader::new(Cursor::new(bytes));
    reader.set_format(format);
    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let rgba = apply_orientation(img, orientation).into_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(DecodeError::EmptyImage);
    }
    Ok(DecodedImage::from_rgba_image(rgba))
}

/// Extract EXIF orientation from JPEG bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    let Ok(exif) = Reader::new().read_from_container(&mut cursor) else {
        return Orientation::Normal;
    };
    exif.get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .map(Orientation::from)
        .unwrap_or_default()
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
