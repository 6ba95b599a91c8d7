//! Upload intake: sniff the encoding from magic bytes and decode the image.
//!
//! Decoding proves the upload is a real raster before any model call is made,
//! and yields the dimensions shown in the audit view.

use image::GenericImageView;

use super::types::{DocumentImage, ImageFormat};
use super::ExtractionError;

/// Detect MIME type from file magic bytes (not extension or Content-Type header).
pub fn detect_mime_from_bytes(bytes: &[u8]) -> &'static str {
    if bytes.len() < 4 {
        return "application/octet-stream";
    }
    // JPEG: FF D8 FF
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }
    // PNG: 89 50 4E 47
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return "image/png";
    }
    if bytes.starts_with(b"%PDF") {
        return "application/pdf";
    }
    if bytes.len() >= 12 && bytes[..4] == *b"RIFF" && bytes[8..12] == *b"WEBP" {
        return "image/webp";
    }
    if bytes.len() >= 12 && bytes[4..8] == *b"ftyp" {
        return "image/heic";
    }
    if bytes.starts_with(b"GIF8") {
        return "image/gif";
    }
    "application/octet-stream"
}

/// Map sniffed bytes to an accepted upload format.
pub fn detect_image_format(bytes: &[u8]) -> Option<ImageFormat> {
    match detect_mime_from_bytes(bytes) {
        "image/jpeg" => Some(ImageFormat::Jpeg),
        "image/png" => Some(ImageFormat::Png),
        _ => None,
    }
}

/// Validate and decode an uploaded document photo.
pub fn load_document_image(bytes: Vec<u8>) -> Result<DocumentImage, ExtractionError> {
    let format = detect_image_format(&bytes).ok_or_else(|| {
        ExtractionError::UnsupportedFormat(format!(
            "{} (only JPEG and PNG are accepted)",
            detect_mime_from_bytes(&bytes)
        ))
    })?;

    let decoder_format = match format {
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
    };
    let decoded = image::load_from_memory_with_format(&bytes, decoder_format)
        .map_err(|e| ExtractionError::ImageProcessing(format!("Cannot decode image: {e}")))?;
    let (width, height) = decoded.dimensions();

    tracing::debug!(
        format = format.mime_type(),
        width,
        height,
        size = bytes.len(),
        "Document image decoded"
    );

    Ok(DocumentImage {
        bytes,
        format,
        width,
        height,
    })
}
