//! Event image encoding.
//!
//! Uploaded images are stored inline as `data:<mime>;base64,<payload>` URLs so
//! the event row carries everything needed to render it.

use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;

/// Default upload limit (5 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Error type for image encoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("Image is empty")]
    Empty,

    #[error("Image cannot be larger than {max_mb}MB")]
    TooLarge { max_mb: usize },

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("File content is not a recognised image (JPG, PNG, GIF or WebP)")]
    UnrecognisedFormat,
}

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Webp => "image/webp",
        }
    }

    /// Detects the format from the file's magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else {
            None
        }
    }
}

/// Validates an uploaded image and encodes it as a base64 data URL.
///
/// The declared content type must be an `image/*` type; the MIME type written
/// into the URL is the one detected from the bytes.
pub fn encode_data_url(
    declared_content_type: &str,
    bytes: &[u8],
    max_bytes: usize,
) -> Result<String, ImageError> {
    let declared = declared_content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !declared.starts_with("image/") {
        return Err(ImageError::UnsupportedContentType(declared));
    }

    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    if bytes.len() > max_bytes {
        return Err(ImageError::TooLarge {
            max_mb: max_bytes / (1024 * 1024),
        });
    }

    let format = ImageFormat::sniff(bytes).ok_or(ImageError::UnrecognisedFormat)?;

    Ok(format!(
        "data:{};base64,{}",
        format.mime_type(),
        STANDARD.encode(bytes)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_encode_png() {
        let mut bytes = PNG_HEADER.to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 13]);
        let url = encode_data_url("image/png", &bytes, DEFAULT_MAX_IMAGE_BYTES).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        let payload = url.trim_start_matches("data:image/png;base64,");
        assert_eq!(STANDARD.decode(payload).unwrap(), bytes);
    }

    #[test]
    fn test_detected_type_wins_over_declared() {
        let bytes = b"GIF89a\x01\x00\x01\x00".to_vec();
        let url = encode_data_url("image/jpeg", &bytes, DEFAULT_MAX_IMAGE_BYTES).unwrap();
        assert!(url.starts_with("data:image/gif;base64,"));
    }

    #[test]
    fn test_content_type_parameters_ignored() {
        let bytes = [0xFF, 0xD8, 0xFF, 0xE0];
        assert!(encode_data_url("Image/JPEG; charset=binary", &bytes, 1024).is_ok());
    }

    #[test]
    fn test_rejects_non_image_content_type() {
        let err = encode_data_url("application/pdf", b"%PDF-1.7", 1024).unwrap_err();
        assert_eq!(
            err,
            ImageError::UnsupportedContentType("application/pdf".to_string())
        );
    }

    #[test]
    fn test_rejects_oversized_upload() {
        let mut bytes = PNG_HEADER.to_vec();
        bytes.resize(DEFAULT_MAX_IMAGE_BYTES + 1, 0);
        let err = encode_data_url("image/png", &bytes, DEFAULT_MAX_IMAGE_BYTES).unwrap_err();
        assert_eq!(err, ImageError::TooLarge { max_mb: 5 });
        assert_eq!(err.to_string(), "Image cannot be larger than 5MB");
    }

    #[test]
    fn test_rejects_unrecognised_bytes() {
        let err = encode_data_url("image/png", b"not an image", 1024).unwrap_err();
        assert_eq!(err, ImageError::UnrecognisedFormat);
    }

    #[test]
    fn test_rejects_empty_body() {
        assert_eq!(
            encode_data_url("image/png", &[], 1024).unwrap_err(),
            ImageError::Empty
        );
    }

    #[test]
    fn test_sniff_webp() {
        let bytes = b"RIFF\x24\x00\x00\x00WEBPVP8 ";
        assert_eq!(ImageFormat::sniff(bytes), Some(ImageFormat::Webp));
        assert_eq!(ImageFormat::sniff(b"RIFF"), None);
    }
}
