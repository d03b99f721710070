//! Core image types shared by acquisition, cropping and the studio.

use crate::encode::{decode_base64_lenient, encode_base64};
use crate::error::{HeadshotError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name offered for the generated headshot.
pub const DOWNLOAD_FILE_NAME: &str = "headshot.png";

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Parses a MIME type as reported by the generation service.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }

    pub(crate) fn to_image_crate(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::WebP => image::ImageFormat::WebP,
        }
    }
}

/// Where a raw image came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOrigin {
    /// Picked from the filesystem.
    File(PathBuf),
    /// Captured from a camera.
    Camera,
    /// Handed over as an in-memory buffer (stdin, clipboard, ...).
    Bytes,
}

/// An acquired photo that has not been cropped yet.
#[derive(Debug, Clone)]
pub struct RawImage {
    /// Encoded image bytes.
    pub data: Vec<u8>,
    /// Format detected from the bytes.
    pub format: ImageFormat,
    /// Where the image came from.
    pub origin: ImageOrigin,
}

impl RawImage {
    /// Wraps encoded bytes, rejecting empty or unrecognised blobs.
    pub fn new(data: Vec<u8>, origin: ImageOrigin) -> Result<Self> {
        if data.is_empty() {
            return Err(HeadshotError::InvalidRequest("image is empty".into()));
        }
        let format = ImageFormat::from_magic_bytes(&data).ok_or_else(|| {
            HeadshotError::InvalidRequest("unsupported image type (expected PNG, JPEG or WebP)".into())
        })?;
        Ok(Self {
            data,
            format,
            origin,
        })
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// The user's current photo, post-crop. Used as generation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Encoded image bytes.
    pub data: Vec<u8>,
    /// Image format.
    pub format: ImageFormat,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

impl SourceImage {
    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Data URL used to preview the photo.
    pub fn preview_url(&self) -> String {
        data_url(self.format, &encode_base64(&self.data))
    }
}

/// A generated headshot, kept in the base64 form the service returned.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "generated headshot should be displayed or saved"]
pub struct GeneratedHeadshot {
    base64: String,
    format: ImageFormat,
}

impl GeneratedHeadshot {
    /// Wraps a base64 result (no data-URI prefix).
    ///
    /// The format is sniffed from the decoded bytes and defaults to PNG.
    pub fn from_base64(base64: impl Into<String>) -> Self {
        let base64 = base64.into();
        let format = decode_base64_lenient(&base64)
            .ok()
            .and_then(|bytes| ImageFormat::from_magic_bytes(&bytes))
            .unwrap_or_default();
        Self { base64, format }
    }

    /// The base64 payload as returned by the service.
    pub fn base64(&self) -> &str {
        &self.base64
    }

    /// Detected image format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Returns the image as a data URL for display.
    pub fn to_data_url(&self) -> String {
        data_url(self.format, &self.base64)
    }

    /// Returns the downloadable artifact.
    pub fn download(&self) -> Download {
        Download {
            file_name: DOWNLOAD_FILE_NAME,
            data_url: self.to_data_url(),
        }
    }
}

/// A downloadable image file presented as a data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Download {
    /// Fixed file name offered to the user.
    pub file_name: &'static str,
    /// `data:<mime>;base64,<payload>`.
    pub data_url: String,
}

impl Download {
    /// Decodes the payload and writes it to `dir/<file_name>`.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let bytes = decode_base64_lenient(&self.data_url)
            .map_err(|e| HeadshotError::Decode(e.to_string()))?;
        let path = dir.as_ref().join(self.file_name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// Builds a `data:` URL from an already encoded payload.
pub fn data_url(format: ImageFormat, base64: &str) -> String {
    format!("data:{};base64,{}", format.mime_type(), base64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a......"), None);
        assert_eq!(ImageFormat::from_magic_bytes(&[0x89, 0x50]), None);
    }

    #[test]
    fn test_format_from_mime_type() {
        assert_eq!(ImageFormat::from_mime_type("image/PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_mime_type("image/jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime_type("text/plain"), None);
    }

    #[test]
    fn test_raw_image_rejects_empty_and_unknown() {
        assert!(matches!(
            RawImage::new(Vec::new(), ImageOrigin::Bytes),
            Err(HeadshotError::InvalidRequest(_))
        ));
        assert!(matches!(
            RawImage::new(b"not an image at all".to_vec(), ImageOrigin::Bytes),
            Err(HeadshotError::InvalidRequest(_))
        ));

        let raw = RawImage::new(JPEG_MAGIC.to_vec(), ImageOrigin::Camera).unwrap();
        assert_eq!(raw.format, ImageFormat::Jpeg);
        assert_eq!(raw.size(), 12);
    }

    #[test]
    fn test_generated_headshot_wraps_payload_verbatim() {
        let headshot = GeneratedHeadshot::from_base64("ABC123");
        assert_eq!(headshot.to_data_url(), "data:image/png;base64,ABC123");

        let download = headshot.download();
        assert_eq!(download.file_name, "headshot.png");
        assert_eq!(download.data_url, "data:image/png;base64,ABC123");
    }

    #[test]
    fn test_generated_headshot_sniffs_jpeg() {
        let headshot = GeneratedHeadshot::from_base64(encode_base64(&JPEG_MAGIC));
        assert_eq!(headshot.format(), ImageFormat::Jpeg);
        assert!(headshot.to_data_url().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_download_save_writes_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let download = GeneratedHeadshot::from_base64(encode_base64(&PNG_MAGIC)).download();

        let path = download.save(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "headshot.png");
        assert_eq!(std::fs::read(path).unwrap(), PNG_MAGIC.to_vec());
    }

    #[test]
    fn test_source_preview_url() {
        let source = SourceImage {
            data: PNG_MAGIC.to_vec(),
            format: ImageFormat::Png,
            width: 1,
            height: 1,
        };
        assert_eq!(
            source.preview_url(),
            format!("data:image/png;base64,{}", encode_base64(&PNG_MAGIC))
        );
    }
}
