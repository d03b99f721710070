//! Generator trait and the request it consumes.

use crate::encode::decode_base64_lenient;
use crate::error::Result;
use crate::style::{Attire, Background, StyleOptions};
use crate::types::ImageFormat;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A request to turn a photo into a headshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadshotRequest {
    /// The cropped photo, base64 without a data-URI prefix.
    pub image: String,
    /// Requested clothing.
    pub attire: Attire,
    /// Requested backdrop.
    pub background: Background,
    /// Whether extra retouching was requested.
    pub enhanced: bool,
}

impl HeadshotRequest {
    /// Creates a request from an encoded photo and the chosen style.
    pub fn new(image: impl Into<String>, style: StyleOptions) -> Self {
        Self {
            image: image.into(),
            attire: style.attire,
            background: style.background,
            enhanced: style.enhanced,
        }
    }

    /// The style portion of the request.
    pub fn style(&self) -> StyleOptions {
        StyleOptions {
            attire: self.attire,
            background: self.background,
            enhanced: self.enhanced,
        }
    }

    /// Format of the encoded photo, sniffed from its first bytes.
    pub fn image_format(&self) -> ImageFormat {
        // 16 base64 chars decode to the 12 bytes the magic check needs.
        let head: String = self.image.chars().take(16).collect();
        decode_base64_lenient(&head)
            .ok()
            .and_then(|bytes| ImageFormat::from_magic_bytes(&bytes))
            .unwrap_or_default()
    }
}

/// A remote (or local) service that produces headshots.
///
/// `Ok(Some(base64))` is a finished image, `Ok(None)` means the service
/// answered but produced nothing usable (typically no face in the photo).
/// Transport and service failures are `Err`.
#[async_trait]
pub trait HeadshotGenerator: Send + Sync {
    /// Generates a headshot for the given request.
    async fn generate(&self, request: &HeadshotRequest) -> Result<Option<String>>;

    /// Returns the name of this generator for display.
    fn name(&self) -> &str;

    /// Checks if the service is reachable and authenticated.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<T: HeadshotGenerator + ?Sized> HeadshotGenerator for Arc<T> {
    async fn generate(&self, request: &HeadshotRequest) -> Result<Option<String>> {
        (**self).generate(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    async fn health_check(&self) -> Result<()> {
        (**self).health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_base64;

    #[test]
    fn test_request_from_style() {
        let style = StyleOptions::new(Attire::Blazer, Background::Outdoor).with_enhanced(true);
        let req = HeadshotRequest::new("AAAA", style);
        assert_eq!(req.image, "AAAA");
        assert_eq!(req.style(), style);
    }

    #[test]
    fn test_request_wire_shape() {
        let req = HeadshotRequest::new("AAAA", StyleOptions::default());
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "image": "AAAA",
                "attire": "business-suit",
                "background": "office",
                "enhanced": false,
            })
        );
    }

    #[test]
    fn test_image_format_sniffing() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3];
        let req = HeadshotRequest::new(encode_base64(&jpeg), StyleOptions::default());
        assert_eq!(req.image_format(), ImageFormat::Jpeg);

        let unknown = HeadshotRequest::new("ABC123", StyleOptions::default());
        assert_eq!(unknown.image_format(), ImageFormat::Png);
    }
}
