//! Cropping a raw photo down to the user's selection.

use crate::error::{HeadshotError, Result};
use crate::types::{ImageFormat, RawImage, SourceImage};
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::str::FromStr;

/// A user-drawn crop rectangle, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropSelection {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width of the selection.
    pub width: u32,
    /// Height of the selection.
    pub height: u32,
}

impl CropSelection {
    /// Creates a selection.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The largest square centred in a `width` x `height` image.
    pub fn centered_square(width: u32, height: u32) -> Self {
        let side = width.min(height);
        Self {
            x: (width - side) / 2,
            y: (height - side) / 2,
            width: side,
            height: side,
        }
    }

    /// Trims the selection so it lies inside a `width` x `height` image.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Self {
            x,
            y,
            width: self.width.min(width - x),
            height: self.height.min(height - y),
        }
    }

    /// Checks the selection is non-empty and fully inside the image.
    pub fn validate(&self, width: u32, height: u32) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(HeadshotError::InvalidRequest(
                "crop selection is empty".into(),
            ));
        }
        let right = self.x.checked_add(self.width);
        let bottom = self.y.checked_add(self.height);
        match (right, bottom) {
            (Some(r), Some(b)) if r <= width && b <= height => Ok(()),
            _ => Err(HeadshotError::InvalidRequest(format!(
                "crop selection {self} exceeds image bounds {width}x{height}"
            ))),
        }
    }
}

impl std::fmt::Display for CropSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

/// Parses `x,y,width,height`.
impl FromStr for CropSelection {
    type Err = HeadshotError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let invalid = || HeadshotError::InvalidRequest(format!("invalid crop '{s}', expected x,y,width,height"));
        if parts.len() != 4 {
            return Err(invalid());
        }
        let mut nums = [0u32; 4];
        for (slot, part) in nums.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| invalid())?;
        }
        Ok(Self::new(nums[0], nums[1], nums[2], nums[3]))
    }
}

/// Returns the pixel dimensions of an encoded image.
pub fn dimensions(raw: &RawImage) -> Result<(u32, u32)> {
    Ok(decode(raw)?.dimensions())
}

/// Crops `raw` to `selection` and re-encodes it.
///
/// The result keeps the source format; anything the encoder cannot write
/// falls back to PNG.
pub fn crop(raw: &RawImage, selection: CropSelection) -> Result<SourceImage> {
    let img = decode(raw)?;
    let (width, height) = img.dimensions();
    selection.validate(width, height)?;

    let cropped = img.crop_imm(selection.x, selection.y, selection.width, selection.height);

    let (data, format) = match encode(&cropped, raw.format) {
        Ok(data) => (data, raw.format),
        Err(e) => {
            tracing::debug!(format = ?raw.format, "re-encoding crop as PNG: {e}");
            (encode(&cropped, ImageFormat::Png)?, ImageFormat::Png)
        }
    };
    let (width, height) = cropped.dimensions();

    Ok(SourceImage {
        data,
        format,
        width,
        height,
    })
}

fn decode(raw: &RawImage) -> Result<DynamicImage> {
    Ok(image::load_from_memory_with_format(
        &raw.data,
        raw.format.to_image_crate(),
    )?)
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        // JPEG has no alpha channel.
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_to(&mut buf, format.to_image_crate())?,
        _ => img.write_to(&mut buf, format.to_image_crate())?,
    }
    Ok(buf.into_inner())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::ImageOrigin;
    use image::{Rgb, RgbImage};

    /// Encodes a solid-colour PNG of the given size.
    pub(crate) fn png_fixture(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn raw_png(width: u32, height: u32) -> RawImage {
        RawImage::new(png_fixture(width, height, [200, 120, 80]), ImageOrigin::Bytes).unwrap()
    }

    #[test]
    fn test_centered_square() {
        assert_eq!(CropSelection::centered_square(400, 300), CropSelection::new(50, 0, 300, 300));
        assert_eq!(CropSelection::centered_square(300, 400), CropSelection::new(0, 50, 300, 300));
    }

    #[test]
    fn test_clamp_to() {
        let sel = CropSelection::new(80, 90, 50, 50).clamp_to(100, 100);
        assert_eq!(sel, CropSelection::new(80, 90, 20, 10));

        let off_image = CropSelection::new(150, 10, 20, 20).clamp_to(100, 100);
        assert_eq!(off_image.width, 0);
    }

    #[test]
    fn test_validate() {
        assert!(CropSelection::new(0, 0, 100, 100).validate(100, 100).is_ok());
        assert!(CropSelection::new(0, 0, 0, 10).validate(100, 100).is_err());
        assert!(CropSelection::new(50, 0, 51, 10).validate(100, 100).is_err());
        assert!(CropSelection::new(u32::MAX, 0, 2, 10).validate(100, 100).is_err());
    }

    #[test]
    fn test_parse() {
        let sel: CropSelection = "10, 20,30,40".parse().unwrap();
        assert_eq!(sel, CropSelection::new(10, 20, 30, 40));
        assert_eq!(sel.to_string(), "10,20,30,40");

        assert!("10,20,30".parse::<CropSelection>().is_err());
        assert!("a,b,c,d".parse::<CropSelection>().is_err());
    }

    #[test]
    fn test_crop_produces_selected_size() {
        let raw = raw_png(64, 48);
        assert_eq!(dimensions(&raw).unwrap(), (64, 48));

        let source = crop(&raw, CropSelection::new(8, 4, 32, 40)).unwrap();
        assert_eq!((source.width, source.height), (32, 40));
        assert_eq!(source.format, ImageFormat::Png);
        assert_eq!(ImageFormat::from_magic_bytes(&source.data), Some(ImageFormat::Png));
    }

    #[test]
    fn test_crop_out_of_bounds_is_rejected() {
        let raw = raw_png(20, 20);
        let err = crop(&raw, CropSelection::new(10, 10, 20, 20)).unwrap_err();
        assert!(matches!(err, HeadshotError::InvalidRequest(_)));
    }

    #[test]
    fn test_corrupt_image_surfaces_image_error() {
        let mut data = png_fixture(4, 4, [0, 0, 0]);
        data.truncate(20);
        let raw = RawImage::new(data, ImageOrigin::Bytes).unwrap();
        assert!(matches!(
            crop(&raw, CropSelection::new(0, 0, 1, 1)),
            Err(HeadshotError::Image(_))
        ));
    }
}
