//! Source image loading and preview sizing

use std::path::{Path, PathBuf};

use anyhow::Context;
use image::{RgbImage, RgbaImage};

/// Upper bound for the longer preview side, in logical units.
pub const MAX_PREVIEW_DIM: u32 = 500;

/// An uploaded equation image with both raw RGBA data and a display handle
#[derive(Clone, Debug)]
pub struct SourceImage {
    pub path: PathBuf,
    pub rgba: RgbaImage,
    pub handle: cosmic::widget::image::Handle,
}

impl SourceImage {
    /// Decode the image at `path` for display and inference.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let decoded = image::open(path)
            .with_context(|| format!("failed to decode image '{}'", path.display()))?;
        let rgba = decoded.to_rgba8();
        log::debug!(
            "Loaded {}: {}x{} pixels",
            path.display(),
            rgba.width(),
            rgba.height()
        );
        let handle = cosmic::widget::image::Handle::from_rgba(
            rgba.width(),
            rgba.height(),
            rgba.clone().into_vec(),
        );
        Ok(Self {
            path: path.to_path_buf(),
            rgba,
            handle,
        })
    }

    /// Get the width of the image
    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    /// Get the height of the image
    pub fn height(&self) -> u32 {
        self.rgba.height()
    }

    /// Display size bounded by [`MAX_PREVIEW_DIM`] on the longer side,
    /// preserving aspect ratio.
    pub fn preview_size(&self) -> (u32, u32) {
        preview_size(self.width(), self.height())
    }

    /// RGB copy in the channel order the recognition model expects.
    pub fn inference_image(&self) -> RgbImage {
        image::DynamicImage::ImageRgba8(self.rgba.clone()).to_rgb8()
    }
}

pub fn preview_size(width: u32, height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    if width > height {
        let new_width = width.min(MAX_PREVIEW_DIM);
        let new_height = ((height as f64 / width as f64) * new_width as f64) as u32;
        (new_width, new_height)
    } else {
        let new_height = height.min(MAX_PREVIEW_DIM);
        let new_width = ((width as f64 / height as f64) * new_height as f64) as u32;
        (new_width, new_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_size_landscape() {
        assert_eq!(preview_size(1000, 400), (500, 200));
    }

    #[test]
    fn test_preview_size_portrait() {
        assert_eq!(preview_size(400, 1000), (200, 500));
    }

    #[test]
    fn test_preview_size_small_image_unscaled() {
        assert_eq!(preview_size(320, 200), (320, 200));
        assert_eq!(preview_size(200, 320), (200, 320));
    }

    #[test]
    fn test_preview_size_square() {
        // Square goes through the portrait branch
        assert_eq!(preview_size(800, 800), (500, 500));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = SourceImage::load(Path::new("/nonexistent/equation.png")).unwrap_err();
        assert!(err.to_string().contains("failed to decode image"));
    }

    #[test]
    fn test_load_corrupt_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"not an image at all").unwrap();
        assert!(SourceImage::load(&path).is_err());
    }

    #[test]
    fn test_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eq.png");
        let img = RgbaImage::from_pixel(8, 4, image::Rgba([10, 20, 30, 255]));
        img.save(&path).unwrap();

        let source = SourceImage::load(&path).unwrap();
        assert_eq!((source.width(), source.height()), (8, 4));

        let rgb = source.inference_image();
        assert_eq!(rgb.get_pixel(0, 0), &image::Rgb([10, 20, 30]));
    }
}
