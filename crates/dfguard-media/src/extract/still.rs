//! Single-image extraction.
//!
//! No face detection runs on this path: the whole picture is resized to one
//! 224x224 crop.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::io::Reader as ImageReader;
use tracing::debug;

use crate::error::{MediaError, MediaResult};
use crate::sample::{FaceCrop, FACE_CROP_SIZE};

/// Load an image file as one classifier-ready crop.
///
/// The format is sniffed from the file's leading bytes; the extension is
/// whatever the client uploaded and may not match the content.
pub fn load_image_crop(path: &Path) -> MediaResult<FaceCrop> {
    let open_err = |reason: String| MediaError::media_open(path, reason);
    let decoded = ImageReader::open(path)
        .map_err(|e| open_err(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| open_err(e.to_string()))?
        .decode()
        .map_err(|e| open_err(e.to_string()))?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(MediaError::media_open(path, "image has zero area"));
    }

    let resized = imageops::resize(&rgb, FACE_CROP_SIZE, FACE_CROP_SIZE, FilterType::Triangle);
    debug!(path = %path.display(), width, height, "Loaded image");
    FaceCrop::from_rgb(&resized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, RgbaImage};

    #[test]
    fn test_png_is_resized_to_crop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.png");
        RgbImage::from_pixel(300, 150, Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();

        let crop = load_image_crop(&path).unwrap();
        assert_eq!(crop.as_slice().len(), 224 * 224 * 3);
        assert!(crop.as_slice().iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_alpha_channel_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.png");
        RgbaImage::from_pixel(20, 20, image::Rgba([0, 0, 255, 10]))
            .save(&path)
            .unwrap();

        let crop = load_image_crop(&path).unwrap();
        assert_eq!(&crop.as_slice()[..3], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_format_detected_from_content_not_extension() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("source.png");
        RgbImage::from_pixel(40, 40, Rgb([0, 255, 0])).save(&png).unwrap();

        let mislabeled = dir.path().join("upload.jpg");
        std::fs::copy(&png, &mislabeled).unwrap();

        let crop = load_image_crop(&mislabeled).unwrap();
        assert_eq!(&crop.as_slice()[..3], &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_unreadable_image_is_media_open() {
        let file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        std::fs::write(file.path(), b"definitely not a jpeg").unwrap();
        assert!(matches!(
            load_image_crop(file.path()),
            Err(MediaError::MediaOpen { .. })
        ));
        assert!(matches!(
            load_image_crop(Path::new("/nonexistent/face.png")),
            Err(MediaError::MediaOpen { .. })
        ));
    }
}
