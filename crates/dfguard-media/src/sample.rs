//! Fixed-shape samples consumed by the classifiers.
//!
//! Shape and value range are checked at construction, so a `FaceCrop` or
//! `AudioWindow` that exists always satisfies the classifier's input contract.

use image::RgbImage;

use crate::error::{MediaError, MediaResult};

/// Side length of a face crop in pixels.
pub const FACE_CROP_SIZE: u32 = 224;

/// Channels in a face crop (RGB).
pub const FACE_CROP_CHANNELS: usize = 3;

/// Sample rate of an audio window in Hz.
pub const AUDIO_SAMPLE_RATE: u32 = 16_000;

/// Number of samples in an audio window (~4.04 s at 16 kHz).
pub const AUDIO_WINDOW_LEN: usize = 64_600;

/// A 224x224x3 RGB patch with values in `[0, 1]`, laid out HWC.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceCrop {
    pixels: Vec<f32>,
}

impl FaceCrop {
    /// Normalize an 8-bit RGB image that is already 224x224.
    pub fn from_rgb(image: &RgbImage) -> MediaResult<Self> {
        let (w, h) = image.dimensions();
        if w != FACE_CROP_SIZE || h != FACE_CROP_SIZE {
            return Err(MediaError::shape_mismatch(
                format!("{FACE_CROP_SIZE}x{FACE_CROP_SIZE}x3"),
                format!("{w}x{h}x3"),
            ));
        }

        let pixels = image.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
        Ok(Self { pixels })
    }

    /// Flat HWC buffer, row-major.
    pub fn as_slice(&self) -> &[f32] {
        &self.pixels
    }

    /// Shape as `[1, H, W, C]` for NHWC models.
    pub fn batch_shape() -> [usize; 4] {
        let side = FACE_CROP_SIZE as usize;
        [1, side, side, FACE_CROP_CHANNELS]
    }
}

/// Exactly [`AUDIO_WINDOW_LEN`] mono samples at 16 kHz.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioWindow {
    samples: Vec<f32>,
}

impl AudioWindow {
    /// Wrap a waveform that already has the window length.
    pub fn new(samples: Vec<f32>) -> MediaResult<Self> {
        if samples.len() != AUDIO_WINDOW_LEN {
            return Err(MediaError::shape_mismatch(
                format!("{AUDIO_WINDOW_LEN} samples"),
                format!("{} samples", samples.len()),
            ));
        }
        Ok(Self { samples })
    }

    /// Right-pad with zeros or truncate to the leading [`AUDIO_WINDOW_LEN`] samples.
    pub fn fit(mut samples: Vec<f32>) -> Self {
        samples.resize(AUDIO_WINDOW_LEN, 0.0);
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_clip_is_right_padded() {
        // 3 seconds at 16 kHz
        let clip = vec![0.25f32; 48_000];
        let window = AudioWindow::fit(clip);
        assert_eq!(window.len(), AUDIO_WINDOW_LEN);
        assert!(window.as_slice()[..48_000].iter().all(|&v| v == 0.25));
        let padding = &window.as_slice()[48_000..];
        assert_eq!(padding.len(), 16_600);
        assert!(padding.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_long_clip_keeps_leading_segment() {
        // 8 seconds at 16 kHz
        let clip: Vec<f32> = (0..128_000).map(|i| i as f32).collect();
        let window = AudioWindow::fit(clip);
        assert_eq!(window.len(), AUDIO_WINDOW_LEN);
        assert_eq!(window.as_slice()[0], 0.0);
        assert_eq!(window.as_slice()[AUDIO_WINDOW_LEN - 1], 64_599.0);
    }

    #[test]
    fn test_fit_handles_empty_and_exact_lengths() {
        assert_eq!(AudioWindow::fit(Vec::new()).len(), AUDIO_WINDOW_LEN);
        assert_eq!(AudioWindow::fit(vec![1.0; AUDIO_WINDOW_LEN]).len(), AUDIO_WINDOW_LEN);
    }

    #[test]
    fn test_audio_window_rejects_wrong_length() {
        let err = AudioWindow::new(vec![0.0; 100]).unwrap_err();
        assert!(matches!(err, MediaError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_face_crop_normalizes_to_unit_range() {
        let img = RgbImage::from_pixel(FACE_CROP_SIZE, FACE_CROP_SIZE, image::Rgb([255, 0, 51]));
        let crop = FaceCrop::from_rgb(&img).unwrap();
        let pixels = crop.as_slice();
        assert_eq!(pixels.len(), 224 * 224 * 3);
        // HWC: pixel (y=10, x=10)
        let at = (10 * 224 + 10) * 3;
        assert_eq!(pixels[at], 1.0);
        assert_eq!(pixels[at + 1], 0.0);
        assert!((pixels[at + 2] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_face_crop_rejects_wrong_size() {
        let img = RgbImage::new(100, 224);
        assert!(matches!(
            FaceCrop::from_rgb(&img),
            Err(MediaError::ShapeMismatch { .. })
        ));
    }
}
