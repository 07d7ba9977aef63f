//! Face extraction from video.
//!
//! The container is scanned once, front to back. Every frame is grabbed so
//! the decoder advances, but only frames in the [`FrameSampleSet`] are
//! decoded, converted to RGB and passed to the face locator.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::{MediaError, MediaResult};
use crate::face::{crop_faces, FaceLocator};
use crate::sample::FaceCrop;
use crate::sampling::FrameSampleSet;

/// A sequential frame reader over an opened container.
pub trait VideoSource {
    /// Total frame count reported by the container.
    fn frame_count(&self) -> usize;

    /// Advance past the next frame without decoding it. `false` at end of stream.
    fn grab(&mut self) -> MediaResult<bool>;

    /// Decode the most recently grabbed frame as RGB.
    fn retrieve(&mut self) -> MediaResult<Option<RgbImage>>;
}

/// Opens video files.
pub trait VideoBackend: Send + Sync {
    fn open(&self, path: &Path) -> MediaResult<Box<dyn VideoSource>>;
}

/// Open `path` with `backend` and extract face crops from its sampled frames.
pub fn extract_video_faces(
    backend: &dyn VideoBackend,
    locator: &dyn FaceLocator,
    path: &Path,
    config: &PipelineConfig,
) -> MediaResult<Vec<FaceCrop>> {
    let mut source = backend.open(path)?;
    extract_faces(source.as_mut(), locator, path, config)
}

/// Scan `source` and return face crops in frame order, then detection order.
pub fn extract_faces(
    source: &mut dyn VideoSource,
    locator: &dyn FaceLocator,
    path: &Path,
    config: &PipelineConfig,
) -> MediaResult<Vec<FaceCrop>> {
    let total_frames = source.frame_count();
    if total_frames == 0 {
        return Err(MediaError::media_open(path, "container has zero frames"));
    }

    let samples = FrameSampleSet::evenly_spaced(total_frames, config.sample_frames);
    let last = samples.last().unwrap_or(0);
    debug!(
        path = %path.display(),
        total_frames,
        sampled = samples.len(),
        "Scanning video"
    );

    let mut crops = Vec::new();
    for index in 0..=last {
        if !source.grab()? {
            debug!(index, total_frames, "Video ended before the reported frame count");
            break;
        }
        if !samples.contains(index) {
            continue;
        }

        let Some(frame) = source.retrieve()? else {
            debug!(index, "Frame could not be decoded, skipping");
            continue;
        };
        let frame = scale_frame(frame, config.frame_scale);

        let boxes = locator.detect(&frame)?;
        let found = crop_faces(&frame, &boxes)?;
        debug!(index, boxes = boxes.len(), crops = found.len(), "Sampled frame");
        crops.extend(found);
    }

    if crops.is_empty() {
        return Err(MediaError::NoFaceDetected {
            frames_sampled: samples.len(),
        });
    }

    info!(
        path = %path.display(),
        faces = crops.len(),
        frames_sampled = samples.len(),
        "Extracted faces from video"
    );
    Ok(crops)
}

/// Resize by `scale`, truncating the target size like an integer cast.
fn scale_frame(frame: RgbImage, scale: Option<f32>) -> RgbImage {
    let Some(scale) = scale else {
        return frame;
    };
    let (w, h) = frame.dimensions();
    let new_w = ((w as f32 * scale) as u32).max(1);
    let new_h = ((h as f32 * scale) as u32).max(1);
    if (new_w, new_h) == (w, h) {
        return frame;
    }
    imageops::resize(&frame, new_w, new_h, FilterType::Triangle)
}

pub use backend::OpenCvBackend;

#[cfg(feature = "opencv")]
mod backend {
    use std::path::Path;

    use image::RgbImage;
    use opencv::core::{AlgorithmHint, Mat};
    use opencv::imgproc;
    use opencv::prelude::{MatTraitConst, MatTraitConstManual, VideoCaptureTrait, VideoCaptureTraitConst};
    use opencv::videoio::{VideoCapture, CAP_ANY, CAP_PROP_FRAME_COUNT};

    use super::{VideoBackend, VideoSource};
    use crate::error::{MediaError, MediaResult};

    /// OpenCV `VideoCapture` reader.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct OpenCvBackend;

    impl VideoBackend for OpenCvBackend {
        fn open(&self, path: &Path) -> MediaResult<Box<dyn VideoSource>> {
            let path_str = path
                .to_str()
                .ok_or_else(|| MediaError::media_open(path, "path is not valid UTF-8"))?;

            let cap = VideoCapture::from_file(path_str, CAP_ANY)
                .map_err(|e| MediaError::media_open(path, e.to_string()))?;
            if !cap.is_opened().unwrap_or(false) {
                return Err(MediaError::media_open(path, "container could not be opened"));
            }

            let frame_count = cap.get(CAP_PROP_FRAME_COUNT).unwrap_or(0.0).max(0.0) as usize;
            Ok(Box::new(OpenCvSource { cap, frame_count }))
        }
    }

    struct OpenCvSource {
        cap: VideoCapture,
        frame_count: usize,
    }

    impl VideoSource for OpenCvSource {
        fn frame_count(&self) -> usize {
            self.frame_count
        }

        fn grab(&mut self) -> MediaResult<bool> {
            self.cap
                .grab()
                .map_err(|e| MediaError::internal(format!("grab frame: {e}")))
        }

        fn retrieve(&mut self) -> MediaResult<Option<RgbImage>> {
            let mut bgr = Mat::default();
            let ok = self
                .cap
                .retrieve(&mut bgr, 0)
                .map_err(|e| MediaError::internal(format!("retrieve frame: {e}")))?;
            if !ok || bgr.empty() {
                return Ok(None);
            }

            let mut rgb = Mat::default();
            imgproc::cvt_color(
                &bgr,
                &mut rgb,
                imgproc::COLOR_BGR2RGB,
                0,
                AlgorithmHint::ALGO_HINT_DEFAULT,
            )
            .map_err(|e| MediaError::internal(format!("BGR2RGB failed: {e}")))?;

            let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
            let bytes = rgb
                .data_bytes()
                .map_err(|e| MediaError::internal(format!("frame bytes: {e}")))?
                .to_vec();
            Ok(RgbImage::from_raw(width, height, bytes))
        }
    }
}

#[cfg(not(feature = "opencv"))]
mod backend {
    use std::path::Path;

    use super::{VideoBackend, VideoSource};
    use crate::error::{MediaError, MediaResult};

    /// Placeholder reader for builds without OpenCV. Every open fails.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct OpenCvBackend;

    impl VideoBackend for OpenCvBackend {
        fn open(&self, path: &Path) -> MediaResult<Box<dyn VideoSource>> {
            Err(MediaError::media_open(
                path,
                "video decoding requires the opencv feature",
            ))
        }
    }
}
