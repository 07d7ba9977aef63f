//! OpenCV YuNet face detector (2023mar model).
//!
//! YuNet is exposed via OpenCV's `FaceDetectorYN`. The detector is created
//! once at startup and reused for every frame; its input size is reset to
//! the frame size before each call, so frames of any resolution work.
//!
//! # Requirements
//! - OpenCV 4.8+ with the DNN and objdetect modules

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::RgbImage;
use opencv::core::{AlgorithmHint, Mat, Ptr, Size};
use opencv::imgproc;
use opencv::objdetect::FaceDetectorYN;
use opencv::prelude::{FaceDetectorYNTrait, MatTraitConst};
use tracing::{debug, info};

use super::{FaceBox, FaceLocator};
use crate::error::{MediaError, MediaResult};

/// Minimum detection score kept.
const SCORE_THRESHOLD: f32 = 0.6;

/// NMS threshold for face detection.
const NMS_THRESHOLD: f32 = 0.3;

/// Top K faces to keep before NMS.
const TOP_K: i32 = 5000;

/// Initial input size; replaced per frame.
const INITIAL_INPUT: (i32, i32) = (320, 320);

/// Columns in a YuNet output row:
/// `[x, y, w, h, x_re, y_re, x_le, y_le, x_n, y_n, x_ml, y_ml, x_mr, y_mr, score]`
const OUTPUT_COLUMNS: i32 = 15;

/// YuNet-backed [`FaceLocator`].
pub struct YuNetLocator {
    detector: Mutex<Ptr<FaceDetectorYN>>,
    model_path: PathBuf,
}

impl YuNetLocator {
    /// Load the YuNet ONNX model.
    pub fn load(model_path: &Path) -> MediaResult<Self> {
        let metadata = std::fs::metadata(model_path).map_err(|e| {
            MediaError::model_load(
                "face detector",
                format!("cannot read {}: {e}", model_path.display()),
            )
        })?;
        if metadata.len() < 50_000 {
            return Err(MediaError::model_load(
                "face detector",
                format!(
                    "{} appears corrupted (size: {} bytes)",
                    model_path.display(),
                    metadata.len()
                ),
            ));
        }

        let path_str = model_path.to_str().ok_or_else(|| {
            MediaError::model_load("face detector", "model path is not valid UTF-8")
        })?;

        let detector = FaceDetectorYN::create(
            path_str,
            "",
            Size::new(INITIAL_INPUT.0, INITIAL_INPUT.1),
            SCORE_THRESHOLD,
            NMS_THRESHOLD,
            TOP_K,
            opencv::dnn::DNN_BACKEND_DEFAULT,
            opencv::dnn::DNN_TARGET_CPU,
        )
        .map_err(|e| MediaError::model_load("face detector", e.to_string()))?;

        info!(model = %model_path.display(), "YuNet face detector loaded");

        Ok(Self {
            detector: Mutex::new(detector),
            model_path: model_path.to_path_buf(),
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl FaceLocator for YuNetLocator {
    fn detect(&self, frame: &RgbImage) -> MediaResult<Vec<FaceBox>> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let bgr = rgb_to_bgr_mat(frame)?;

        let mut detector = self
            .detector
            .lock()
            .map_err(|_| MediaError::internal("YuNet detector mutex poisoned"))?;

        detector
            .set_input_size(Size::new(width as i32, height as i32))
            .map_err(|e| MediaError::inference(format!("YuNet set input size: {e}")))?;

        let mut faces = Mat::default();
        detector
            .detect(&bgr, &mut faces)
            .map_err(|e| MediaError::inference(format!("YuNet detection: {e}")))?;
        drop(detector);

        let boxes = parse_detections(&faces)?;
        debug!(faces = boxes.len(), width, height, "YuNet detection complete");
        Ok(boxes)
    }
}

/// Copy an RGB image into a BGR `Mat` for OpenCV.
fn rgb_to_bgr_mat(frame: &RgbImage) -> MediaResult<Mat> {
    let (_, height) = frame.dimensions();
    let flat = Mat::from_slice(frame.as_raw())
        .map_err(|e| MediaError::internal(format!("frame to Mat: {e}")))?;
    let rgb = flat
        .reshape(3, height as i32)
        .and_then(|m| m.try_clone())
        .map_err(|e| MediaError::internal(format!("frame reshape: {e}")))?;

    let mut bgr = Mat::default();
    imgproc::cvt_color(
        &rgb,
        &mut bgr,
        imgproc::COLOR_RGB2BGR,
        0,
        AlgorithmHint::ALGO_HINT_DEFAULT,
    )
    .map_err(|e| MediaError::internal(format!("RGB2BGR failed: {e}")))?;
    Ok(bgr)
}

/// Parse YuNet's N x 15 output matrix into boxes, keeping detection order.
fn parse_detections(faces: &Mat) -> MediaResult<Vec<FaceBox>> {
    let rows = faces.rows();
    if rows <= 0 {
        return Ok(Vec::new());
    }
    if faces.cols() < OUTPUT_COLUMNS {
        return Err(MediaError::inference(format!(
            "YuNet output has {} columns, expected {OUTPUT_COLUMNS}",
            faces.cols()
        )));
    }

    let mut boxes = Vec::with_capacity(rows as usize);
    for i in 0..rows {
        let cell = |col: i32| {
            faces
                .at_2d::<f32>(i, col)
                .copied()
                .map_err(|e| MediaError::inference(format!("YuNet output row {i}: {e}")))
        };
        let (x, y, w, h, score) = (cell(0)?, cell(1)?, cell(2)?, cell(3)?, cell(14)?);
        if score < SCORE_THRESHOLD || w <= 0.0 || h <= 0.0 {
            continue;
        }
        boxes.push(FaceBox::from_xywh(x, y, w, h));
    }
    Ok(boxes)
}
