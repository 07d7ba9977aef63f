//! ONNX Runtime classifiers.
//!
//! Notes:
//! - `Session::run` needs exclusive access, so each session sits behind a
//!   `Mutex`; concurrent requests serialize per classifier.
//! - The image model is an NHWC export taking `[1, 224, 224, 3]` in `[0, 1]`
//!   and producing `[1, 2]` = `[p_real, p_fake]`.
//! - The audio model takes `[1, 64600]` raw samples and produces `[1, 2]`
//!   logits.

use std::path::Path;
use std::sync::Mutex;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::info;

use super::{argmax, AudioClassifier, FaceScores, ImageClassifier};
use crate::error::{MediaError, MediaResult};
use crate::sample::{AudioWindow, FaceCrop, AUDIO_WINDOW_LEN};

/// An ONNX session plus the name of the output we read.
struct OrtModel {
    session: Mutex<Session>,
    output_name: String,
}

impl OrtModel {
    fn load(model: &'static str, model_path: &Path) -> MediaResult<Self> {
        if !model_path.exists() {
            return Err(MediaError::model_load(
                model,
                format!("{} not found", model_path.display()),
            ));
        }

        let model_bytes = std::fs::read(model_path)
            .map_err(|e| MediaError::model_load(model, format!("read model file: {e}")))?;

        let session = Session::builder()
            .map_err(|e| MediaError::model_load(model, format!("session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| MediaError::model_load(model, format!("opt level: {e}")))?
            .commit_from_memory(model_bytes.as_slice())
            .map_err(|e| MediaError::model_load(model, format!("load model: {e}")))?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| MediaError::model_load(model, "model declares no outputs"))?;

        info!(
            model,
            path = %model_path.display(),
            output = %output_name,
            "ONNX model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            output_name,
        })
    }

    /// Run the model on one input tensor and return the flattened `f32` output.
    fn run(&self, input: Value) -> MediaResult<Vec<f32>> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| MediaError::internal("ORT session poisoned"))?;

        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| MediaError::inference(format!("ORT run failed: {e}")))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| MediaError::inference("ORT returned no outputs"))?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| MediaError::inference(format!("ORT extract: {e}")))?;

        Ok(data.to_vec())
    }
}

/// Face crop classifier backed by ONNX Runtime.
pub struct OrtImageClassifier {
    model: OrtModel,
}

impl OrtImageClassifier {
    pub fn load(model_path: &Path) -> MediaResult<Self> {
        Ok(Self {
            model: OrtModel::load("image classifier", model_path)?,
        })
    }
}

impl ImageClassifier for OrtImageClassifier {
    fn predict(&self, crop: &FaceCrop) -> MediaResult<FaceScores> {
        let shape = FaceCrop::batch_shape().to_vec();
        let data = crop.as_slice().to_vec().into_boxed_slice();
        let tensor = Tensor::from_array((shape, data))
            .map(Value::from)
            .map_err(|e| MediaError::inference(format!("ORT tensor: {e}")))?;

        let scores = self.model.run(tensor)?;
        face_scores(&scores)
    }
}

/// The image head emits exactly `[p_real, p_fake]`; any other width means the
/// wrong graph was loaded.
fn face_scores(values: &[f32]) -> MediaResult<FaceScores> {
    match values {
        [p_real, p_fake] => Ok(FaceScores::new(*p_real as f64, *p_fake as f64)),
        other => Err(MediaError::inference(format!(
            "image classifier returned {} value(s), expected 2",
            other.len()
        ))),
    }
}

/// Audio classifier backed by ONNX Runtime.
pub struct OrtAudioClassifier {
    model: OrtModel,
}

impl OrtAudioClassifier {
    pub fn load(model_path: &Path) -> MediaResult<Self> {
        Ok(Self {
            model: OrtModel::load("audio classifier", model_path)?,
        })
    }
}

impl AudioClassifier for OrtAudioClassifier {
    fn predict(&self, window: &AudioWindow) -> MediaResult<usize> {
        let shape = vec![1usize, AUDIO_WINDOW_LEN];
        let data = window.as_slice().to_vec().into_boxed_slice();
        let tensor = Tensor::from_array((shape, data))
            .map(Value::from)
            .map_err(|e| MediaError::inference(format!("ORT tensor: {e}")))?;

        let logits = self.model.run(tensor)?;
        argmax(&logits).ok_or_else(|| MediaError::inference("audio classifier returned no logits"))
    }
}
