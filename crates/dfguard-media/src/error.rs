//! Error types for media preprocessing and inference.

use std::path::PathBuf;

use dfguard_models::Modality;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while extracting, classifying or aggregating media.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to open {}: {reason}", path.display())]
    MediaOpen { path: PathBuf, reason: String },

    #[error("No faces detected in {frames_sampled} sampled frame(s)")]
    NoFaceDetected { frames_sampled: usize },

    #[error("Failed to process audio: {0}")]
    AudioDecode(String),

    #[error("Sample shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Failed to load {model} model: {reason}")]
    ModelLoad { model: &'static str, reason: String },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Classifier returned out-of-range class index {0}")]
    InvalidClassIndex(usize),

    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFmpeg failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create a media open failure.
    pub fn media_open(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MediaOpen {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a shape mismatch error.
    pub fn shape_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a model load failure.
    pub fn model_load(model: &'static str, reason: impl Into<String>) -> Self {
        Self::ModelLoad {
            model,
            reason: reason.into(),
        }
    }

    /// Create an inference failure.
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    /// Create an FFmpeg failure.
    pub fn ffmpeg_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
        }
    }

    /// Create an audio decode failure.
    pub fn audio_decode(message: impl Into<String>) -> Self {
        Self::AudioDecode(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

/// The single failure kind surfaced by the inference façade.
///
/// Callers never see the internal [`MediaError`] taxonomy, only the modality
/// and the original message text.
#[derive(Debug, Clone, Error)]
pub enum PredictionError {
    #[error("{} prediction failed: {message}", modality.title())]
    PredictionFailed { modality: Modality, message: String },
}

impl PredictionError {
    pub fn failed(modality: Modality, source: &MediaError) -> Self {
        Self::PredictionFailed {
            modality,
            message: source.to_string(),
        }
    }

    pub fn modality(&self) -> Modality {
        match self {
            Self::PredictionFailed { modality, .. } => *modality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_error_carries_original_message() {
        let err = PredictionError::failed(
            Modality::Video,
            &MediaError::NoFaceDetected { frames_sampled: 5 },
        );
        assert_eq!(
            err.to_string(),
            "Video prediction failed: No faces detected in 5 sampled frame(s)"
        );
        assert_eq!(err.modality(), Modality::Video);
    }

    #[test]
    fn test_media_open_message_names_path() {
        let err = MediaError::media_open("/tmp/x.mp4", "container has zero frames");
        assert_eq!(
            err.to_string(),
            "Failed to open /tmp/x.mp4: container has zero frames"
        );
    }
}
