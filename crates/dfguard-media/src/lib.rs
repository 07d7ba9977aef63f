//! Media preprocessing and multi-modal deepfake inference.
//!
//! This crate provides:
//! - Fixed-shape classifier samples (`FaceCrop`, `AudioWindow`)
//! - Evenly spaced video frame sampling
//! - Face location and cropping (YuNet via OpenCV)
//! - Image and audio classifiers on ONNX Runtime
//! - Verdict aggregation per modality
//! - The `DetectionPipeline` façade with a uniform error contract

pub mod aggregate;
pub mod classifier;
pub mod command;
pub mod config;
pub mod error;
pub mod extract;
pub mod face;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod sample;
pub mod sampling;

pub use aggregate::{aggregate_audio, aggregate_image, aggregate_video};
pub use classifier::{AudioClassifier, FaceScores, ImageClassifier};
pub use command::{check_ffmpeg, FfmpegCommand};
pub use config::PipelineConfig;
pub use error::{MediaError, MediaResult, PredictionError};
pub use face::{crop_faces, FaceBox, FaceLocator};
pub use models::{ModelConfig, ModelKind, ModelRegistry};
pub use pipeline::{DeepfakeDetector, DetectionPipeline, ModelReadiness, Stage};
pub use sample::{AudioWindow, FaceCrop, AUDIO_SAMPLE_RATE, AUDIO_WINDOW_LEN, FACE_CROP_SIZE};
pub use sampling::FrameSampleSet;
