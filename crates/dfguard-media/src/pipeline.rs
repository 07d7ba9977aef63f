//! Inference façade.
//!
//! Each entry point runs Extractor → Classifier → Aggregator for one file and
//! collapses every failure into [`PredictionError::PredictionFailed`] after
//! logging the input path, modality and stage.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use dfguard_models::{DetectionResult, Modality};
use serde::Serialize;
use tracing::{error, info};

use crate::aggregate::{aggregate_audio, aggregate_image, aggregate_video};
use crate::config::PipelineConfig;
use crate::error::{MediaError, MediaResult, PredictionError};
use crate::extract::{decode_audio, extract_video_faces, load_image_crop, OpenCvBackend, VideoBackend};
use crate::metrics;
use crate::models::ModelRegistry;
use crate::sample::{AudioWindow, AUDIO_WINDOW_LEN};

/// Pipeline stage a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Classify,
    Aggregate,
    /// The blocking worker itself failed (panic or cancellation).
    Schedule,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Classify => "classify",
            Self::Aggregate => "aggregate",
            Self::Schedule => "schedule",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which models are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelReadiness {
    pub image_classifier: bool,
    pub audio_classifier: bool,
    pub face_locator: bool,
}

impl ModelReadiness {
    pub fn all_loaded(&self) -> bool {
        self.image_classifier && self.audio_classifier && self.face_locator
    }
}

/// The three prediction operations.
#[async_trait]
pub trait DeepfakeDetector: Send + Sync {
    async fn predict_video(&self, path: &Path) -> Result<DetectionResult, PredictionError>;

    async fn predict_image(&self, path: &Path) -> Result<DetectionResult, PredictionError>;

    async fn predict_audio(&self, path: &Path) -> Result<DetectionResult, PredictionError>;

    fn readiness(&self) -> ModelReadiness;

    /// Dispatch on `modality`.
    async fn predict(
        &self,
        modality: Modality,
        path: &Path,
    ) -> Result<DetectionResult, PredictionError> {
        match modality {
            Modality::Video => self.predict_video(path).await,
            Modality::Image => self.predict_image(path).await,
            Modality::Audio => self.predict_audio(path).await,
        }
    }
}

/// A failure tagged with the stage it came from.
#[derive(Debug)]
struct StageError {
    stage: Stage,
    source: MediaError,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, StageError>;
}

impl<T> AtStage<T> for MediaResult<T> {
    fn at(self, stage: Stage) -> Result<T, StageError> {
        self.map_err(|source| StageError { stage, source })
    }
}

/// Production [`DeepfakeDetector`] over loaded models.
#[derive(Clone)]
pub struct DetectionPipeline {
    models: ModelRegistry,
    video: Arc<dyn VideoBackend>,
    config: PipelineConfig,
}

impl DetectionPipeline {
    pub fn new(models: ModelRegistry, config: PipelineConfig) -> Self {
        Self {
            models,
            video: Arc::new(OpenCvBackend),
            config,
        }
    }

    /// Replace the video reader.
    pub fn with_video_backend(mut self, backend: Arc<dyn VideoBackend>) -> Self {
        self.video = backend;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Classify an already decoded audio window.
    async fn classify_audio(&self, window: AudioWindow) -> Result<DetectionResult, StageError> {
        if window.len() != AUDIO_WINDOW_LEN {
            return Err(StageError {
                stage: Stage::Classify,
                source: MediaError::shape_mismatch(
                    format!("{AUDIO_WINDOW_LEN} samples"),
                    format!("{} samples", window.len()),
                ),
            });
        }

        let classifier = self.models.audio.clone();
        let class_index =
            run_blocking(move || classifier.predict(&window).at(Stage::Classify)).await?;
        aggregate_audio(class_index).at(Stage::Aggregate)
    }

    fn finish(
        &self,
        modality: Modality,
        path: &Path,
        started: Instant,
        outcome: Result<DetectionResult, StageError>,
    ) -> Result<DetectionResult, PredictionError> {
        let elapsed = started.elapsed();
        match outcome {
            Ok(result) => {
                info!(
                    path = %path.display(),
                    modality = %modality,
                    label = result.label(),
                    confidence = ?result.confidence(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Prediction complete"
                );
                metrics::record_prediction(modality, result.label(), elapsed.as_secs_f64());
                Ok(result)
            }
            Err(StageError { stage, source }) => {
                error!(
                    path = %path.display(),
                    modality = %modality,
                    stage = %stage,
                    error = %source,
                    "Prediction failed"
                );
                metrics::record_failure(modality, stage.as_str());
                Err(PredictionError::failed(modality, &source))
            }
        }
    }
}

#[async_trait]
impl DeepfakeDetector for DetectionPipeline {
    async fn predict_video(&self, path: &Path) -> Result<DetectionResult, PredictionError> {
        let started = Instant::now();
        let models = self.models.clone();
        let backend = self.video.clone();
        let config = self.config.clone();
        let input = path.to_path_buf();

        let outcome =
            run_blocking(move || video_verdict(&models, backend.as_ref(), &input, &config)).await;
        self.finish(Modality::Video, path, started, outcome)
    }

    async fn predict_image(&self, path: &Path) -> Result<DetectionResult, PredictionError> {
        let started = Instant::now();
        let models = self.models.clone();
        let input = path.to_path_buf();

        let outcome = run_blocking(move || image_verdict(&models, &input)).await;
        self.finish(Modality::Image, path, started, outcome)
    }

    async fn predict_audio(&self, path: &Path) -> Result<DetectionResult, PredictionError> {
        let started = Instant::now();
        let outcome = match decode_audio(path).await.at(Stage::Extract) {
            Ok(window) => self.classify_audio(window).await,
            Err(e) => Err(e),
        };
        self.finish(Modality::Audio, path, started, outcome)
    }

    fn readiness(&self) -> ModelReadiness {
        ModelReadiness {
            image_classifier: true,
            audio_classifier: true,
            face_locator: self.models.faces.is_some(),
        }
    }
}

fn video_verdict(
    models: &ModelRegistry,
    backend: &dyn VideoBackend,
    path: &Path,
    config: &PipelineConfig,
) -> Result<DetectionResult, StageError> {
    let locator = models
        .faces
        .as_deref()
        .ok_or_else(|| MediaError::media_open(path, "video decoding requires the opencv feature"))
        .at(Stage::Extract)?;

    let crops = extract_video_faces(backend, locator, path, config).at(Stage::Extract)?;
    metrics::record_faces_extracted(crops.len());

    let scores = crops
        .iter()
        .map(|crop| models.image.predict(crop))
        .collect::<MediaResult<Vec<_>>>()
        .at(Stage::Classify)?;

    aggregate_video(&scores).at(Stage::Aggregate)
}

fn image_verdict(models: &ModelRegistry, path: &Path) -> Result<DetectionResult, StageError> {
    let crop = load_image_crop(path).at(Stage::Extract)?;
    let scores = models.image.predict(&crop).at(Stage::Classify)?;
    aggregate_image(scores).at(Stage::Aggregate)
}

/// Run CPU-bound work off the async executor.
async fn run_blocking<T, F>(work: F) -> Result<T, StageError>
where
    F: FnOnce() -> Result<T, StageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .unwrap_or_else(|e| {
            Err(StageError {
                stage: Stage::Schedule,
                source: MediaError::internal(format!("inference worker failed: {e}")),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{FaceScores, MockAudioClassifier, MockImageClassifier};
    use crate::extract::VideoSource;
    use crate::face::{FaceBox, FaceLocator, MockFaceLocator};
    use dfguard_models::Verdict;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;

    /// Uniform gray frames, `frames` of them.
    struct StaticVideo {
        frames: usize,
    }

    struct StaticSource {
        frames: usize,
        position: usize,
    }

    impl VideoBackend for StaticVideo {
        fn open(&self, _path: &Path) -> MediaResult<Box<dyn VideoSource>> {
            Ok(Box::new(StaticSource {
                frames: self.frames,
                position: 0,
            }))
        }
    }

    impl VideoSource for StaticSource {
        fn frame_count(&self) -> usize {
            self.frames
        }

        fn grab(&mut self) -> MediaResult<bool> {
            if self.position >= self.frames {
                return Ok(false);
            }
            self.position += 1;
            Ok(true)
        }

        fn retrieve(&mut self) -> MediaResult<Option<RgbImage>> {
            Ok(Some(RgbImage::from_pixel(80, 60, Rgb([128, 128, 128]))))
        }
    }

    fn registry(
        image: MockImageClassifier,
        audio: MockAudioClassifier,
        faces: Option<MockFaceLocator>,
    ) -> ModelRegistry {
        ModelRegistry::from_parts(
            Arc::new(image),
            Arc::new(audio),
            faces.map(|f| Arc::new(f) as Arc<dyn FaceLocator>),
        )
    }

    fn face_everywhere() -> MockFaceLocator {
        let mut locator = MockFaceLocator::new();
        locator
            .expect_detect()
            .returning(|_| Ok(vec![FaceBox::new(10, 10, 50, 50)]));
        locator
    }

    fn video_pipeline(image: MockImageClassifier, faces: MockFaceLocator) -> DetectionPipeline {
        DetectionPipeline::new(
            registry(image, MockAudioClassifier::new(), Some(faces)),
            PipelineConfig::default(),
        )
        .with_video_backend(Arc::new(StaticVideo { frames: 100 }))
    }

    fn write_png(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("portrait.png");
        RgbImage::from_pixel(64, 64, Rgb([90, 60, 30]))
            .save(&path)
            .unwrap();
        path
    }

    #[tokio::test]
    async fn test_video_mean_pools_every_face() {
        let mut image = MockImageClassifier::new();
        image
            .expect_predict()
            .times(5)
            .returning(|_| Ok(FaceScores::new(0.2, 0.8)));
        let pipeline = video_pipeline(image, face_everywhere());

        let result = pipeline.predict_video(Path::new("clip.mp4")).await.unwrap();
        assert_eq!(result.verdict(), Verdict::Fake);
        assert_eq!(result.confidence(), Some(80.0));
    }

    #[tokio::test]
    async fn test_video_without_faces_fails_uniformly() {
        let mut faces = MockFaceLocator::new();
        faces.expect_detect().returning(|_| Ok(Vec::new()));
        let mut image = MockImageClassifier::new();
        image.expect_predict().never();
        let pipeline = video_pipeline(image, faces);

        let err = pipeline
            .predict_video(Path::new("clip.mp4"))
            .await
            .unwrap_err();
        assert_eq!(err.modality(), Modality::Video);
        assert_eq!(
            err.to_string(),
            "Video prediction failed: No faces detected in 5 sampled frame(s)"
        );
    }

    #[tokio::test]
    async fn test_video_classifier_failure_is_wrapped() {
        let mut image = MockImageClassifier::new();
        image
            .expect_predict()
            .returning(|_| Err(MediaError::inference("ORT run failed: boom")));
        let pipeline = video_pipeline(image, face_everywhere());

        let err = pipeline
            .predict_video(Path::new("clip.mp4"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Video prediction failed: Inference failed: ORT run failed: boom"
        );
    }

    #[tokio::test]
    async fn test_video_without_face_locator() {
        let pipeline = DetectionPipeline::new(
            registry(MockImageClassifier::new(), MockAudioClassifier::new(), None),
            PipelineConfig::default(),
        );
        assert!(!pipeline.readiness().all_loaded());

        let err = pipeline
            .predict_video(Path::new("clip.mp4"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("requires the opencv feature"));
    }

    #[tokio::test]
    async fn test_image_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(&dir);
        let mut image = MockImageClassifier::new();
        image
            .expect_predict()
            .times(1)
            .returning(|_| Ok(FaceScores::new(0.7, 0.3)));
        let pipeline = DetectionPipeline::new(
            registry(image, MockAudioClassifier::new(), Some(MockFaceLocator::new())),
            PipelineConfig::default(),
        );

        let result = pipeline.predict(Modality::Image, &path).await.unwrap();
        assert_eq!(result.label(), "REAL");
        assert_eq!(result.confidence(), Some(30.0));
    }

    #[tokio::test]
    async fn test_unreadable_image_fails_before_classifier() {
        let mut image = MockImageClassifier::new();
        image.expect_predict().never();
        let pipeline = DetectionPipeline::new(
            registry(image, MockAudioClassifier::new(), None),
            PipelineConfig::default(),
        );

        let err = pipeline
            .predict_image(Path::new("/nonexistent/face.jpg"))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Image prediction failed: Failed to open"));
    }

    #[tokio::test]
    async fn test_audio_decode_failure_skips_classifier() {
        let mut audio = MockAudioClassifier::new();
        audio.expect_predict().never();
        let pipeline = DetectionPipeline::new(
            registry(MockImageClassifier::new(), audio, None),
            PipelineConfig::default(),
        );

        let err = pipeline
            .predict_audio(Path::new("/nonexistent/voice.flac"))
            .await
            .unwrap_err();
        assert_eq!(err.modality(), Modality::Audio);
        assert!(err
            .to_string()
            .starts_with("Audio prediction failed: Failed to process audio"));
    }

    #[tokio::test]
    async fn test_audio_window_classification() {
        let mut audio = MockAudioClassifier::new();
        audio
            .expect_predict()
            .withf(|w: &AudioWindow| w.len() == AUDIO_WINDOW_LEN)
            .times(1)
            .returning(|_| Ok(1));
        let pipeline = DetectionPipeline::new(
            registry(MockImageClassifier::new(), audio, None),
            PipelineConfig::default(),
        );

        let result = pipeline
            .classify_audio(AudioWindow::fit(vec![0.1; 48_000]))
            .await
            .unwrap();
        assert_eq!(result.label(), "Fake audio");
        assert_eq!(result.confidence(), None);
    }

    #[tokio::test]
    async fn test_audio_out_of_range_class_fails() {
        let mut audio = MockAudioClassifier::new();
        audio.expect_predict().returning(|_| Ok(7));
        let pipeline = DetectionPipeline::new(
            registry(MockImageClassifier::new(), audio, None),
            PipelineConfig::default(),
        );

        let err = pipeline
            .classify_audio(AudioWindow::fit(Vec::new()))
            .await
            .unwrap_err();
        assert_eq!(err.stage, Stage::Aggregate);
        assert!(matches!(err.source, MediaError::InvalidClassIndex(7)));
    }
}
