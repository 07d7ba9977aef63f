//! Model discovery and one-time loading.
//!
//! Paths come from `IMAGE_MODEL_PATH`, `AUDIO_MODEL_PATH` and
//! `FACE_MODEL_PATH`. When a variable is unset the first existing file in a
//! list of well-known locations is used.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::classifier::{AudioClassifier, ImageClassifier, OrtAudioClassifier, OrtImageClassifier};
use crate::error::{MediaError, MediaResult};
use crate::face::FaceLocator;

/// Directories searched when no explicit path is configured.
const SEARCH_DIRS: &[&str] = &["/app/models", "./models", "./backend/models"];

const IMAGE_MODEL_FILE: &str = "efficientnet_b0.onnx";
const AUDIO_MODEL_FILE: &str = "rawnet2.onnx";
const FACE_MODEL_FILE: &str = "face_detection_yunet_2023mar.onnx";

/// Which model a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Image,
    Audio,
    Face,
}

impl ModelKind {
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Image => "image classifier",
            Self::Audio => "audio classifier",
            Self::Face => "face detector",
        }
    }

    pub const fn env_var(&self) -> &'static str {
        match self {
            Self::Image => "IMAGE_MODEL_PATH",
            Self::Audio => "AUDIO_MODEL_PATH",
            Self::Face => "FACE_MODEL_PATH",
        }
    }

    pub const fn file_name(&self) -> &'static str {
        match self {
            Self::Image => IMAGE_MODEL_FILE,
            Self::Audio => AUDIO_MODEL_FILE,
            Self::Face => FACE_MODEL_FILE,
        }
    }
}

/// Resolved model file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub image_model: PathBuf,
    pub audio_model: PathBuf,
    pub face_model: PathBuf,
}

impl ModelConfig {
    /// Resolve every model path from the environment, falling back to the
    /// search directories. Fails with `ModelLoad` when a model is nowhere
    /// to be found.
    pub fn from_env() -> MediaResult<Self> {
        let dirs: Vec<PathBuf> = SEARCH_DIRS.iter().map(PathBuf::from).collect();
        Self::resolve(|key| env::var(key).ok(), &dirs)
    }

    fn resolve(lookup: impl Fn(&str) -> Option<String>, dirs: &[PathBuf]) -> MediaResult<Self> {
        let find = |kind: ModelKind| -> MediaResult<PathBuf> {
            if let Some(explicit) = lookup(kind.env_var()).filter(|v| !v.trim().is_empty()) {
                return Ok(PathBuf::from(explicit));
            }
            dirs.iter()
                .map(|dir| dir.join(kind.file_name()))
                .find(|candidate| {
                    debug!(model = kind.display_name(), path = %candidate.display(), "Checking model location");
                    candidate.is_file()
                })
                .ok_or_else(|| {
                    MediaError::model_load(
                        kind.display_name(),
                        format!(
                            "{} not set and {} not found in {:?}",
                            kind.env_var(),
                            kind.file_name(),
                            dirs
                        ),
                    )
                })
        };

        Ok(Self {
            image_model: find(ModelKind::Image)?,
            audio_model: find(ModelKind::Audio)?,
            face_model: find(ModelKind::Face)?,
        })
    }

    pub fn path(&self, kind: ModelKind) -> &Path {
        match kind {
            ModelKind::Image => &self.image_model,
            ModelKind::Audio => &self.audio_model,
            ModelKind::Face => &self.face_model,
        }
    }
}

/// Process-wide model instances, loaded once before serving.
#[derive(Clone)]
pub struct ModelRegistry {
    pub image: Arc<dyn ImageClassifier>,
    pub audio: Arc<dyn AudioClassifier>,
    /// `None` in builds without the `opencv` feature.
    pub faces: Option<Arc<dyn FaceLocator>>,
}

impl ModelRegistry {
    /// Deserialize every model. Any failure is fatal for the process.
    pub fn load(config: &ModelConfig) -> MediaResult<Self> {
        let image: Arc<dyn ImageClassifier> = Arc::new(OrtImageClassifier::load(&config.image_model)?);
        let audio: Arc<dyn AudioClassifier> = Arc::new(OrtAudioClassifier::load(&config.audio_model)?);
        let faces = load_face_locator(&config.face_model)?;

        info!(
            image = %config.image_model.display(),
            audio = %config.audio_model.display(),
            face_locator = faces.is_some(),
            "Models loaded"
        );

        Ok(Self {
            image,
            audio,
            faces,
        })
    }

    /// Assemble a registry from already-built parts.
    pub fn from_parts(
        image: Arc<dyn ImageClassifier>,
        audio: Arc<dyn AudioClassifier>,
        faces: Option<Arc<dyn FaceLocator>>,
    ) -> Self {
        Self {
            image,
            audio,
            faces,
        }
    }
}

#[cfg(feature = "opencv")]
fn load_face_locator(path: &Path) -> MediaResult<Option<Arc<dyn FaceLocator>>> {
    let locator: Arc<dyn FaceLocator> = Arc::new(crate::face::YuNetLocator::load(path)?);
    Ok(Some(locator))
}

#[cfg(not(feature = "opencv"))]
fn load_face_locator(path: &Path) -> MediaResult<Option<Arc<dyn FaceLocator>>> {
    tracing::warn!(
        path = %path.display(),
        "Built without the opencv feature; video prediction is unavailable"
    );
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_explicit_paths_win() {
        let config = ModelConfig::resolve(
            lookup(&[
                ("IMAGE_MODEL_PATH", "/m/img.onnx"),
                ("AUDIO_MODEL_PATH", "/m/aud.onnx"),
                ("FACE_MODEL_PATH", "/m/face.onnx"),
            ]),
            &[],
        )
        .unwrap();
        assert_eq!(config.path(ModelKind::Image), Path::new("/m/img.onnx"));
        assert_eq!(config.path(ModelKind::Audio), Path::new("/m/aud.onnx"));
        assert_eq!(config.path(ModelKind::Face), Path::new("/m/face.onnx"));
    }

    #[test]
    fn test_search_dirs_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        for kind in [ModelKind::Image, ModelKind::Audio, ModelKind::Face] {
            std::fs::write(second.path().join(kind.file_name()), b"x").unwrap();
        }
        std::fs::write(first.path().join(IMAGE_MODEL_FILE), b"x").unwrap();

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let config = ModelConfig::resolve(lookup(&[]), &dirs).unwrap();
        assert_eq!(config.image_model, first.path().join(IMAGE_MODEL_FILE));
        assert_eq!(config.audio_model, second.path().join(AUDIO_MODEL_FILE));
    }

    #[test]
    fn test_missing_model_is_model_load() {
        let empty = tempfile::tempdir().unwrap();
        let err = ModelConfig::resolve(
            lookup(&[("IMAGE_MODEL_PATH", "/m/img.onnx")]),
            &[empty.path().to_path_buf()],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MediaError::ModelLoad {
                model: "audio classifier",
                ..
            }
        ));
    }

    #[test]
    fn test_registry_load_fails_on_bad_weights() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelConfig {
            image_model: dir.path().join("missing.onnx"),
            audio_model: dir.path().join("missing.onnx"),
            face_model: dir.path().join("missing.onnx"),
        };
        assert!(matches!(
            ModelRegistry::load(&config),
            Err(MediaError::ModelLoad { .. })
        ));
    }
}
