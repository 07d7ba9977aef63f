//! Modality classifiers.
//!
//! Each classifier is an opaque pretrained model behind a small trait. The
//! pipeline depends only on these traits; [`onnx`] provides the ONNX Runtime
//! implementations used in production.

pub mod onnx;

use crate::error::MediaResult;
use crate::sample::{AudioWindow, FaceCrop};

pub use onnx::{OrtAudioClassifier, OrtImageClassifier};

/// Class probabilities for one face crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceScores {
    pub p_real: f64,
    pub p_fake: f64,
}

impl FaceScores {
    pub fn new(p_real: f64, p_fake: f64) -> Self {
        Self { p_real, p_fake }
    }
}

/// Image/face classifier: one crop in, `[p_real, p_fake]` out.
///
/// The two values are softmax-like but not required to sum to one.
#[cfg_attr(test, mockall::automock)]
pub trait ImageClassifier: Send + Sync {
    fn predict(&self, crop: &FaceCrop) -> MediaResult<FaceScores>;
}

/// Audio classifier: one window in, argmax class index out
/// (`0` = real, `1` = fake).
#[cfg_attr(test, mockall::automock)]
pub trait AudioClassifier: Send + Sync {
    fn predict(&self, window: &AudioWindow) -> MediaResult<usize>;
}

/// Index of the largest value. Ties resolve to the lowest index.
pub(crate) fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, bv)) if bv >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}
