//! Verdict aggregation.
//!
//! Video and image use different thresholds on purpose: video is REAL when
//! the mean real probability is `>= 0.5`, image only when it is `> 0.5`.

use dfguard_models::{AudioLabel, DetectionResult, Modality, Verdict};

use crate::classifier::FaceScores;
use crate::error::{MediaError, MediaResult};

/// Mean-pool per-face scores into one video verdict.
///
/// Confidence is the mean probability of the winning class as a percentage.
pub fn aggregate_video(scores: &[FaceScores]) -> MediaResult<DetectionResult> {
    if scores.is_empty() {
        return Err(MediaError::NoFaceDetected { frames_sampled: 0 });
    }
    for face in scores {
        ensure_finite(face)?;
    }

    let n = scores.len() as f64;
    let mean_real = scores.iter().map(|s| s.p_real).sum::<f64>() / n;
    let mean_fake = scores.iter().map(|s| s.p_fake).sum::<f64>() / n;

    let (verdict, confidence) = if mean_real >= 0.5 {
        (Verdict::Real, mean_real * 100.0)
    } else {
        (Verdict::Fake, mean_fake * 100.0)
    };

    Ok(DetectionResult::visual(
        Modality::Video,
        verdict,
        percentage(confidence),
    ))
}

/// Single-crop image verdict.
pub fn aggregate_image(scores: FaceScores) -> MediaResult<DetectionResult> {
    ensure_finite(&scores)?;

    // The REAL branch reports 100 - p_real*100, which is numerically the fake
    // probability rather than certainty in REAL. Kept for compatibility with
    // existing clients; video uses p_real*100 for the same branch.
    let (verdict, confidence) = if scores.p_real > 0.5 {
        (Verdict::Real, 100.0 - scores.p_real * 100.0)
    } else {
        (Verdict::Fake, scores.p_fake * 100.0)
    };

    Ok(DetectionResult::visual(
        Modality::Image,
        verdict,
        percentage(confidence),
    ))
}

/// Audio verdict straight from the classifier's class index. No confidence.
pub fn aggregate_audio(class_index: usize) -> MediaResult<DetectionResult> {
    AudioLabel::from_class_index(class_index)
        .map(DetectionResult::audio)
        .ok_or(MediaError::InvalidClassIndex(class_index))
}

/// NaN would slip past both thresholds into a FAKE verdict with a NaN confidence.
fn ensure_finite(scores: &FaceScores) -> MediaResult<()> {
    if scores.p_real.is_finite() && scores.p_fake.is_finite() {
        Ok(())
    } else {
        Err(MediaError::inference(format!(
            "classifier produced non-finite scores (real={}, fake={})",
            scores.p_real, scores.p_fake
        )))
    }
}

/// Round to 3 decimals and clamp into `[0, 100]`.
fn percentage(value: f64) -> f64 {
    let rounded = (value * 1000.0).round() / 1000.0;
    rounded.clamp(0.0, 100.0)
}
