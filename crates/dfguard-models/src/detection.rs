//! Detection results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::modality::Modality;
use crate::verdict::{AudioLabel, Verdict};

/// Final classification of one input file.
///
/// Produced once per prediction call and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionResult {
    modality: Modality,
    verdict: Verdict,
    /// Percentage in `[0, 100]`, rounded to 3 decimals. Absent for audio.
    confidence: Option<f64>,
}

impl DetectionResult {
    /// Result for a video or image prediction.
    pub fn visual(modality: Modality, verdict: Verdict, confidence: f64) -> Self {
        Self {
            modality,
            verdict,
            confidence: Some(confidence),
        }
    }

    /// Result for an audio prediction. The audio classifier yields no
    /// probabilities, so no confidence is attached.
    pub fn audio(label: AudioLabel) -> Self {
        Self {
            modality: Modality::Audio,
            verdict: label.verdict(),
            confidence: None,
        }
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    /// Modality-specific label: `REAL`/`FAKE` for video and image,
    /// `Real audio`/`Fake audio` for audio.
    pub fn label(&self) -> &'static str {
        match (self.modality, self.verdict) {
            (Modality::Audio, Verdict::Real) => AudioLabel::Real.as_str(),
            (Modality::Audio, Verdict::Fake) => AudioLabel::Fake.as_str(),
            (_, verdict) => verdict.as_str(),
        }
    }

    pub fn record(&self) -> DetectionRecord {
        DetectionRecord {
            label: self.label().to_string(),
            confidence: self.confidence,
        }
    }
}

/// JSON-serializable primitive form of a [`DetectionResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectionRecord {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl From<DetectionResult> for DetectionRecord {
    fn from(result: DetectionResult) -> Self {
        result.record()
    }
}

/// Body returned by the `/predict/*` HTTP endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    pub is_deepfake: bool,
    pub label: Verdict,
    pub confidence: Option<f64>,
}

impl From<DetectionResult> for PredictionResponse {
    fn from(result: DetectionResult) -> Self {
        Self {
            is_deepfake: result.verdict.is_fake(),
            label: result.verdict,
            confidence: result.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visual_record_serialization() {
        let result = DetectionResult::visual(Modality::Video, Verdict::Fake, 87.5);
        let json = serde_json::to_value(result.record()).unwrap();
        assert_eq!(json["label"], "FAKE");
        assert_eq!(json["confidence"], 87.5);
    }

    #[test]
    fn test_audio_record_omits_confidence() {
        let result = DetectionResult::audio(AudioLabel::Fake);
        assert_eq!(result.label(), "Fake audio");
        let json = serde_json::to_value(result.record()).unwrap();
        assert_eq!(json["label"], "Fake audio");
        assert!(json.get("confidence").is_none());
    }

    #[test]
    fn test_prediction_response_shape() {
        let audio = PredictionResponse::from(DetectionResult::audio(AudioLabel::Real));
        let json = serde_json::to_value(&audio).unwrap();
        assert_eq!(json["isDeepfake"], false);
        assert_eq!(json["label"], "REAL");
        assert!(json["confidence"].is_null());

        let image =
            PredictionResponse::from(DetectionResult::visual(Modality::Image, Verdict::Fake, 61.0));
        assert!(image.is_deepfake);
        assert_eq!(image.confidence, Some(61.0));
    }
}
