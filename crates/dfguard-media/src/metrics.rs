//! Prediction metrics.
//!
//! Recorded through the `metrics` facade; the binary installs the exporter.

use dfguard_models::Modality;
use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const PREDICTIONS_TOTAL: &str = "dfguard_predictions_total";
    pub const PREDICTION_FAILURES_TOTAL: &str = "dfguard_prediction_failures_total";
    pub const PREDICTION_DURATION_SECONDS: &str = "dfguard_prediction_duration_seconds";
    pub const FACES_EXTRACTED: &str = "dfguard_faces_extracted";
}

/// Record a successful prediction.
pub fn record_prediction(modality: Modality, label: &str, duration_secs: f64) {
    let labels = [
        ("modality", modality.as_str().to_string()),
        ("label", label.to_string()),
    ];
    counter!(names::PREDICTIONS_TOTAL, &labels).increment(1);
    histogram!(names::PREDICTION_DURATION_SECONDS, "modality" => modality.as_str())
        .record(duration_secs);
}

/// Record a failed prediction at `stage`.
pub fn record_failure(modality: Modality, stage: &str) {
    let labels = [
        ("modality", modality.as_str().to_string()),
        ("stage", stage.to_string()),
    ];
    counter!(names::PREDICTION_FAILURES_TOTAL, &labels).increment(1);
}

/// Record the number of face crops extracted from one video.
pub fn record_faces_extracted(count: usize) {
    histogram!(names::FACES_EXTRACTED).record(count as f64);
}
