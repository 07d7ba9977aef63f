//! Shared data models for the Deepfake Guard backend.
//!
//! This crate provides Serde-serializable types for:
//! - Media modalities and their accepted upload extensions
//! - Verdict labels for image/video and audio classification
//! - Per-file detection results and the HTTP prediction response

pub mod detection;
pub mod modality;
pub mod verdict;

// Re-export common types
pub use detection::{DetectionRecord, DetectionResult, PredictionResponse};
pub use modality::{extension_of, Modality};
pub use verdict::{AudioLabel, Verdict};
