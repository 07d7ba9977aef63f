//! Media modality definitions.
//!
//! A modality selects the extraction and classification path for an upload:
//!
//! - `Video`: sampled frames, face crops, image classifier, mean aggregation
//! - `Image`: whole-image crop, image classifier, single-sample aggregation
//! - `Audio`: fixed-length waveform window, audio classifier, argmax label

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Media modality of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Video,
    Image,
    Audio,
}

impl Modality {
    /// All supported modalities.

    /// Returns the modality name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Video => "video",
            Modality::Image => "image",
            Modality::Audio => "audio",
        }
    }

    /// Capitalized name used in user-facing messages ("Video prediction failed: ...").
    pub fn title(&self) -> &'static str {
        match self {
            Modality::Video => "Video",
            Modality::Image => "Image",
            Modality::Audio => "Audio",
        }
    }

    /// Upload file extensions accepted for this modality (lowercase, with dot).
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            Modality::Video => &[".mp4", ".avi", ".mov", ".mkv"],
            Modality::Image => &[".jpg", ".jpeg", ".png"],
            Modality::Audio => &[".flac", ".wav", ".mp3", ".m4a"],
        }
    }

    /// Returns true if `filename` carries one of the accepted extensions.
    ///
    /// The comparison is case-insensitive.
    pub fn accepts_filename(&self, filename: &str) -> bool {
        match extension_of(filename) {
            Some(ext) => self.allowed_extensions().contains(&ext.as_str()),
            None => false,
        }
    }

    /// Message returned to clients when an upload has the wrong extension.
    pub fn invalid_format_message(&self) -> String {
        format!(
            "Invalid file format. Only {} are supported.",
            self.allowed_extensions().join(", ")
        )
    }
}

/// Lowercased extension of `filename` including the leading dot.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_known_extensions() {
        assert!(Modality::Video.accepts_filename("clip.mp4"));
        assert!(Modality::Video.accepts_filename("CLIP.MKV"));
        assert!(Modality::Image.accepts_filename("face.jpeg"));
        assert!(Modality::Audio.accepts_filename("voice.m4a"));
    }

    #[test]
    fn test_rejects_cross_modality_and_missing_extensions() {
        assert!(!Modality::Video.accepts_filename("face.png"));
        assert!(!Modality::Image.accepts_filename("voice.wav"));
        assert!(!Modality::Audio.accepts_filename("README"));
        assert!(!Modality::Image.accepts_filename("archive.png.zip"));
    }

    #[test]
    fn test_invalid_format_message() {
        assert_eq!(
            Modality::Video.invalid_format_message(),
            "Invalid file format. Only .mp4, .avi, .mov, .mkv are supported."
        );
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&Modality::Audio).unwrap();
        assert_eq!(json, "\"audio\"");
    }
}
