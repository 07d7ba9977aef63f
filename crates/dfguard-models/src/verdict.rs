//! Classification labels.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authenticity verdict for a video or image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Real,
    Fake,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Real => "REAL",
            Verdict::Fake => "FAKE",
        }
    }

    pub fn is_fake(&self) -> bool {
        matches!(self, Verdict::Fake)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Label produced by the audio classifier.
///
/// The audio model emits a class index rather than probabilities:
/// index 0 is genuine speech, index 1 is synthesized speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum AudioLabel {
    #[serde(rename = "Real audio")]
    Real,
    #[serde(rename = "Fake audio")]
    Fake,
}

impl AudioLabel {
    /// Map a classifier class index to a label. Returns `None` for any index
    /// outside `{0, 1}`.
    pub fn from_class_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(AudioLabel::Real),
            1 => Some(AudioLabel::Fake),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AudioLabel::Real => "Real audio",
            AudioLabel::Fake => "Fake audio",
        }
    }

    pub fn verdict(&self) -> Verdict {
        match self {
            AudioLabel::Real => Verdict::Real,
            AudioLabel::Fake => Verdict::Fake,
        }
    }
}

impl fmt::Display for AudioLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_class_index_mapping() {
        assert_eq!(AudioLabel::from_class_index(0), Some(AudioLabel::Real));
        assert_eq!(AudioLabel::from_class_index(1), Some(AudioLabel::Fake));
        assert_eq!(AudioLabel::from_class_index(2), None);
        assert_eq!(AudioLabel::Fake.as_str(), "Fake audio");
    }

    #[test]
    fn test_verdict_serialization() {
        assert_eq!(serde_json::to_string(&Verdict::Real).unwrap(), "\"REAL\"");
        assert_eq!(
            serde_json::to_string(&AudioLabel::Real).unwrap(),
            "\"Real audio\""
        );
    }
}
