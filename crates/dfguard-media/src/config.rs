//! Pipeline configuration.

use std::env;

use tracing::warn;

/// Frames sampled per video when `VIDEO_SAMPLE_FRAMES` is unset.
pub const DEFAULT_SAMPLE_FRAMES: usize = 5;

/// Per-request extraction settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Frames sampled per video. `0` samples every frame.
    pub sample_frames: usize,
    /// Optional resize factor applied to sampled frames before face detection.
    pub frame_scale: Option<f32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_frames: DEFAULT_SAMPLE_FRAMES,
            frame_scale: None,
        }
    }
}

impl PipelineConfig {
    /// Load from environment variables.
    ///
    /// Malformed values fall back to the defaults with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("VIDEO_SAMPLE_FRAMES") {
            match raw.trim().parse::<usize>() {
                Ok(n) => config.sample_frames = n,
                Err(_) => warn!(value = %raw, "Invalid VIDEO_SAMPLE_FRAMES, using default"),
            }
        }

        if let Some(raw) = lookup("VIDEO_FRAME_SCALE") {
            match raw.trim().parse::<f32>() {
                Ok(s) if s.is_finite() && s > 0.0 => config.frame_scale = Some(s),
                _ => warn!(value = %raw, "Invalid VIDEO_FRAME_SCALE, frames will not be resized"),
            }
        }

        config
    }

    pub fn with_sample_frames(mut self, sample_frames: usize) -> Self {
        self.sample_frames = sample_frames;
        self
    }

    pub fn with_frame_scale(mut self, frame_scale: f32) -> Self {
        self.frame_scale = Some(frame_scale);
        self
    }
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
    fn test_defaults() {
        let config = PipelineConfig::from_lookup(lookup(&[]));
        assert_eq!(config.sample_frames, 5);
        assert_eq!(config.frame_scale, None);
    }

    #[test]
    fn test_reads_values() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("VIDEO_SAMPLE_FRAMES", "12"),
            ("VIDEO_FRAME_SCALE", "0.5"),
        ]));
        assert_eq!(config.sample_frames, 12);
        assert_eq!(config.frame_scale, Some(0.5));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("VIDEO_SAMPLE_FRAMES", "many"),
            ("VIDEO_FRAME_SCALE", "-2"),
        ]));
        assert_eq!(config, PipelineConfig::default());
    }
}
