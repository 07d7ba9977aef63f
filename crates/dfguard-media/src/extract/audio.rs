//! Audio extraction.
//!
//! Any container FFmpeg can read is converted to 16 kHz mono `f32le` in a
//! temporary file, read back and fitted to one [`AudioWindow`].

use std::path::Path;
use std::time::Duration;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::sample::{AudioWindow, AUDIO_SAMPLE_RATE};

/// Upper bound on one decode.
const DECODE_TIMEOUT: Duration = Duration::from_secs(120);

/// Decode `path` into a window of exactly 64600 samples.
///
/// Every decode failure, including a missing `ffmpeg`, surfaces as
/// [`MediaError::AudioDecode`].
pub async fn decode_audio(path: &Path) -> MediaResult<AudioWindow> {
    let raw = NamedTempFile::new().map_err(|e| MediaError::audio_decode(e.to_string()))?;

    FfmpegCommand::new(path, raw.path())
        .no_video()
        .audio_rate(AUDIO_SAMPLE_RATE)
        .audio_channels(1)
        .format("f32le")
        .timeout(DECODE_TIMEOUT)
        .run()
        .await
        .map_err(|e| match e {
            MediaError::FfmpegFailed {
                stderr: Some(stderr),
                ..
            } => MediaError::audio_decode(stderr),
            other => MediaError::audio_decode(other.to_string()),
        })?;

    let samples = load_samples(raw.path())
        .await
        .map_err(|e| MediaError::audio_decode(e.to_string()))?;
    if samples.is_empty() {
        return Err(MediaError::audio_decode("no audio samples decoded"));
    }

    debug!(
        path = %path.display(),
        samples = samples.len(),
        seconds = samples.len() as f64 / AUDIO_SAMPLE_RATE as f64,
        "Decoded audio"
    );
    Ok(AudioWindow::fit(samples))
}

/// Load raw f32le samples from a file.
pub async fn load_samples(path: &Path) -> MediaResult<Vec<f32>> {
    let bytes = tokio::fs::read(path).await?;
    if bytes.len() % 4 != 0 {
        warn!(
            path = %path.display(),
            trailing = bytes.len() % 4,
            "Raw audio has a partial trailing sample"
        );
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
